//! Oracle re-ranking stage
//!
//! The oracle sees a numbered list of at most `pool_limit` candidates and
//! answers with 1-based indices, most relevant first. The reply is parsed
//! defensively and short answers are padded from the pool in its original
//! order, so the stage always returns `min(max_results, pool)` entries.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use super::Degradation;
use super::RankingOracle;
use super::RerankOutcome;
use super::Stage;
use super::StageOutput;
use crate::llm::LightingPrompts;
use crate::models::ScoredCategory;

pub const DEFAULT_POOL_LIMIT: usize = 50;
pub const DEFAULT_DESCRIPTION_LIMIT: usize = 200;

/// Re-ranked candidates and how they were obtained
#[derive(Debug, Clone)]
pub struct Reranked {
    pub items: Vec<ScoredCategory>,
    pub outcome: RerankOutcome,
}

pub struct OracleReranker {
    oracle: Arc<dyn RankingOracle>,
    pool_limit: usize,
    description_limit: usize,
}

impl OracleReranker {
    pub fn new(oracle: Arc<dyn RankingOracle>) -> Self {
        Self::with_limits(oracle, DEFAULT_POOL_LIMIT, DEFAULT_DESCRIPTION_LIMIT)
    }

    pub fn with_limits(
        oracle: Arc<dyn RankingOracle>,
        pool_limit: usize,
        description_limit: usize,
    ) -> Self {
        Self {
            oracle,
            pool_limit: pool_limit.max(1),
            description_limit,
        }
    }

    /// Select and order the `max_results` most relevant candidates for `query`
    pub async fn rerank(
        &self,
        query: &str,
        candidates: Vec<ScoredCategory>,
        max_results: usize,
    ) -> StageOutput<Reranked> {
        if max_results == 0 {
            return StageOutput::ok(Reranked {
                items: Vec::new(),
                outcome: RerankOutcome::Skipped,
            });
        }

        if candidates.len() <= max_results {
            debug!(
                "Pool of {} fits within {}, skipping oracle",
                candidates.len(),
                max_results
            );
            return StageOutput::ok(Reranked {
                items: candidates,
                outcome: RerankOutcome::Skipped,
            });
        }

        let presented = candidates.len().min(self.pool_limit);
        let prompt = build_rerank_prompt(
            query,
            &candidates[..presented],
            max_results,
            self.description_limit,
        );

        let reply = match self.oracle.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Ranking oracle failed, keeping pool order: {}", e);
                return unranked(
                    candidates,
                    max_results,
                    Degradation::new(Stage::Rerank, format!("oracle failure: {e}")),
                );
            }
        };

        let indices = parse_selection(&reply, presented, max_results);
        if indices.is_empty() {
            warn!("Ranking oracle reply had no usable indices: {:?}", truncate_chars(&reply, 80));
            return unranked(
                candidates,
                max_results,
                Degradation::new(Stage::Rerank, "unparseable oracle reply"),
            );
        }

        let (items, accepted) = select_with_padding(candidates, &indices, max_results);
        let padded = items.len() - accepted;
        if padded > 0 {
            debug!("Oracle selected {} candidates, padded {}", accepted, padded);
        }

        StageOutput::ok(Reranked {
            items,
            outcome: RerankOutcome::Ranked { accepted, padded },
        })
    }
}

fn unranked(
    mut candidates: Vec<ScoredCategory>,
    max_results: usize,
    degradation: Degradation,
) -> StageOutput<Reranked> {
    candidates.truncate(max_results);
    StageOutput::degraded(
        Reranked {
            items: candidates,
            outcome: RerankOutcome::Degraded,
        },
        degradation,
    )
}

/// Oracle picks first, then untouched pool members in pool order, up to `max_results`
///
/// Returns the list and how many entries came from the oracle.
fn select_with_padding(
    candidates: Vec<ScoredCategory>,
    indices: &[usize],
    max_results: usize,
) -> (Vec<ScoredCategory>, usize) {
    let mut slots: Vec<Option<ScoredCategory>> = candidates.into_iter().map(Some).collect();
    let mut ranked = Vec::with_capacity(max_results.min(slots.len()));

    for &idx in indices.iter().take(max_results) {
        if let Some(candidate) = slots.get_mut(idx).and_then(Option::take) {
            ranked.push(candidate);
        }
    }
    let accepted = ranked.len();

    for slot in &mut slots {
        if ranked.len() >= max_results {
            break;
        }
        if let Some(candidate) = slot.take() {
            ranked.push(candidate);
        }
    }

    (ranked, accepted)
}

/// Parse a comma-separated list of 1-based indices into 0-based positions
///
/// Non-integer tokens and indices outside `1..=pool_len` are dropped,
/// repeats keep their first position, and at most `max_results` survive.
/// Full-width digits are accepted.
#[must_use]
pub fn parse_selection(reply: &str, pool_len: usize, max_results: usize) -> Vec<usize> {
    let mut seen = HashSet::new();
    let mut selected = Vec::new();

    for token in reply.split([',', '、', '，']) {
        if selected.len() >= max_results {
            break;
        }
        let Some(index) = parse_index(token) else {
            continue;
        };
        if index == 0 || index > pool_len {
            continue;
        }
        if seen.insert(index - 1) {
            selected.push(index - 1);
        }
    }

    selected
}

fn parse_index(token: &str) -> Option<usize> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    let mut digits = String::with_capacity(token.len());
    for c in token.chars() {
        match c {
            '0'..='9' => digits.push(c),
            '０'..='９' => digits.push(char::from(b'0' + (c as u32 - '０' as u32) as u8)),
            _ => return None,
        }
    }
    digits.parse().ok()
}

/// Numbered, compact description of each presented candidate
#[must_use]
pub fn format_candidates(candidates: &[ScoredCategory], description_limit: usize) -> String {
    let mut out = String::new();
    for (i, candidate) in candidates.iter().enumerate() {
        let category = &candidate.category;
        let _ = writeln!(out, "{}. {}", i + 1, category.name);
        if let Some(manufacturer) = category.manufacturer.as_deref().filter(|m| !m.is_empty()) {
            let _ = writeln!(out, "   メーカー: {manufacturer}");
        }
        if let Some(description) = category.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(
                out,
                "   説明: {}",
                truncate_chars(description, description_limit)
            );
        }
        if !category.suitable_for.is_empty() {
            let _ = writeln!(out, "   用途: {}", category.tags_joined());
        }
        out.push('\n');
    }
    out
}

#[must_use]
pub fn build_rerank_prompt(
    query: &str,
    candidates: &[ScoredCategory],
    max_results: usize,
    description_limit: usize,
) -> String {
    let mut values = HashMap::new();
    values.insert("query", query.to_string());
    values.insert("max_results", max_results.to_string());
    values.insert("categories", format_candidates(candidates, description_limit));
    LightingPrompts::rerank().render(&values)
}

pub(crate) fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
