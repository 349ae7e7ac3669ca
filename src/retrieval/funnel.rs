//! Funnel orchestration: vector search -> oracle re-rank -> keyword supplement

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tracing::info;
use tracing::Instrument;

use super::keyword::KeywordStage;
use super::rerank::OracleReranker;
use super::vector::VectorStage;
use super::CatalogStore;
use super::Degradation;
use super::RankingOracle;
use super::RetrievalOutcome;
use super::RetrievalPath;
use super::RetrievalReport;
use super::TextVectorizer;
use crate::config::RetrievalConfig;
use crate::errors::LightNaviError;
use crate::errors::Result;
use crate::models::RankedCandidateList;
use crate::models::ScoredCategory;
use crate::models::SearchQuery;

/// Stage sizes and supplementation thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunnelSettings {
    pub embedding_pool_size: usize,
    pub browse_pool_size: usize,
    pub oracle_pool_limit: usize,
    pub description_limit: usize,
    pub supplement_floor: usize,
    pub supplement_target: usize,
}

impl Default for FunnelSettings {
    fn default() -> Self {
        Self {
            embedding_pool_size: 20,
            browse_pool_size: 20,
            oracle_pool_limit: super::rerank::DEFAULT_POOL_LIMIT,
            description_limit: super::rerank::DEFAULT_DESCRIPTION_LIMIT,
            supplement_floor: 3,
            supplement_target: 5,
        }
    }
}

impl FunnelSettings {
    pub fn from_config(config: &RetrievalConfig) -> Result<Self> {
        let settings = Self {
            embedding_pool_size: config.embedding_pool_size,
            browse_pool_size: config.browse_pool_size,
            oracle_pool_limit: config.oracle_pool_limit,
            description_limit: config.description_limit,
            supplement_floor: config.supplement_floor,
            supplement_target: config.supplement_target,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding_pool_size == 0 || self.browse_pool_size == 0 || self.oracle_pool_limit == 0
        {
            return Err(LightNaviError::InvalidArgument(
                "pool sizes must be greater than zero".to_string(),
            ));
        }
        if self.supplement_floor > self.supplement_target {
            return Err(LightNaviError::InvalidArgument(format!(
                "supplement_floor ({}) exceeds supplement_target ({})",
                self.supplement_floor, self.supplement_target
            )));
        }
        Ok(())
    }
}

/// The hybrid retrieval pipeline
///
/// Holds no mutable state; one instance can serve concurrent requests.
pub struct RetrievalFunnel {
    vector: VectorStage,
    keyword: KeywordStage,
    reranker: OracleReranker,
    settings: FunnelSettings,
}

impl RetrievalFunnel {
    pub fn new(
        vectorizer: Arc<dyn TextVectorizer>,
        store: Arc<dyn CatalogStore>,
        oracle: Arc<dyn RankingOracle>,
        settings: FunnelSettings,
    ) -> Self {
        Self {
            vector: VectorStage::new(vectorizer, store.clone()),
            keyword: KeywordStage::new(store),
            reranker: OracleReranker::with_limits(
                oracle,
                settings.oracle_pool_limit,
                settings.description_limit,
            ),
            settings,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &FunnelSettings {
        &self.settings
    }

    /// Ranked shortlist of at most `final_cap` distinct categories
    ///
    /// Collaborator failures degrade to weaker stages and never surface
    /// here; the only error is an invalid `final_cap`.
    pub async fn retrieve(
        &self,
        query_text: &str,
        keywords: &[String],
        final_cap: usize,
    ) -> Result<RankedCandidateList> {
        Ok(self
            .retrieve_with_report(query_text, keywords, final_cap)
            .await?
            .candidates)
    }

    pub async fn retrieve_query(&self, query: &SearchQuery) -> Result<RetrievalOutcome> {
        self.retrieve_with_report(&query.text, &query.keywords, query.limit)
            .await
    }

    /// Like [`retrieve`](Self::retrieve), aborting with `Timeout` once `deadline` passes
    ///
    /// No partial result is returned on timeout.
    pub async fn retrieve_with_timeout(
        &self,
        query_text: &str,
        keywords: &[String],
        final_cap: usize,
        deadline: Duration,
    ) -> Result<RetrievalOutcome> {
        tokio::time::timeout(
            deadline,
            self.retrieve_with_report(query_text, keywords, final_cap),
        )
        .await
        .map_err(|_| LightNaviError::Timeout(deadline))?
    }

    /// Run the funnel and describe which stages ran and degraded
    pub async fn retrieve_with_report(
        &self,
        query_text: &str,
        keywords: &[String],
        final_cap: usize,
    ) -> Result<RetrievalOutcome> {
        if final_cap == 0 {
            return Err(LightNaviError::InvalidArgument(
                "final_cap must be at least 1".to_string(),
            ));
        }

        let span = tracing::info_span!(
            "retrieve",
            request_id = %uuid::Uuid::new_v4(),
            final_cap
        );
        self.run(query_text, keywords, final_cap)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        query_text: &str,
        keywords: &[String],
        final_cap: usize,
    ) -> Result<RetrievalOutcome> {
        let mut degradations: Vec<Degradation> = Vec::new();

        // Stage 1: embedding pool.
        let embedded = self
            .vector
            .search(query_text, self.settings.embedding_pool_size)
            .await;
        degradations.extend(embedded.degraded);
        let embedding_pool = embedded.items.len();

        // Stage 2: re-rank the embedding pool, or a catalog browse when it is empty.
        let (path, pool) = if embedded.items.is_empty() {
            debug!("Embedding pool empty, browsing catalog");
            let browsed = self.keyword.browse(self.settings.browse_pool_size).await;
            degradations.extend(browsed.degraded);
            let pool: Vec<ScoredCategory> =
                browsed.items.into_iter().map(ScoredCategory::from).collect();
            (RetrievalPath::BrowseFallback, pool)
        } else {
            (RetrievalPath::Embedding, embedded.items)
        };
        let rerank_pool = pool.len();

        let reranked = self.reranker.rerank(query_text, pool, final_cap).await;
        degradations.extend(reranked.degraded);
        let rerank = reranked.items.outcome;
        let mut candidates: RankedCandidateList = reranked.items.items.into_iter().collect();
        let primary = candidates.len();

        // Stage 3: keyword supplementation for sparse results.
        let supplementation_ran = primary < self.settings.supplement_floor;
        let mut supplemented = 0;
        if supplementation_ran {
            let target = self.settings.supplement_target;
            debug!(
                "{} primary candidates below floor {}, supplementing to {}",
                primary, self.settings.supplement_floor, target
            );
            let extra = self.keyword.search(keywords, target).await;
            degradations.extend(extra.degraded);
            for category in extra.items {
                if candidates.len() >= target {
                    break;
                }
                if candidates.push(ScoredCategory::from(category)) {
                    supplemented += 1;
                }
            }
        }

        candidates.truncate(final_cap);

        info!(
            path = path.as_str(),
            embedding_pool,
            primary,
            supplemented,
            returned = candidates.len(),
            degraded = degradations.len(),
            "Retrieval finished"
        );

        Ok(RetrievalOutcome {
            candidates,
            report: RetrievalReport {
                path,
                embedding_pool,
                rerank_pool,
                rerank,
                primary,
                supplemented,
                supplementation_ran,
                degradations,
            },
        })
    }
}
