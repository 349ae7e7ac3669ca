//! CLI output formatting utilities

use crate::models::ScoredCategory;
use crate::retrieval::RerankOutcome;
use crate::retrieval::RetrievalReport;

/// Safely truncate a string at character boundary (not byte boundary)
///
/// Returns the string with a "..." suffix if truncated.
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

pub fn print_info(message: &str) {
    println!("{message}");
}

pub fn print_success(message: &str) {
    println!("✅ {message}");
}

pub fn print_warning(message: &str) {
    println!("⚠️  {message}");
}

/// Print ranked candidates
pub fn print_candidates(candidates: &[ScoredCategory]) {
    if candidates.is_empty() {
        println!("No candidates found.");
        return;
    }

    println!("Found {} candidates:", candidates.len());
    for (idx, candidate) in candidates.iter().enumerate() {
        let category = &candidate.category;
        let score = candidate
            .similarity
            .map_or_else(|| "-".to_string(), |s| format!("{s:.3}"));
        println!(
            "  {}. [{}] {} | Manufacturer: {} | Similarity: {}",
            idx + 1,
            category.id,
            category.name,
            category.manufacturer.as_deref().unwrap_or("N/A"),
            score
        );
        if let Some(description) = category.description.as_deref() {
            println!("      {}", truncate_str(description, 80));
        }
        if !category.suitable_for.is_empty() {
            println!("      Suitable for: {}", category.tags_joined());
        }
    }
}

/// Print how a retrieval call was served
pub fn print_report(report: &RetrievalReport) {
    let rerank = match &report.rerank {
        RerankOutcome::Skipped => "skipped".to_string(),
        RerankOutcome::Ranked { accepted, padded } => {
            format!("ranked ({accepted} accepted, {padded} padded)")
        }
        RerankOutcome::Degraded => "degraded".to_string(),
    };

    println!();
    println!("Retrieval path: {}", report.path.as_str());
    println!(
        "  Embedding pool: {} | Rerank pool: {} | Rerank: {}",
        report.embedding_pool, report.rerank_pool, rerank
    );
    println!(
        "  Primary: {} | Supplemented: {}{}",
        report.primary,
        report.supplemented,
        if report.supplementation_ran {
            ""
        } else {
            " (not needed)"
        }
    );
    for degradation in &report.degradations {
        print_warning(&format!("{} stage degraded: {}", degradation.stage, degradation.reason));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_counts_characters() {
        assert_eq!(truncate_str("高天井用照明", 3), "高天井...");
        assert_eq!(truncate_str("LED", 3), "LED");
    }
}
