//! Backfill category embeddings
//!
//! Re-running is safe: each processed id has its embedding overwritten
//! with a freshly computed vector.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;
use tracing::warn;

use super::text::preprocess_text_for_embedding;
use crate::database::Database;
use crate::errors::Result;
use crate::models::FixtureCategory;
use crate::retrieval::TextVectorizer;

/// Where category records are read from and embeddings written back to
#[async_trait]
pub trait EmbeddingTarget: Send + Sync {
    async fn categories(&self) -> Result<Vec<FixtureCategory>>;

    /// Returns false when no record with `id` exists
    async fn store_embedding(&self, id: i64, embedding: Vec<f32>) -> Result<bool>;
}

#[async_trait]
impl EmbeddingTarget for Database {
    async fn categories(&self) -> Result<Vec<FixtureCategory>> {
        self.list_categories().await
    }

    async fn store_embedding(&self, id: i64, embedding: Vec<f32>) -> Result<bool> {
        self.update_category_embedding(id, embedding).await
    }
}

#[derive(Debug, Clone)]
pub struct BackfillOptions {
    /// Leave records that already carry an embedding untouched
    pub missing_only: bool,
    pub batch_size: usize,
    /// Pause between batches to stay under provider rate limits
    pub batch_delay: Duration,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        Self {
            missing_only: false,
            batch_size: super::MAX_BATCH_SIZE,
            batch_delay: Duration::from_millis(100),
        }
    }
}

/// Compute and store embeddings for every category
pub async fn backfill_embeddings(
    target: &dyn EmbeddingTarget,
    vectorizer: &dyn TextVectorizer,
    options: &BackfillOptions,
) -> Result<BackfillStats> {
    info!("Starting embeddings backfill");

    let categories = target.categories().await?;
    let mut stats = BackfillStats {
        total: categories.len(),
        ..BackfillStats::default()
    };

    let mut pending: Vec<(i64, String)> = Vec::new();
    for category in &categories {
        if options.missing_only && category.embedding.is_some() {
            stats.skipped += 1;
            continue;
        }
        // Cleaned per record so one unusable text cannot fail a whole batch.
        match preprocess_text_for_embedding(&category.embedding_text()) {
            Ok(text) => pending.push((category.id, text)),
            Err(_) => {
                warn!("Skipping category {} ({}): no text to embed", category.id, category.name);
                stats.skipped += 1;
            }
        }
    }

    info!(
        "Found {} categories, {} to embed",
        categories.len(),
        pending.len()
    );

    let batch_size = options.batch_size.max(1);
    let batches = pending.len().div_ceil(batch_size);
    for (batch_idx, chunk) in pending.chunks(batch_size).enumerate() {
        info!(
            "Processing batch {}/{} ({} categories)",
            batch_idx + 1,
            batches,
            chunk.len()
        );

        let texts: Vec<&str> = chunk.iter().map(|(_, text)| text.as_str()).collect();
        let embeddings = match vectorizer.vectorize_batch(texts).await {
            Ok(embeddings) if embeddings.len() == chunk.len() => embeddings,
            Ok(embeddings) => {
                warn!(
                    "Batch {} returned {} embeddings for {} texts",
                    batch_idx + 1,
                    embeddings.len(),
                    chunk.len()
                );
                stats.failed += chunk.len();
                continue;
            }
            Err(e) => {
                warn!("Failed to embed batch {}: {}", batch_idx + 1, e);
                stats.failed += chunk.len();
                continue;
            }
        };

        for ((id, _), embedding) in chunk.iter().zip(embeddings) {
            match target.store_embedding(*id, embedding).await {
                Ok(true) => stats.updated += 1,
                Ok(false) => {
                    warn!("Category {} disappeared during backfill", id);
                    stats.skipped += 1;
                }
                Err(e) => {
                    warn!("Failed to store embedding for category {}: {}", id, e);
                    stats.failed += 1;
                }
            }
        }

        if batch_idx + 1 < batches && !options.batch_delay.is_zero() {
            tokio::time::sleep(options.batch_delay).await;
        }
    }

    info!(
        "Backfill complete: {} updated, {} skipped, {} failed",
        stats.updated, stats.skipped, stats.failed
    );

    Ok(stats)
}

/// Statistics from backfill operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackfillStats {
    pub total: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BackfillStats {
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.updated as f64 / self.total as f64) * 100.0
        }
    }
}
