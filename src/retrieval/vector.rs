//! Vector-similarity stage

use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use super::CatalogStore;
use super::Degradation;
use super::Stage;
use super::StageOutput;
use super::TextVectorizer;
use crate::models::ScoredCategory;

/// Nearest-neighbour search over stored category embeddings
pub struct VectorStage {
    vectorizer: Arc<dyn TextVectorizer>,
    store: Arc<dyn CatalogStore>,
}

impl VectorStage {
    pub fn new(vectorizer: Arc<dyn TextVectorizer>, store: Arc<dyn CatalogStore>) -> Self {
        Self { vectorizer, store }
    }

    /// Up to `limit` categories ordered by descending similarity to `query`
    ///
    /// Similarity is `1 - cosine_distance`, left unclamped. Any failure
    /// yields an empty pool, which the caller treats as "try fallback".
    pub async fn search(&self, query: &str, limit: usize) -> StageOutput<Vec<ScoredCategory>> {
        if query.trim().is_empty() {
            return StageOutput::degraded(
                Vec::new(),
                Degradation::new(Stage::Vector, "empty query text"),
            );
        }

        let embedding = match self.vectorizer.vectorize(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Vectorization failed, embedding pool is empty: {}", e);
                return StageOutput::degraded(
                    Vec::new(),
                    Degradation::new(Stage::Vector, format!("vectorization failed: {e}")),
                );
            }
        };

        let expected = self.vectorizer.dimension();
        if embedding.len() != expected {
            warn!(
                "Query embedding has {} dimensions, expected {}",
                embedding.len(),
                expected
            );
            return StageOutput::degraded(
                Vec::new(),
                Degradation::new(
                    Stage::Vector,
                    format!(
                        "malformed embedding: {} dimensions, expected {expected}",
                        embedding.len()
                    ),
                ),
            );
        }

        let neighbors = match self.store.nearest_neighbors(&embedding, limit).await {
            Ok(neighbors) => neighbors,
            Err(e) => {
                warn!("Nearest-neighbour query failed: {}", e);
                return StageOutput::degraded(
                    Vec::new(),
                    Degradation::new(Stage::Vector, format!("store failure: {e}")),
                );
            }
        };

        let pool: Vec<ScoredCategory> = neighbors
            .into_iter()
            .take(limit)
            .map(|(category, distance)| ScoredCategory {
                category,
                similarity: Some(1.0 - distance),
            })
            .collect();

        debug!("Vector stage returned {} candidates", pool.len());
        StageOutput::ok(pool)
    }
}
