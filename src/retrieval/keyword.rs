//! Keyword stage: permissive substring matching used as fallback and supplement

use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use super::CatalogStore;
use super::Degradation;
use super::Stage;
use super::StageOutput;
use crate::models::FixtureCategory;

pub struct KeywordStage {
    store: Arc<dyn CatalogStore>,
}

impl KeywordStage {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Records matching ANY keyword on ANY of name, description or tags
    ///
    /// With no usable keywords this browses up to `limit` records.
    pub async fn search(&self, keywords: &[String], limit: usize) -> StageOutput<Vec<FixtureCategory>> {
        let keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();

        match self.store.keyword_match(&keywords, limit).await {
            Ok(mut records) => {
                records.truncate(limit);
                debug!(
                    "Keyword stage matched {} records for {} keywords",
                    records.len(),
                    keywords.len()
                );
                StageOutput::ok(records)
            }
            Err(e) => {
                warn!("Keyword query failed: {}", e);
                StageOutput::degraded(
                    Vec::new(),
                    Degradation::new(Stage::Keyword, format!("store failure: {e}")),
                )
            }
        }
    }

    /// Unfiltered catalog browse
    pub async fn browse(&self, limit: usize) -> StageOutput<Vec<FixtureCategory>> {
        self.search(&[], limit).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::errors::LightNaviError;
    use crate::errors::Result;
    use crate::retrieval::MemoryCatalog;

    struct DownStore;

    #[async_trait]
    impl CatalogStore for DownStore {
        async fn nearest_neighbors(
            &self,
            _embedding: &[f32],
            _k: usize,
        ) -> Result<Vec<(FixtureCategory, f64)>> {
            Err(LightNaviError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn keyword_match(&self, _keywords: &[String], _k: usize) -> Result<Vec<FixtureCategory>> {
            Err(LightNaviError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    fn catalog() -> Arc<MemoryCatalog> {
        let records = (1..=6)
            .map(|id| {
                let mut c = FixtureCategory::new(id, format!("fixture-{id}"));
                if id % 2 == 0 {
                    c.suitable_for = vec!["厨房".to_string()];
                }
                c
            })
            .collect();
        Arc::new(MemoryCatalog::new(records))
    }

    #[tokio::test]
    async fn test_search_matches_tags() {
        let stage = KeywordStage::new(catalog());
        let out = stage.search(&["厨房".to_string()], 20).await;
        assert_eq!(out.items.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 4, 6]);
    }

    #[tokio::test]
    async fn test_browse_is_capped() {
        let stage = KeywordStage::new(catalog());
        let out = stage.browse(4).await;
        assert_eq!(out.items.len(), 4);
        assert!(out.degraded.is_none());
    }

    #[tokio::test]
    async fn test_store_failure_is_empty() {
        let stage = KeywordStage::new(Arc::new(DownStore));
        let out = stage.search(&["厨房".to_string()], 20).await;
        assert!(out.items.is_empty());
        assert_eq!(out.degraded.unwrap().stage, Stage::Keyword);
    }
}
