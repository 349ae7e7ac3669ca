//! In-process catalog store

use std::path::Path;

use async_trait::async_trait;

use super::CatalogStore;
use crate::errors::Result;
use crate::models::FixtureCategory;

/// A `CatalogStore` over a vector of records held in memory
///
/// Keyword semantics match the Postgres store: case-insensitive substring
/// on name, description and the JSON-serialized tag list. Records keep
/// their insertion order for browsing and for ties in distance.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    records: Vec<FixtureCategory>,
}

impl MemoryCatalog {
    #[must_use]
    pub const fn new(records: Vec<FixtureCategory>) -> Self {
        Self { records }
    }

    /// Load a JSON array of categories
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let records: Vec<FixtureCategory> = serde_json::from_str(&content)?;
        Ok(Self::new(records))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[FixtureCategory] {
        &self.records
    }

    fn matches(record: &FixtureCategory, needles: &[String]) -> bool {
        let name = record.name.to_lowercase();
        let description = record
            .description
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default();
        let tags = serde_json::to_string(&record.suitable_for)
            .unwrap_or_default()
            .to_lowercase();

        needles
            .iter()
            .any(|n| name.contains(n) || description.contains(n) || tags.contains(n))
    }
}

/// `1 - cosine_similarity`; a zero vector is treated as orthogonal to everything
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn nearest_neighbors(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<(FixtureCategory, f64)>> {
        let mut scored: Vec<(FixtureCategory, f64)> = self
            .records
            .iter()
            .filter_map(|r| {
                let stored = r.embedding.as_deref()?;
                (stored.len() == embedding.len())
                    .then(|| (r.clone(), cosine_distance(embedding, stored)))
            })
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);
        Ok(scored)
    }

    async fn keyword_match(&self, keywords: &[String], k: usize) -> Result<Vec<FixtureCategory>> {
        let needles: Vec<String> = keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Ok(self
            .records
            .iter()
            .filter(|r| needles.is_empty() || Self::matches(r, &needles))
            .take(k)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, name: &str, description: Option<&str>, tags: &[&str]) -> FixtureCategory {
        let mut category = FixtureCategory::new(id, name);
        category.description = description.map(str::to_string);
        category.suitable_for = tags.iter().map(|t| (*t).to_string()).collect();
        category
    }

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new(vec![
            record(1, "LED Downlight", Some("汎用ダウンライト"), &["事務所"]),
            record(2, "高天井用ベースライト", None, &["工場", "倉庫"]),
            record(3, "防湿型ライト", Some("厨房・HACCP対応"), &[]),
        ])
    }

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    #[tokio::test]
    async fn test_keyword_match_is_case_insensitive_on_any_field() {
        let store = catalog();
        let hits = store.keyword_match(&kw(&["downlight"]), 20).await.unwrap();
        assert_eq!(hits.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1]);

        let hits = store.keyword_match(&kw(&["倉庫", "haccp"]), 20).await.unwrap();
        assert_eq!(hits.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_empty_keywords_browse_in_catalog_order() {
        let store = catalog();
        let hits = store.keyword_match(&[], 2).await.unwrap();
        assert_eq!(hits.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2]);

        let blank = store.keyword_match(&kw(&["  "]), 20).await.unwrap();
        assert_eq!(blank.len(), 3);
    }

    #[tokio::test]
    async fn test_no_match_is_empty() {
        let hits = catalog().keyword_match(&kw(&["クリーンルーム"]), 20).await.unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_cosine_distance() {
        assert!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).abs() < 1e-9);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-9);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-9);
        assert!((cosine_distance(&[0.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_json_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"[{"id": 1, "name": "ダウンライト", "suitable_for": ["事務所"]}]"#,
        )
        .unwrap();
        let store = MemoryCatalog::from_json_file(file.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].suitable_for, vec!["事務所".to_string()]);
    }
}
