use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use pgvector::Vector;
use sqlx::types::Json;
use sqlx::FromRow;

use super::Database;
use crate::models::FixtureCategory;
use crate::retrieval::CatalogStore;
use crate::Result;

const CATEGORY_COLUMNS: &str = "id, name, manufacturer, series, ceiling_height_min, \
     ceiling_height_max, suitable_for, description, embedding, updated_at";

#[derive(Debug, FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    manufacturer: Option<String>,
    series: Option<String>,
    ceiling_height_min: Option<f64>,
    ceiling_height_max: Option<f64>,
    suitable_for: Json<Vec<String>>,
    description: Option<String>,
    embedding: Option<Vector>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<CategoryRow> for FixtureCategory {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            manufacturer: row.manufacturer,
            series: row.series,
            ceiling_height_min: row.ceiling_height_min,
            ceiling_height_max: row.ceiling_height_max,
            suitable_for: row.suitable_for.0,
            description: row.description,
            embedding: row.embedding.map(|v| v.to_vec()),
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct NeighborRow {
    #[sqlx(flatten)]
    category: CategoryRow,
    distance: f64,
}

/// Turn a keyword into an `ILIKE` substring pattern, escaping wildcard characters
pub(crate) fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

impl Database {
    /// Nearest embedded categories by cosine distance, closest first
    pub async fn nearest_categories(
        &self,
        query_embedding: &[f32],
        limit: i64,
    ) -> Result<Vec<(FixtureCategory, f64)>> {
        let rows = sqlx::query_as::<_, NeighborRow>(&format!(
            r"
            SELECT {CATEGORY_COLUMNS}, (embedding <=> $1) AS distance
            FROM product_categories
            WHERE embedding IS NOT NULL
            ORDER BY embedding <=> $1
            LIMIT $2
            "
        ))
        .bind(Vector::from(query_embedding.to_vec()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (FixtureCategory::from(r.category), r.distance))
            .collect())
    }

    /// Categories matching any keyword in name, description or tags
    ///
    /// An empty keyword list browses the catalog in id order.
    pub async fn keyword_categories(
        &self,
        keywords: &[String],
        limit: i64,
    ) -> Result<Vec<FixtureCategory>> {
        let patterns: Vec<String> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(like_pattern)
            .collect();

        let rows = if patterns.is_empty() {
            sqlx::query_as::<_, CategoryRow>(&format!(
                "SELECT {CATEGORY_COLUMNS} FROM product_categories ORDER BY id LIMIT $1"
            ))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, CategoryRow>(&format!(
                r"
                SELECT {CATEGORY_COLUMNS}
                FROM product_categories
                WHERE name ILIKE ANY($1)
                   OR description ILIKE ANY($1)
                   OR suitable_for::text ILIKE ANY($1)
                ORDER BY id
                LIMIT $2
                "
            ))
            .bind(patterns)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(rows.into_iter().map(FixtureCategory::from).collect())
    }

    /// Every category, in id order
    pub async fn list_categories(&self) -> Result<Vec<FixtureCategory>> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM product_categories ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FixtureCategory::from).collect())
    }

    /// Count categories, and how many of them carry an embedding
    pub async fn count_categories(&self) -> Result<(i64, i64)> {
        let (total, embedded) = sqlx::query_as::<_, (i64, i64)>(
            r"
            SELECT COUNT(*), COUNT(embedding)
            FROM product_categories
            ",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok((total, embedded))
    }

    /// Overwrite the embedding of one category
    pub async fn update_category_embedding(&self, id: i64, embedding: Vec<f32>) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE product_categories
            SET embedding = $1, updated_at = NOW()
            WHERE id = $2
            ",
        )
        .bind(Vector::from(embedding))
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CatalogStore for Database {
    async fn nearest_neighbors(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<(FixtureCategory, f64)>> {
        self.nearest_categories(embedding, to_limit(k)).await
    }

    async fn keyword_match(&self, keywords: &[String], k: usize) -> Result<Vec<FixtureCategory>> {
        self.keyword_categories(keywords, to_limit(k)).await
    }
}

fn to_limit(k: usize) -> i64 {
    i64::try_from(k).unwrap_or(i64::MAX)
}
