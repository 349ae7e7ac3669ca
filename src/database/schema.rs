use tracing::warn;

use super::Database;
use crate::errors::LightNaviError;
use crate::Result;

/// Widest vector column pgvector can build an HNSW index on
pub const HNSW_MAX_DIMENSIONS: usize = 2000;

const fn supports_hnsw(dimension: usize) -> bool {
    dimension <= HNSW_MAX_DIMENSIONS
}

impl Database {
    /// Check if the catalog table and its embedding column exist
    pub async fn is_schema_initialized(&self) -> Result<bool> {
        let has_embedding = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT FROM information_schema.columns
                WHERE table_schema = 'public'
                AND table_name = 'product_categories'
                AND column_name = 'embedding'
            )
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        if !has_embedding {
            tracing::debug!("product_categories.embedding missing");
        }
        Ok(has_embedding)
    }

    /// Verify database schema or return helpful error
    pub async fn verify_schema_or_error(&self) -> Result<()> {
        if !self.is_schema_initialized().await? {
            return Err(LightNaviError::ConfigError(
                "Database schema not initialized. Run `lightnavi init` first.".to_string(),
            ));
        }
        Ok(())
    }

    /// Initialize database schema
    ///
    /// `dimension` fixes the width of the `embedding` column; it must match
    /// the vectorizer's output dimension.
    pub async fn init_schema(&self, dimension: usize) -> Result<()> {
        if dimension == 0 {
            return Err(LightNaviError::InvalidArgument(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }

        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;

        // The dimension is a validated integer; DDL cannot take bind parameters.
        sqlx::query(&format!(
            r"
            CREATE TABLE IF NOT EXISTS product_categories (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                manufacturer TEXT,
                series TEXT,
                ceiling_height_min DOUBLE PRECISION,
                ceiling_height_max DOUBLE PRECISION,
                suitable_for JSONB NOT NULL DEFAULT '[]'::jsonb,
                description TEXT,
                embedding vector({dimension}),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "
        ))
        .execute(&self.pool)
        .await?;

        if supports_hnsw(dimension) {
            sqlx::query(
                r"
                CREATE INDEX IF NOT EXISTS idx_product_categories_embedding
                ON product_categories USING hnsw (embedding vector_cosine_ops)
                ",
            )
            .execute(&self.pool)
            .await?;
        } else {
            warn!(
                "Embedding dimension {} exceeds the HNSW limit of {}; nearest-neighbour queries will scan the table",
                dimension, HNSW_MAX_DIMENSIONS
            );
        }

        tracing::info!("product_categories schema ready (embedding dimension {})", dimension);
        Ok(())
    }
}
