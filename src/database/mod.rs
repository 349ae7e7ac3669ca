//! Postgres + pgvector catalog store
//!
//! Retrieval only reads from `product_categories`; one pool is shared by
//! every concurrent request. Writes come from schema bootstrap and the
//! embedding backfill.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::AppConfig;
use crate::config::DatabaseConfig;
use crate::Result;

mod categories;
mod schema;

pub use schema::HNSW_MAX_DIMENSIONS;

#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

/// Pool sizing for the catalog; `min_connections` never exceeds `max_connections`
fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    let max = config.max_connections.max(1);
    PgPoolOptions::new()
        .max_connections(max)
        .min_connections(config.min_connections.min(max))
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
}

impl Database {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect the catalog pool described by `[database]`
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let options = pool_options(&config.database);
        let (max, min) = (options.get_max_connections(), options.get_min_connections());
        let pool = options.connect(config.database_url()).await?;

        info!("Catalog pool ready ({} to {} connections)", min, max);
        Ok(Self::new(pool))
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_options_clamp_min_to_max() {
        let config = DatabaseConfig {
            url: "postgresql://localhost/lightnavi".to_string(),
            max_connections: 4,
            min_connections: 10,
            connection_timeout: 5,
        };
        let options = pool_options(&config);
        assert_eq!(options.get_max_connections(), 4);
        assert_eq!(options.get_min_connections(), 4);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_pool_options_never_zero_sized() {
        let config = DatabaseConfig {
            url: String::new(),
            max_connections: 0,
            min_connections: 0,
            connection_timeout: 30,
        };
        assert_eq!(pool_options(&config).get_max_connections(), 1);
    }
}
