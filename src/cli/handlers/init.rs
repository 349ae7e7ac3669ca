//! Database initialization handler

use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::cli::output::print_warning;
use crate::database::Database;
use crate::database::HNSW_MAX_DIMENSIONS;
use crate::AppConfig;
use crate::Result;

/// Create the catalog schema sized for the configured embedding dimension
pub async fn handle_init_command(config: &AppConfig) -> Result<()> {
    print_info("🗄️  Initializing LightNavi database...");

    if config.embedding_dimension() > HNSW_MAX_DIMENSIONS {
        print_warning(&format!(
            "Dimension {} is above the HNSW limit ({}); the embedding index will be skipped.",
            config.embedding_dimension(),
            HNSW_MAX_DIMENSIONS
        ));
    }

    let database = Database::from_config(config).await?;
    database.init_schema(config.embedding_dimension()).await?;
    print_success(&format!(
        "Schema ready (embedding dimension {})",
        config.embedding_dimension()
    ));

    let (total, embedded) = database.count_categories().await?;
    print_info(&format!("Catalog: {total} categories, {embedded} with embeddings"));
    if embedded < total {
        print_info("Run `lightnavi backfill --missing-only` to embed the rest.");
    }
    Ok(())
}
