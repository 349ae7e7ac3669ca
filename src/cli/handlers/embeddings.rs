//! Embedding backfill handler

use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::cli::output::print_warning;
use crate::database::Database;
use crate::embeddings::backfill_embeddings;
use crate::embeddings::BackfillOptions;
use crate::embeddings::EmbeddingService;
use crate::AppConfig;
use crate::Result;

pub async fn handle_backfill_command(
    config: &AppConfig,
    missing_only: bool,
    batch_size: Option<usize>,
) -> Result<()> {
    print_info("🚀 Starting category embeddings backfill...");

    let database = Database::from_config(config).await?;
    database.verify_schema_or_error().await?;
    let service = EmbeddingService::new(config)?;
    print_info(&format!(
        "Model: {} ({:?}, {} dimensions)",
        service.model(),
        service.provider(),
        service.dimension()
    ));

    let options = BackfillOptions {
        missing_only,
        batch_size: batch_size.unwrap_or_else(|| service.batch_size()),
        ..BackfillOptions::default()
    };
    let stats = backfill_embeddings(&database, &service, &options).await?;

    println!();
    print_success(&format!(
        "Backfill finished: {} updated, {} skipped, {} failed of {} ({:.1}% success)",
        stats.updated,
        stats.skipped,
        stats.failed,
        stats.total,
        stats.success_rate()
    ));
    if stats.failed > 0 {
        print_warning("Some categories failed; re-run with --missing-only to retry them.");
    }
    Ok(())
}
