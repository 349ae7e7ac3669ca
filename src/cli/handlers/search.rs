//! Retrieval query handler

use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::output::print_candidates;
use crate::cli::output::print_info;
use crate::cli::output::print_report;
use crate::database::Database;
use crate::embeddings::EmbeddingService;
use crate::llm::LlmService;
use crate::retrieval::CatalogStore;
use crate::retrieval::FunnelSettings;
use crate::retrieval::MemoryCatalog;
use crate::retrieval::RetrievalFunnel;
use crate::retrieval::RetrievalOutcome;
use crate::AppConfig;
use crate::Result;

pub async fn handle_search_command(
    config: &AppConfig,
    query: String,
    keywords: Vec<String>,
    limit: Option<usize>,
    catalog: Option<PathBuf>,
) -> Result<()> {
    let final_cap = limit.unwrap_or(config.retrieval.final_cap);

    let store: Arc<dyn CatalogStore> = match catalog {
        Some(path) => {
            let catalog = MemoryCatalog::from_json_file(&path)?;
            print_info(&format!(
                "📂 Loaded {} categories from {}",
                catalog.len(),
                path.display()
            ));
            Arc::new(catalog)
        }
        None => Arc::new(Database::from_config(config).await?),
    };

    let funnel = RetrievalFunnel::new(
        Arc::new(EmbeddingService::new(config)?),
        store,
        Arc::new(LlmService::new(config)?),
        FunnelSettings::from_config(&config.retrieval)?,
    );

    print_info(&format!("🔍 Searching: {query}"));
    if !keywords.is_empty() {
        print_info(&format!("   Keywords: {}", keywords.join(", ")));
    }
    println!();

    let RetrievalOutcome { candidates, report } = match config.retrieval_timeout() {
        Some(deadline) => {
            funnel
                .retrieve_with_timeout(&query, &keywords, final_cap, deadline)
                .await?
        }
        None => {
            funnel
                .retrieve_with_report(&query, &keywords, final_cap)
                .await?
        }
    };

    print_candidates(candidates.as_slice());
    print_report(&report);
    Ok(())
}
