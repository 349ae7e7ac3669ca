use clap::Parser;
use lightnavi::cli::handle_backfill_command;
use lightnavi::cli::handle_init_command;
use lightnavi::cli::handle_search_command;
use lightnavi::cli::handle_serve_command;
use lightnavi::cli::Cli;
use lightnavi::cli::Commands;
use lightnavi::AppConfig;
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration first
    let config = AppConfig::load_from(cli.config.as_deref())?;

    if cli.verbose {
        lightnavi::logging::init_logging_with_level("debug")?;
    } else {
        lightnavi::logging::init_logging_with_config(Some(&config))?;
    }
    debug!("Configuration loaded");

    match cli.command {
        Commands::Init => handle_init_command(&config).await?,
        Commands::Backfill {
            missing_only,
            batch_size,
        } => handle_backfill_command(&config, missing_only, batch_size).await?,
        Commands::Search {
            query,
            keywords,
            limit,
            catalog,
        } => handle_search_command(&config, query, keywords, limit, catalog).await?,
        Commands::Serve { host, port } => handle_serve_command(&config, host, port).await?,
    }

    Ok(())
}
