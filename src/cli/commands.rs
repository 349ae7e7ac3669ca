//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "lightnavi")]
#[command(about = "Lighting fixture selection assistant: catalog retrieval and chat API")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: config.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the pgvector extension, catalog table and HNSW index
    Init,
    /// Compute embeddings for catalog categories
    Backfill {
        /// Only embed categories that have no embedding yet
        #[arg(long)]
        missing_only: bool,
        /// Texts per embedding request
        #[arg(short, long)]
        batch_size: Option<usize>,
    },
    /// Run the retrieval funnel for a query and print the shortlist
    Search {
        /// Natural-language query
        query: String,
        /// Keyword for supplementation (repeatable)
        #[arg(short, long = "keyword")]
        keywords: Vec<String>,
        /// Maximum number of candidates
        #[arg(short, long)]
        limit: Option<usize>,
        /// Search a JSON catalog file instead of Postgres
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Start the HTTP API server
    Serve {
        /// Host address to bind to (default: from config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (default: from config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_arguments() {
        let cli = Cli::try_parse_from([
            "lightnavi", "search", "会議室に適した照明器具", "-k", "会議室", "-k", "低天井",
            "--limit", "5", "--verbose",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Search {
                query,
                keywords,
                limit,
                catalog,
            } => {
                assert_eq!(query, "会議室に適した照明器具");
                assert_eq!(keywords, vec!["会議室", "低天井"]);
                assert_eq!(limit, Some(5));
                assert!(catalog.is_none());
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_backfill_flags() {
        let cli = Cli::try_parse_from(["lightnavi", "--config", "prod.toml", "backfill", "--missing-only"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("prod.toml")));
        assert!(matches!(
            cli.command,
            Commands::Backfill {
                missing_only: true,
                batch_size: None
            }
        ));
    }
}
