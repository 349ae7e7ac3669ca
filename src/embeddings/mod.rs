//! Embeddings generation module
//!
//! Text vectorization for catalog search:
//! - OpenAI (text-embedding-3-small and compatible endpoints)
//! - Ollama (local models)
//!
//! # Examples
//!
//! ```rust,no_run
//! use lightnavi::config::AppConfig;
//! use lightnavi::embeddings::EmbeddingService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::new(&config)?;
//!
//!     let embedding = service.generate("高天井の倉庫に適した照明器具").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod backfill;
pub mod client;
pub mod generator;
pub mod text;

pub use backfill::backfill_embeddings;
pub use backfill::BackfillOptions;
pub use backfill::BackfillStats;
pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;
pub use generator::EmbeddingService;
pub use text::preprocess_text_for_embedding;

use crate::errors::LightNaviError;
use crate::errors::Result;

/// Default embedding dimension for text-embedding-3-small
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Maximum batch size for embedding generation
pub const MAX_BATCH_SIZE: usize = 100;

/// Configuration for embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub batch_size: usize,
    pub request_timeout_secs: u64,
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &crate::config::AppConfig) -> Result<Self> {
        let provider = match config.embeddings.provider.as_str() {
            "openai" => EmbeddingProvider::OpenAI,
            "ollama" => EmbeddingProvider::Ollama,
            other => {
                return Err(LightNaviError::ConfigError(format!(
                    "unknown embeddings provider '{other}'"
                )))
            }
        };

        Ok(Self {
            provider,
            model: config.embedding_model().to_string(),
            dimension: config.embedding_dimension(),
            endpoint: config.embeddings.endpoint.trim_end_matches('/').to_string(),
            api_key: config
                .embedding_api_key()
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            batch_size: config.embeddings.batch_size.clamp(1, MAX_BATCH_SIZE),
            request_timeout_secs: config.embeddings.request_timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_config_from_app_config() {
        let mut app = AppConfig::default();
        app.llm.llm_key = "sk-test".to_string();
        app.embeddings.endpoint = "https://api.openai.com/v1/".to_string();
        app.embeddings.batch_size = 500;

        let config = EmbeddingConfig::from_app_config(&app).unwrap();
        assert_eq!(config.provider, EmbeddingProvider::OpenAI);
        assert_eq!(config.endpoint, "https://api.openai.com/v1");
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.batch_size, MAX_BATCH_SIZE);
        assert_eq!(config.dimension, DEFAULT_EMBEDDING_DIM);
    }

    #[test]
    fn test_empty_key_is_treated_as_missing() {
        let app = AppConfig::default();
        let config = EmbeddingConfig::from_app_config(&app).unwrap();
        assert!(config.api_key.is_none());
    }
}
