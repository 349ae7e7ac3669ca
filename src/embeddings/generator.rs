//! Embedding generation service with preprocessing and batch processing

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::client::EmbeddingClient;
use super::client::EmbeddingProvider;
use super::text::preprocess_text_for_embedding;
use super::EmbeddingConfig;
use crate::errors::LightNaviError;
use crate::errors::Result;
use crate::retrieval::TextVectorizer;

/// Service for generating embeddings of a fixed dimension
pub struct EmbeddingService {
    client: Arc<EmbeddingClient>,
    config: EmbeddingConfig,
}

impl EmbeddingService {
    /// Create a new embedding service
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        Self::from_config(EmbeddingConfig::from_app_config(config)?)
    }

    /// Create from custom config
    pub fn from_config(config: EmbeddingConfig) -> Result<Self> {
        let client = EmbeddingClient::new(
            config.provider,
            config.model.clone(),
            config.dimension,
            config.endpoint.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;

        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    /// Generate embedding for a single text
    ///
    /// # Errors
    /// - Blank input
    /// - Provider failures
    /// - A vector whose length differs from the configured dimension
    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        let processed = preprocess_text_for_embedding(text)?;
        let embedding = self.client.generate(&processed).await?;
        self.check_dimension(&embedding)?;
        Ok(embedding)
    }

    /// Generate embeddings for multiple texts in batch
    ///
    /// Every input must be non-blank; callers filter empty texts first.
    pub async fn generate_batch(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let processed = texts
            .iter()
            .map(|t| preprocess_text_for_embedding(t))
            .collect::<Result<Vec<_>>>()?;

        let mut embeddings = Vec::with_capacity(processed.len());
        for chunk in processed.chunks(self.config.batch_size) {
            debug!("Embedding batch of {} texts", chunk.len());
            let chunk_embeddings = self
                .client
                .generate_batch(chunk.iter().map(String::as_str).collect())
                .await?;
            embeddings.extend(chunk_embeddings);
        }

        for embedding in &embeddings {
            self.check_dimension(embedding)?;
        }
        Ok(embeddings)
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.config.dimension {
            return Err(LightNaviError::EmbeddingError(format!(
                "embedding has {} dimensions, expected {}",
                embedding.len(),
                self.config.dimension
            )));
        }
        Ok(())
    }

    /// Get the embedding dimension
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Get the model name
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Get the provider
    #[must_use]
    pub const fn provider(&self) -> EmbeddingProvider {
        self.config.provider
    }

    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.config.batch_size
    }
}

#[async_trait]
impl TextVectorizer for EmbeddingService {
    async fn vectorize(&self, text: &str) -> Result<Vec<f32>> {
        self.generate(text).await
    }

    async fn vectorize_batch(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        self.generate_batch(texts).await
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}
