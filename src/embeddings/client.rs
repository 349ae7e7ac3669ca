//! Embedding API clients for the supported providers

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::errors::LightNaviError;
use crate::errors::Result;

/// Supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// `OpenAI` embeddings API
    OpenAI,
    /// Ollama local embeddings
    Ollama,
}

/// Client for generating embeddings from the configured provider
pub struct EmbeddingClient {
    provider: EmbeddingProvider,
    model: String,
    dimension: usize,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Serialize)]
struct OpenAIRequest<'a, I: Serialize> {
    input: I,
    model: &'a str,
    dimensions: usize,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    data: Vec<OpenAIEmbedding>,
}

#[derive(Deserialize)]
struct OpenAIEmbedding {
    index: usize,
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    /// Create a new embedding client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(
        provider: EmbeddingProvider,
        model: String,
        dimension: usize,
        endpoint: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LightNaviError::HttpError(e.to_string()))?;

        Ok(Self {
            provider,
            model,
            dimension,
            endpoint,
            api_key,
            client,
        })
    }

    #[must_use]
    pub const fn provider(&self) -> EmbeddingProvider {
        self.provider
    }

    /// Generate embedding for a single text
    ///
    /// # Errors
    /// - API request failures (network errors, timeouts, authentication failures)
    /// - Invalid API responses (malformed JSON, missing embedding)
    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        match self.provider {
            EmbeddingProvider::OpenAI => {
                let mut batch = self.generate_openai(text).await?;
                batch
                    .pop()
                    .ok_or_else(|| LightNaviError::EmbeddingError("No embedding in response".to_string()))
            }
            EmbeddingProvider::Ollama => self.generate_ollama(text).await,
        }
    }

    /// Generate embeddings for multiple texts, preserving input order
    ///
    /// # Errors
    /// - API request failures (network errors, timeouts, authentication failures)
    /// - Invalid API responses (malformed JSON, count mismatches)
    pub async fn generate_batch(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        match self.provider {
            EmbeddingProvider::OpenAI => {
                let expected = texts.len();
                let embeddings = self.generate_openai(texts).await?;
                if embeddings.len() != expected {
                    return Err(LightNaviError::EmbeddingError(format!(
                        "expected {expected} embeddings, got {}",
                        embeddings.len()
                    )));
                }
                Ok(embeddings)
            }
            EmbeddingProvider::Ollama => {
                // Ollama has no batch endpoint
                use futures::stream::StreamExt;
                use futures::stream::{
                    self,
                };

                let concurrency = texts.len().min(8);
                let requests: Vec<_> =
                    texts.into_iter().map(|text| self.generate_ollama(text)).collect();
                let results: Vec<Result<Vec<f32>>> = stream::iter(requests)
                    .buffered(concurrency)
                    .collect()
                    .await;

                results.into_iter().collect()
            }
        }
    }

    /// Call the `OpenAI` embeddings API with one string or an array of strings
    async fn generate_openai<I: Serialize + Send>(&self, input: I) -> Result<Vec<Vec<f32>>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| LightNaviError::ConfigError("OpenAI API key not provided".to_string()))?;

        let url = format!("{}/embeddings", self.endpoint);
        debug!("Calling OpenAI embeddings API: {}", url);

        let request = OpenAIRequest {
            input,
            model: &self.model,
            dimensions: self.dimension,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| LightNaviError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LightNaviError::EmbeddingError(format!(
                "OpenAI API error ({status}): {error_text}"
            )));
        }

        let mut result: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| LightNaviError::EmbeddingError(format!("Failed to parse response: {e}")))?;

        // The API documents `index` as the input position; do not trust arrival order.
        result.data.sort_by_key(|d| d.index);
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    /// Generate embedding using Ollama API
    async fn generate_ollama(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            embedding: Vec<f32>,
        }

        let url = format!("{}/api/embeddings", self.endpoint);
        debug!("Calling Ollama embeddings API: {}", url);

        let request = OllamaRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| LightNaviError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LightNaviError::EmbeddingError(format!(
                "Ollama API error ({status}): {error_text}"
            )));
        }

        let result: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LightNaviError::EmbeddingError(format!("Failed to parse response: {e}")))?;

        Ok(result.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_request_shape() {
        let request = OpenAIRequest {
            input: vec!["a", "b"],
            model: "text-embedding-3-small",
            dimensions: 1536,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input"][1], "b");
        assert_eq!(json["dimensions"], 1536);
    }

    #[test]
    fn test_openai_response_is_reordered_by_index() {
        let mut parsed: OpenAIResponse = serde_json::from_str(
            r#"{"data": [{"index": 1, "embedding": [0.2]}, {"index": 0, "embedding": [0.1]}]}"#,
        )
        .unwrap();
        parsed.data.sort_by_key(|d| d.index);
        assert_eq!(parsed.data[0].embedding, vec![0.1]);
    }

    #[tokio::test]
    async fn test_missing_openai_key_is_config_error() {
        let client = EmbeddingClient::new(
            EmbeddingProvider::OpenAI,
            "text-embedding-3-small".to_string(),
            1536,
            "http://127.0.0.1:9".to_string(),
            None,
            Duration::from_secs(1),
        )
        .unwrap();

        let err = client.generate("照明").await.unwrap_err();
        assert!(matches!(err, LightNaviError::ConfigError(_)));
    }

    #[tokio::test]
    #[ignore = "Requires API key"]
    async fn test_openai_embedding() {
        let client = EmbeddingClient::new(
            EmbeddingProvider::OpenAI,
            "text-embedding-3-small".to_string(),
            1536,
            "https://api.openai.com/v1".to_string(),
            std::env::var("OPENAI_API_KEY").ok(),
            Duration::from_secs(30),
        )
        .unwrap();

        let embedding = client.generate("会議室に適した照明器具").await.unwrap();
        assert_eq!(embedding.len(), 1536);
    }
}
