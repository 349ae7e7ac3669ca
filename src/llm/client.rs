//! HTTP chat completion client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::ChatMessage;
use super::ChatModel;
use super::LightingPrompts;
use crate::config::AppConfig;
use crate::errors::LightNaviError;
use crate::errors::Result;
use crate::retrieval::RankingOracle;

/// Supported chat providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// `OpenAI` chat completions API and compatible servers
    OpenAI,
    /// Ollama local chat API
    Ollama,
}

impl LlmProvider {
    /// `llm_key = "ollama"` selects the local provider
    #[must_use]
    pub fn detect(llm_key: &str) -> Self {
        if llm_key.eq_ignore_ascii_case("ollama") {
            Self::Ollama
        } else {
            Self::OpenAI
        }
    }
}

/// Chat completion service
#[derive(Clone)]
pub struct LlmService {
    provider: LlmProvider,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: Client,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: usize,
}

#[derive(Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: ReplyMessage,
}

impl LlmService {
    /// Create a new LLM service from the `[llm]` section
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.llm.request_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LightNaviError::HttpError(e.to_string()))?;

        Ok(Self {
            provider: LlmProvider::detect(config.llm_key()),
            endpoint: config.llm_endpoint().trim_end_matches('/').to_string(),
            api_key: config.llm_key().to_string(),
            model: config.llm_model().to_string(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            client,
        })
    }

    #[must_use]
    pub const fn provider(&self) -> LlmProvider {
        self.provider
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single-prompt completion with the configured parameters
    ///
    /// # Errors
    /// - API request failures (network errors, timeouts, authentication failures)
    /// - Invalid API responses (malformed JSON, empty choices)
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_params(prompt, self.temperature, self.max_tokens)
            .await
    }

    pub async fn generate_with_params(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String> {
        self.chat_with_params(&[ChatMessage::user(prompt)], temperature, max_tokens)
            .await
    }

    /// Complete a conversation
    ///
    /// # Errors
    /// - Missing API key for the `OpenAI` provider
    /// - API request failures and malformed responses
    pub async fn chat_with_params(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String> {
        debug!(
            "Sending {} messages to {} ({:?})",
            messages.len(),
            self.model,
            self.provider
        );
        match self.provider {
            LlmProvider::OpenAI => self.chat_openai(messages, temperature, max_tokens).await,
            LlmProvider::Ollama => self.chat_ollama(messages, temperature, max_tokens).await,
        }
    }

    async fn chat_openai(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String> {
        if self.api_key.trim().is_empty() {
            return Err(LightNaviError::ConfigError(
                "OpenAI API key not provided (set llm.llm_key or OPENAI_API_KEY)".to_string(),
            ));
        }

        let url = format!("{}/chat/completions", self.endpoint);
        let request = OpenAIChatRequest {
            model: &self.model,
            messages,
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
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
            return Err(LightNaviError::LlmError(format!(
                "OpenAI API error ({status}): {error_text}"
            )));
        }

        let result: OpenAIChatResponse = response
            .json()
            .await
            .map_err(|e| LightNaviError::LlmError(format!("Failed to parse response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LightNaviError::LlmError("No completion in response".to_string()))
    }

    async fn chat_ollama(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String> {
        let url = format!("{}/api/chat", self.endpoint);
        let request = OllamaChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: OllamaOptions {
                temperature,
                num_predict: max_tokens,
            },
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
            return Err(LightNaviError::LlmError(format!(
                "Ollama API error ({status}): {error_text}"
            )));
        }

        let result: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| LightNaviError::LlmError(format!("Failed to parse response: {e}")))?;

        result
            .message
            .content
            .ok_or_else(|| LightNaviError::LlmError("No completion in response".to_string()))
    }
}

#[async_trait]
impl ChatModel for LlmService {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        self.chat_with_params(messages, self.temperature, self.max_tokens)
            .await
    }
}

/// Re-ranking prompts go out under the lighting-expert system message
#[async_trait]
impl RankingOracle for LlmService {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.chat(&rerank_messages(prompt)).await
    }
}

fn rerank_messages(prompt: &str) -> [ChatMessage; 2] {
    [
        ChatMessage::system(LightingPrompts::rerank_system()),
        ChatMessage::user(prompt),
    ]
}
