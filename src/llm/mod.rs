//! Chat completion clients
//!
//! `LlmService` talks to an OpenAI-compatible `/chat/completions` endpoint
//! or to Ollama's `/api/chat`. The dialogue layer sees it through
//! [`ChatModel`] and the retrieval funnel through
//! [`RankingOracle`](crate::retrieval::RankingOracle).

pub mod client;
pub mod prompts;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

pub use client::LlmProvider;
pub use client::LlmService;
pub use prompts::LightingPrompts;
pub use prompts::PromptTemplate;

use crate::errors::Result;
use crate::models::Message;
use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One turn of a chat completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        let role = match message.role {
            Role::User => ChatRole::User,
            Role::Assistant => ChatRole::Assistant,
            Role::System => ChatRole::System,
        };
        Self {
            role,
            content: message.content.clone(),
        }
    }
}

/// A model that answers a conversation with a single reply
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;
}
