//! Dialogue orchestration for fixture selection
//!
//! Each chat turn either asks the user for missing project information or,
//! once a property name is known, runs the retrieval funnel and presents the
//! shortlisted fixture categories.

pub mod keywords;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use serde_json::Value;
use tracing::debug;
use tracing::info;
use tracing::warn;

pub use keywords::derive_search_terms;

use crate::config::AppConfig;
use crate::database::Database;
use crate::embeddings::EmbeddingService;
use crate::errors::Result;
use crate::llm::prompts::format_reply_candidates;
use crate::llm::prompts::project_values;
use crate::llm::ChatMessage;
use crate::llm::ChatModel;
use crate::llm::LightingPrompts;
use crate::llm::LlmService;
use crate::models::ChatResponse;
use crate::models::Message;
use crate::models::ProjectInfo;
use crate::models::Role;
use crate::retrieval::FunnelSettings;
use crate::retrieval::RetrievalFunnel;
use crate::retrieval::RetrievalOutcome;

/// Default number of candidates returned to the client
pub const DEFAULT_FINAL_CAP: usize = 10;

/// Lighting fixture selection agent
pub struct LightingAgent {
    chat: Arc<dyn ChatModel>,
    funnel: Arc<RetrievalFunnel>,
    final_cap: usize,
    timeout: Option<Duration>,
}

impl LightingAgent {
    pub fn new(chat: Arc<dyn ChatModel>, funnel: Arc<RetrievalFunnel>) -> Self {
        Self {
            chat,
            funnel,
            final_cap: DEFAULT_FINAL_CAP,
            timeout: None,
        }
    }

    /// Wire the agent to Postgres, the embedding provider and the LLM
    ///
    /// # Errors
    /// - Database connection errors
    /// - Embedding or LLM service configuration errors
    /// - Invalid `[retrieval]` settings
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let database = Arc::new(Database::from_config(config).await?);
        let embedding_service = Arc::new(EmbeddingService::new(config)?);
        let llm_service = Arc::new(LlmService::new(config)?);
        let settings = FunnelSettings::from_config(&config.retrieval)?;

        let funnel = RetrievalFunnel::new(embedding_service, database, llm_service.clone(), settings);
        Ok(Self::new(llm_service, Arc::new(funnel))
            .with_final_cap(config.retrieval.final_cap)
            .with_timeout(config.retrieval_timeout()))
    }

    #[must_use]
    pub fn with_final_cap(mut self, final_cap: usize) -> Self {
        self.final_cap = final_cap;
        self
    }

    /// Abort retrieval after `timeout`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn final_cap(&self) -> usize {
        self.final_cap
    }

    /// Answer the latest turn of a conversation
    ///
    /// # Errors
    /// - Chat model failures (thinking, question or reply generation)
    /// - Retrieval timeout or an invalid final cap
    pub async fn process_message(
        &self,
        messages: &[Message],
        context: Option<&Value>,
    ) -> Result<ChatResponse> {
        let history = conversation(messages);
        let latest_message = messages.last().map_or("", |m| m.content.as_str());

        match parse_project_info(context) {
            Some(project) if project.is_searchable() => {
                self.search_response(&project, latest_message, history)
                    .await
            }
            _ => self.question_response(latest_message, history).await,
        }
    }

    async fn question_response(
        &self,
        latest_message: &str,
        mut history: Vec<ChatMessage>,
    ) -> Result<ChatResponse> {
        debug!("Project information incomplete, asking follow-up questions");

        let mut values = std::collections::HashMap::new();
        values.insert("user_message", latest_message.to_string());
        history.push(ChatMessage::user(LightingPrompts::question().render(&values)));

        let message = self.chat.chat(&history).await?;
        Ok(ChatResponse {
            message,
            thinking: None,
            search_queries: None,
            candidates: None,
            metadata: None,
        })
    }

    async fn search_response(
        &self,
        project: &ProjectInfo,
        latest_message: &str,
        mut history: Vec<ChatMessage>,
    ) -> Result<ChatResponse> {
        let values = project_values(project);

        let thinking = self
            .chat
            .chat(&[
                ChatMessage::system(LightingPrompts::thinking_system()),
                ChatMessage::user(LightingPrompts::thinking().render(&values)),
            ])
            .await?;

        let query = derive_search_terms(project, latest_message, self.final_cap);
        info!(
            "Searching catalog: {} ({} keywords)",
            query.text,
            query.keywords.len()
        );

        let RetrievalOutcome { candidates, report } = match self.timeout {
            Some(deadline) => {
                self.funnel
                    .retrieve_with_timeout(&query.text, &query.keywords, query.limit, deadline)
                    .await?
            }
            None => self.funnel.retrieve_query(&query).await?,
        };
        let candidates = candidates.into_vec();

        let mut reply_values = values;
        reply_values.insert("candidates", format_reply_candidates(&candidates));
        history.push(ChatMessage::user(
            LightingPrompts::candidates_reply().render(&reply_values),
        ));
        let message = self.chat.chat(&history).await?;

        let mut search_queries = Vec::with_capacity(query.keywords.len() + 1);
        search_queries.push(query.text);
        search_queries.extend(query.keywords);

        let metadata = json!({
            "project_info": project,
            "search_count": candidates.len(),
            "search_method": report.path.as_str(),
            "degraded": report.is_degraded(),
            "degradations": report.degradations,
        });

        Ok(ChatResponse {
            message,
            thinking: Some(thinking),
            search_queries: Some(search_queries),
            candidates: Some(candidates),
            metadata: Some(metadata),
        })
    }
}

/// System prompt followed by the user and assistant turns
fn conversation(messages: &[Message]) -> Vec<ChatMessage> {
    let mut history = Vec::with_capacity(messages.len() + 2);
    history.push(ChatMessage::system(LightingPrompts::system()));
    history.extend(
        messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(ChatMessage::from),
    );
    history
}

fn parse_project_info(context: Option<&Value>) -> Option<ProjectInfo> {
    let context = context?;
    match serde_json::from_value::<ProjectInfo>(context.clone()) {
        Ok(info) => Some(info),
        Err(e) => {
            warn!("Ignoring unparseable project context: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::errors::LightNaviError;
    use crate::llm::ChatRole;
    use crate::models::FixtureCategory;
    use crate::retrieval::MemoryCatalog;
    use crate::retrieval::RankingOracle;
    use crate::retrieval::TextVectorizer;

    #[derive(Default)]
    struct RecordingChat {
        calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    #[async_trait]
    impl ChatModel for RecordingChat {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(messages.to_vec());
            Ok(format!("reply-{}", calls.len()))
        }
    }

    struct OfflineVectorizer;

    #[async_trait]
    impl TextVectorizer for OfflineVectorizer {
        async fn vectorize(&self, _text: &str) -> Result<Vec<f32>> {
            Err(LightNaviError::EmbeddingError("offline".to_string()))
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    struct SilentOracle;

    #[async_trait]
    impl RankingOracle for SilentOracle {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(String::new())
        }
    }

    fn agent(chat: Arc<RecordingChat>) -> LightingAgent {
        let mut warehouse = FixtureCategory::new(1, "高天井用LED");
        warehouse.suitable_for = vec!["倉庫".to_string(), "高天井".to_string()];
        let office = FixtureCategory::new(2, "スクエアベースライト");

        let funnel = RetrievalFunnel::new(
            Arc::new(OfflineVectorizer),
            Arc::new(MemoryCatalog::new(vec![warehouse, office])),
            Arc::new(SilentOracle),
            FunnelSettings::default(),
        );
        LightingAgent::new(chat, Arc::new(funnel))
    }

    fn user(content: &str) -> Message {
        Message {
            role: Role::User,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_property_name_asks_questions() {
        let chat = Arc::new(RecordingChat::default());
        let response = agent(chat.clone())
            .process_message(&[user("照明を選びたいです")], None)
            .await
            .unwrap();

        assert_eq!(response.message, "reply-1");
        assert!(response.candidates.is_none());
        assert!(response.thinking.is_none());

        let calls = chat.calls.lock().unwrap();
        let sent = &calls[0];
        assert_eq!(sent[0].role, ChatRole::System);
        assert_eq!(sent[1].content, "照明を選びたいです");
        assert!(sent[2].content.contains("ユーザーのメッセージ: 照明を選びたいです"));
    }

    #[tokio::test]
    async fn test_unparseable_context_is_treated_as_absent() {
        let chat = Arc::new(RecordingChat::default());
        let context = json!({"ceiling_height": "very high"});
        let response = agent(chat)
            .process_message(&[user("こんにちは")], Some(&context))
            .await
            .unwrap();
        assert!(response.search_queries.is_none());
    }

    #[tokio::test]
    async fn test_search_response_runs_the_funnel() {
        let chat = Arc::new(RecordingChat::default());
        let context = json!({"property_name": "物流倉庫", "ceiling_height": 12.0});
        let response = agent(chat.clone())
            .process_message(&[user("倉庫の照明を探しています")], Some(&context))
            .await
            .unwrap();

        assert_eq!(response.thinking.as_deref(), Some("reply-1"));
        assert_eq!(response.message, "reply-2");
        assert_eq!(
            response.search_queries.unwrap(),
            vec!["物流倉庫 高天井に適した照明器具", "物流倉庫", "高天井"]
        );

        let candidates = response.candidates.unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].id(), 1);

        let metadata = response.metadata.unwrap();
        assert_eq!(metadata["search_method"], "browse_fallback");
        assert_eq!(metadata["search_count"], 2);
        assert_eq!(metadata["degraded"], true);
        assert_eq!(metadata["project_info"]["property_name"], "物流倉庫");

        let calls = chat.calls.lock().unwrap();
        assert!(calls[1].last().unwrap().content.contains("1. 高天井用LED"));
    }

    #[tokio::test]
    async fn test_zero_final_cap_is_rejected() {
        let chat = Arc::new(RecordingChat::default());
        let context = json!({"property_name": "本社"});
        let err = agent(chat)
            .with_final_cap(0)
            .process_message(&[user("よろしく")], Some(&context))
            .await
            .unwrap_err();
        assert!(matches!(err, LightNaviError::InvalidArgument(_)));
    }
}
