//! Shared test helpers


use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::LightingAgent;
use crate::config::AppConfig;
use crate::database::Database;
use crate::errors::LightNaviError;
use crate::llm::ChatMessage;
use crate::llm::ChatModel;
use crate::models::FixtureCategory;
use crate::retrieval::FunnelSettings;
use crate::retrieval::MemoryCatalog;
use crate::retrieval::RankingOracle;
use crate::retrieval::RetrievalFunnel;
use crate::retrieval::TextVectorizer;
use crate::Result;

/// Test helper to create a test database connection
pub async fn create_test_database() -> Result<Database> {
    let config = AppConfig::load()?;
    let database = Database::from_config(&config).await?;
    Ok(database)
}

/// Insert a category directly; the crate itself never writes catalog rows
pub async fn insert_test_category(
    database: &Database,
    category: &FixtureCategory,
) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO product_categories (name, manufacturer, description, suitable_for, embedding)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        ",
    )
    .bind(&category.name)
    .bind(&category.manufacturer)
    .bind(&category.description)
    .bind(sqlx::types::Json(&category.suitable_for))
    .bind(category.embedding.clone().map(pgvector::Vector::from))
    .fetch_one(database.pool())
    .await?;
    Ok(id)
}

/// Test helper to clean up rows created by a test
pub async fn cleanup_test_categories(database: &Database, name_prefix: &str) -> Result<()> {
    sqlx::query("DELETE FROM product_categories WHERE name LIKE $1")
        .bind(format!("{name_prefix}%"))
        .execute(database.pool())
        .await?;
    Ok(())
}

/// Maps every text to `[1, 0]`
pub struct UnitVectorizer;

#[async_trait]
impl TextVectorizer for UnitVectorizer {
    async fn vectorize(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    fn dimension(&self) -> usize {
        2
    }
}

/// Accepts the first presented candidate
pub struct FirstChoiceOracle;

#[async_trait]
impl RankingOracle for FirstChoiceOracle {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok("1".to_string())
    }
}

/// Replies with a fixed message, or fails every call
pub struct CannedChat {
    pub fail: bool,
}

#[async_trait]
impl ChatModel for CannedChat {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        if self.fail {
            return Err(LightNaviError::LlmError("model unavailable".to_string()));
        }
        Ok(format!("{} messages received", messages.len()))
    }
}

/// Three embedded office and warehouse categories
pub fn sample_catalog() -> MemoryCatalog {
    let records = [
        (1, "スクエアベースライト", "会議室", vec![0.9_f32, 0.1]),
        (2, "高天井用LED", "倉庫", vec![0.1, 0.9]),
        (3, "ダウンライト", "会議室", vec![0.7, 0.3]),
    ]
    .into_iter()
    .map(|(id, name, tag, embedding)| {
        let mut category = FixtureCategory::new(id, name);
        category.suitable_for = vec![tag.to_string()];
        category.embedding = Some(embedding);
        category
    })
    .collect();
    MemoryCatalog::new(records)
}

/// Agent over [`sample_catalog`] with deterministic collaborators
pub fn stub_agent(chat_fails: bool) -> LightingAgent {
    let funnel = RetrievalFunnel::new(
        Arc::new(UnitVectorizer),
        Arc::new(sample_catalog()),
        Arc::new(FirstChoiceOracle),
        FunnelSettings::default(),
    );
    LightingAgent::new(Arc::new(CannedChat { fail: chat_fails }), Arc::new(funnel))
}
