//! Hybrid candidate retrieval for the fixture catalog
//!
//! The funnel runs three stages in a fixed order:
//! - vector similarity over precomputed category embeddings
//! - oracle (LLM) re-ranking of the embedding pool, or of a browse pool
//!   when no embedding result is available
//! - keyword supplementation when too few candidates survive
//!
//! Collaborator failures never escape the funnel. Each one is logged and
//! recorded as a [`Degradation`] in the [`RetrievalReport`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use lightnavi::config::AppConfig;
//! use lightnavi::database::Database;
//! use lightnavi::embeddings::EmbeddingService;
//! use lightnavi::llm::LlmService;
//! use lightnavi::retrieval::FunnelSettings;
//! use lightnavi::retrieval::RetrievalFunnel;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let funnel = RetrievalFunnel::new(
//!         Arc::new(EmbeddingService::new(&config)?),
//!         Arc::new(Database::from_config(&config).await?),
//!         Arc::new(LlmService::new(&config)?),
//!         FunnelSettings::from_config(&config.retrieval)?,
//!     );
//!
//!     let keywords = vec!["会議室".to_string()];
//!     let candidates = funnel.retrieve("会議室に適した照明器具", &keywords, 10).await?;
//!     println!("{} candidates", candidates.len());
//!     Ok(())
//! }
//! ```

pub mod funnel;
pub mod keyword;
pub mod memory;
pub mod rerank;
pub mod vector;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

pub use funnel::FunnelSettings;
pub use funnel::RetrievalFunnel;
pub use keyword::KeywordStage;
pub use memory::MemoryCatalog;
pub use rerank::OracleReranker;
pub use vector::VectorStage;

use crate::errors::Result;
use crate::models::FixtureCategory;
use crate::models::RankedCandidateList;

/// Maps text to a fixed-length embedding
#[async_trait]
pub trait TextVectorizer: Send + Sync {
    async fn vectorize(&self, text: &str) -> Result<Vec<f32>>;

    /// One vector per input, in input order
    async fn vectorize_batch(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.vectorize(text).await?);
        }
        Ok(embeddings)
    }

    /// Output length of every vector this vectorizer returns
    fn dimension(&self) -> usize;
}

/// Read access to the fixture catalog
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Up to `k` embedded records with their cosine distance, closest first
    async fn nearest_neighbors(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<(FixtureCategory, f64)>>;

    /// Up to `k` records matching any keyword (case-insensitive substring)
    /// in name, description or tags; an empty keyword set browses the catalog
    async fn keyword_match(&self, keywords: &[String], k: usize) -> Result<Vec<FixtureCategory>>;
}

/// Free-form text completion used as a relevance judge
#[async_trait]
pub trait RankingOracle: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Vector,
    Keyword,
    Rerank,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vector => "vector",
            Self::Keyword => "keyword",
            Self::Rerank => "rerank",
        })
    }
}

/// A stage that fell back to a weaker result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Degradation {
    pub stage: Stage,
    pub reason: String,
}

impl Degradation {
    pub fn new(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

/// Output of one stage plus the degradation it suffered, if any
#[derive(Debug, Clone)]
pub struct StageOutput<T> {
    pub items: T,
    pub degraded: Option<Degradation>,
}

impl<T> StageOutput<T> {
    pub const fn ok(items: T) -> Self {
        Self {
            items,
            degraded: None,
        }
    }

    pub const fn degraded(items: T, degradation: Degradation) -> Self {
        Self {
            items,
            degraded: Some(degradation),
        }
    }
}

/// Which pool fed the re-ranking stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalPath {
    /// Vector search returned candidates
    Embedding,
    /// Vector search was empty; an unfiltered catalog browse was used
    BrowseFallback,
}

impl RetrievalPath {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Embedding => "embedding",
            Self::BrowseFallback => "browse_fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RerankOutcome {
    /// Pool already within the cap; the oracle was not called
    Skipped,
    /// Oracle reply parsed; `padded` entries were appended in pool order
    Ranked { accepted: usize, padded: usize },
    /// Oracle failed; the pool prefix was returned unranked
    Degraded,
}

/// What happened during one retrieval call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrievalReport {
    pub path: RetrievalPath,
    pub embedding_pool: usize,
    pub rerank_pool: usize,
    pub rerank: RerankOutcome,
    pub primary: usize,
    /// Candidates appended by keyword supplementation
    pub supplemented: usize,
    pub supplementation_ran: bool,
    pub degradations: Vec<Degradation>,
}

impl RetrievalReport {
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }

    #[must_use]
    pub fn degraded_stage(&self, stage: Stage) -> bool {
        self.degradations.iter().any(|d| d.stage == stage)
    }
}

/// Candidates plus the report describing how they were produced
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub candidates: RankedCandidateList,
    pub report: RetrievalReport,
}
