//! CLI command handlers module
//!
//! - init: Database schema initialization
//! - embeddings: Embedding backfill
//! - search: Retrieval funnel queries
//! - serve: API server

pub mod embeddings;
pub mod init;
pub mod search;
pub mod serve;

pub use embeddings::*;
pub use init::*;
pub use search::*;
pub use serve::*;
