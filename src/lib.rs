pub mod agent;
pub mod api;
pub mod cli;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod models;
pub mod retrieval;

#[cfg(test)]
mod errors_tests;
#[cfg(test)]
pub mod tests;

pub use config::AppConfig;
pub use errors::*;
