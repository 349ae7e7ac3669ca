//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Status endpoints served at the root
pub fn status_routes() -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
}

/// Routes nested under `/api`
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(handlers::chat))
        .with_state(state)
}
