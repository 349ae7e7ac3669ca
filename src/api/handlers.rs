//! API request handlers

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::error;
use tracing::info;

use crate::agent::LightingAgent;
use crate::api::types::ApiResponse;
use crate::api::types::HealthResponse;
use crate::api::types::StatusResponse;
use crate::models::ChatRequest;
use crate::models::ChatResponse;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<LightingAgent>,
}

/// Root status handler
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "LightNavi API is running".to_string(),
        status: "ok".to_string(),
    })
}

/// Health check handler
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Chat turn (POST /api/chat)
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ApiResponse<()>>)> {
    info!(
        "POST /api/chat: {} messages, context: {}",
        req.messages.len(),
        req.context.is_some()
    );

    match state
        .agent
        .process_message(&req.messages, req.context.as_ref())
        .await
    {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("Error processing chat message: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Failed to process message: {e}"))),
            ))
        }
    }
}
