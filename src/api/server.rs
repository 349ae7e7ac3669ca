//! HTTP server implementation

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::AllowHeaders;
use tower_http::cors::AllowMethods;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::agent::LightingAgent;
use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::config::ServerConfig;
use crate::errors::LightNaviError;
use crate::Result;

/// Assemble the router with its middleware stack
///
/// # Errors
/// - A configured CORS origin is not a valid header value
pub fn build_app(state: AppState, server: &ServerConfig) -> Result<Router> {
    let origins = server
        .cors_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| {
                LightNaviError::ConfigError(format!("invalid CORS origin '{origin}': {e}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // Credentialed CORS cannot use wildcards, so methods and headers are mirrored.
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    let app = routes::status_routes()
        .nest("/api", routes::api_routes(state))
        .layer(GlobalConcurrencyLimitLayer::new(
            server.max_concurrent_requests.max(1),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors);

    Ok(app)
}

/// Start the API server
pub async fn serve_api(config: &AppConfig, host: String, port: u16) -> Result<()> {
    info!("Starting LightNavi API server...");

    let agent = LightingAgent::from_config(config).await?;
    let state = AppState {
        agent: Arc::new(agent),
    };
    let app = build_app(state, &config.server)?;

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on http://{}", addr);
    info!("CORS origins: {}", config.server.cors_origins.join(", "));
    info!("Available endpoints:");
    info!("  GET  /           - Status");
    info!("  GET  /health     - Health check");
    info!("  POST /api/chat   - Chat with the lighting agent");

    axum::serve(listener, app).await?;

    Ok(())
}
