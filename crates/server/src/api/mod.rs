use crate::config::{AppState, ServerConfig};
use crate::sse;
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

mod handlers;

/// Start the API server
pub async fn serve(addr: &str, config: ServerConfig) -> Result<()> {
    let state = AppState::new(&config)?;

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the API router
fn create_router(state: AppState) -> Router {
    Router::new()
        // Service info, health, and version
        .route("/", get(handlers::root_info))
        .route("/health", get(handlers::health_check))
        .route("/version", get(handlers::version_info))
        // MCP streamable HTTP endpoint; GET serves the server card
        .route("/mcp", get(handlers::server_card).post(handlers::mcp_post))
        // Server card discovery aliases (SEP-1649)
        .route("/mcp.json", get(handlers::server_card))
        .route("/server-card.json", get(handlers::server_card))
        .route("/.well-known/mcp", get(handlers::server_card))
        .route("/.well-known/mcp.json", get(handlers::server_card))
        .route(
            "/.well-known/mcp/server-card.json",
            get(handlers::server_card),
        )
        .route("/.well-known/mcp-config", get(handlers::mcp_config))
        // SSE transport
        .route("/sse", get(sse::sse_handler))
        .route("/messages", post(sse::messages_handler))
        // Middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(Arc::new(state))
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}
