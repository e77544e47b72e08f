use crate::config::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use nexonco_core::{BUILD_TIMESTAMP, SERVICE_NAME};
use nexonco_mcp::protocol::{JsonRpcRequest, PROTOCOL_VERSION};
use std::sync::Arc;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Root endpoint with API information.
pub async fn root_info() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": SERVICE_NAME,
        "version": VERSION,
        "description": "Clinical Evidence MCP Server for Precision Oncology",
        "endpoints": {
            "/mcp": "MCP Streamable HTTP endpoint (GET returns the server card)",
            "/sse": "MCP SSE transport",
            "/health": "Health check endpoint",
            "/version": "Version information"
        }
    }))
}

/// Health check endpoint for container orchestration.
pub async fn health_check() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-cache")],
        Json(serde_json::json!({
            "status": "healthy",
            "version": VERSION,
            "timestamp": BUILD_TIMESTAMP,
        })),
    )
}

/// Version information endpoint.
pub async fn version_info() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-cache")],
        Json(serde_json::json!({
            "name": SERVICE_NAME,
            "version": VERSION,
            "build": BUILD_TIMESTAMP,
        })),
    )
}

/// MCP Server Card for discovery (SEP-1649). Served on GET /mcp and the
/// .well-known aliases.
pub async fn server_card() -> impl IntoResponse {
    let card = serde_json::json!({
        "$schema": "https://static.modelcontextprotocol.io/schemas/mcp-server-card/v1.json",
        "version": "1.0",
        "protocolVersion": PROTOCOL_VERSION,
        "serverInfo": {
            "name": SERVICE_NAME,
            "title": "Nexonco Clinical Evidence Server",
            "version": VERSION,
        },
        "description": "An advanced MCP Server for accessing and analyzing clinical evidence data, \
with flexible search options to support precision medicine and oncology research.",
        "documentationUrl": "https://github.com/Nexgene-Research/nexonco-mcp",
        "transport": {
            "type": "sse",
            "endpoint": "/sse",
        },
        "capabilities": {
            "tools": {},
        },
        "authentication": {
            "required": false,
            "schemes": [],
        },
        "tools": [
            {
                "name": "search_clinical_evidence",
                "description": "Perform a flexible search for clinical evidence using combinations of \
filters such as disease, therapy, molecular profile, phenotype, evidence type, and direction.",
            }
        ],
        "instructions": "Use this server to search and analyze clinical evidence data from the CIViC \
database for precision medicine and oncology research.",
    });

    // The CORS layer adds Access-Control-Allow-Origin: * to every response.
    ([(header::CACHE_CONTROL, "public, max-age=3600")], Json(card))
}

/// MCP config schema for session configuration discovery.
pub async fn mcp_config() -> impl IntoResponse {
    let schema = serde_json::json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "$id": "https://nexonco-mcp.smithery.ai/.well-known/mcp-config",
        "title": "MCP Session Configuration",
        "description": "Schema for the /mcp endpoint configuration",
        "x-query-style": "dot+bracket",
        "type": "object",
        "properties": {},
        "required": [],
    });

    (
        [(header::CACHE_CONTROL, "public, max-age=3600")],
        Json(schema),
    )
}

/// POST /mcp - streamable HTTP transport. One JSON-RPC request in, one
/// response out; notifications are accepted with an empty 202.
pub async fn mcp_post(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    match state.service.handle(request).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
