// Standalone MCP server binary: newline-delimited JSON-RPC over stdio, for
// local development and direct client integration.

use anyhow::Result;
use futures::StreamExt;
use nexonco_mcp::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use nexonco_mcp::tools::{SearchClinicalEvidenceTool, ToolRegistry};
use nexonco_mcp::McpService;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_util::codec::{FramedRead, LinesCodec};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::info!("Nexonco MCP server starting (stdio transport)");

    let client = Arc::new(nexonco_core::CivicClient::new()?);

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SearchClinicalEvidenceTool::new(client)));

    tracing::info!("Registered {} tools", registry.list_schemas().len());

    let service = McpService::new(registry);

    let mut lines = FramedRead::new(tokio::io::stdin(), LinesCodec::new());
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next().await {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
            Ok(request) => service.handle(request).await,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse request");
                Some(JsonRpcResponse::error(
                    serde_json::Value::Null,
                    JsonRpcError::parse_error(),
                ))
            }
        };

        if let Some(response) = response {
            let mut payload = serde_json::to_vec(&response)?;
            payload.push(b'\n');
            stdout.write_all(&payload).await?;
            stdout.flush().await?;
        }
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}
