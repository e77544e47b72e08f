// MCP request dispatch, shared by the stdio and HTTP/SSE transports.

use crate::protocol::{
    CallToolParams, CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo, ToolsCapability,
    PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;
use tracing::{debug, error};

const SERVER_INSTRUCTIONS: &str = "Use this server to search and analyze clinical evidence data from the CIViC database \
for precision medicine and oncology research.";

/// Stateless MCP dispatcher over a tool registry.
pub struct McpService {
    registry: ToolRegistry,
}

impl McpService {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one JSON-RPC request. Notifications return None; everything
    /// else gets exactly one response.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "handling MCP request");

        if request.is_notification() {
            // notifications/initialized and friends need no reply.
            return None;
        }
        let id = request.id.clone().unwrap_or(serde_json::Value::Null);

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, request.params).await,
            method => JsonRpcResponse::error(id, JsonRpcError::method_not_found(method)),
        };

        Some(response)
    }

    fn handle_initialize(&self, id: serde_json::Value) -> JsonRpcResponse {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: nexonco_core::SERVICE_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        };
        Self::success(id, &result)
    }

    fn handle_list_tools(&self, id: serde_json::Value) -> JsonRpcResponse {
        let result = ListToolsResult {
            tools: self.registry.list_schemas(),
        };
        Self::success(id, &result)
    }

    async fn handle_call_tool(
        &self,
        id: serde_json::Value,
        params: Option<serde_json::Value>,
    ) -> JsonRpcResponse {
        let params: CallToolParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid tools/call params: {e}")),
                )
            }
            None => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params("tools/call requires params"),
                )
            }
        };

        let Some(tool) = self.registry.get(&params.name) else {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)),
            );
        };

        // Tool failures are reported inside the result, not as JSON-RPC
        // errors, so clients can show them to the model.
        let result = match tool.execute(params.arguments).await {
            Ok(result) => result,
            Err(e) => {
                error!(tool = %params.name, error = %e, "tool execution failed");
                CallToolResult::error(e.to_string())
            }
        };

        Self::success(id, &result)
    }

    fn success(id: serde_json::Value, result: &impl serde::Serialize) -> JsonRpcResponse {
        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(
                id,
                JsonRpcError::internal_error(format!("Failed to serialize result: {e}")),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ToolSchema;
    use crate::tools::{json_schema_object, json_schema_string, Tool};
    use anyhow::Result;
    use std::sync::Arc;

    struct GreetTool;

    #[async_trait::async_trait]
    impl Tool for GreetTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "greet".to_string(),
                description: "Greet someone".to_string(),
                input_schema: json_schema_object(
                    serde_json::json!({ "name": json_schema_string("Who to greet") }),
                    vec!["name"],
                ),
            }
        }

        async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
            match arguments["name"].as_str() {
                Some(name) => Ok(CallToolResult::text(format!("Hello, {name}!"))),
                None => anyhow::bail!("missing name"),
            }
        }
    }

    fn service() -> McpService {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(GreetTool));
        McpService::new(registry)
    }

    fn request(method: &str, params: Option<serde_json::Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(serde_json::json!(1)),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = service().handle(request("initialize", None)).await.unwrap();
        let result = response.result.unwrap();

        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "nexonco");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let notification = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: "notifications/initialized".to_string(),
            params: None,
        };
        assert!(service().handle(notification).await.is_none());
    }

    #[tokio::test]
    async fn test_ping() {
        let response = service().handle(request("ping", None)).await.unwrap();
        assert_eq!(response.result.unwrap(), serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_tools_list() {
        let response = service().handle(request("tools/list", None)).await.unwrap();
        let result = response.result.unwrap();
        let tools = result["tools"].as_array().unwrap();

        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "greet");
        assert!(tools[0]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = service().handle(request("bogus/method", None)).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_call_tool() {
        let response = service()
            .handle(request(
                "tools/call",
                Some(serde_json::json!({
                    "name": "greet",
                    "arguments": { "name": "Ada" }
                })),
            ))
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["content"][0]["text"], "Hello, Ada!");
        assert!(result.get("isError").is_none());
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let response = service()
            .handle(request(
                "tools/call",
                Some(serde_json::json!({ "name": "missing", "arguments": {} })),
            ))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_call_tool_missing_params() {
        let response = service().handle(request("tools/call", None)).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_tool_failure_reported_in_result() {
        let response = service()
            .handle(request(
                "tools/call",
                Some(serde_json::json!({ "name": "greet", "arguments": {} })),
            ))
            .await
            .unwrap();

        // Execution errors surface in the result payload, not as JSON-RPC errors.
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
    }
}
