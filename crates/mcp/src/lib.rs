// MCP (Model Context Protocol) layer for the nexonco clinical evidence
// server: JSON-RPC types, tool registry, and request dispatch shared by the
// stdio binary and the HTTP/SSE transports.

pub mod protocol;
pub mod service;
pub mod tools;

pub use service::McpService;
