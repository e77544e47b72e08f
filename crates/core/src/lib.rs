// Nexonco core: CIViC evidence data model, upstream GraphQL client, and
// report rendering shared by the MCP and HTTP layers.

pub mod client;
pub mod error;
pub mod evidence;
pub mod report;

pub use client::{CivicClient, ClientConfig, RetryConfig};
pub use error::{CivicError, CivicResult};
pub use evidence::{EvidenceDirection, EvidenceFilter, EvidenceItem, EvidenceType, Source};
pub use report::ReportBuilder;

/// Public server name used in discovery metadata and user agents.
pub const SERVICE_NAME: &str = "nexonco";

/// Build timestamp reported by /health and /version.
pub const BUILD_TIMESTAMP: &str = "2025-12-31";
