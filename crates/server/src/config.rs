use crate::sse::SseSessions;
use anyhow::{Context, Result};
use nexonco_core::client::DEFAULT_ENDPOINT;
use nexonco_core::{CivicClient, ClientConfig, RetryConfig};
use nexonco_mcp::tools::{SearchClinicalEvidenceTool, ToolRegistry};
use nexonco_mcp::McpService;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// Connection settings for the CIViC GraphQL API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_upstream_url() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl ServerConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        // Load config file if it exists, otherwise use defaults
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Ok(Self::default())
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<McpService>,
    pub sessions: SseSessions,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.upstream.url)
            .context("Invalid upstream CIViC endpoint URL")?;

        let client = Arc::new(
            CivicClient::with_config(ClientConfig {
                endpoint,
                timeout: Duration::from_secs(config.upstream.timeout_secs),
                retry: RetryConfig {
                    max_retries: config.upstream.max_retries,
                    ..Default::default()
                },
                ..Default::default()
            })
            .context("Failed to create CIViC client")?,
        );

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(SearchClinicalEvidenceTool::new(client)));

        Ok(Self {
            service: Arc::new(McpService::new(registry)),
            sessions: SseSessions::new(),
        })
    }
}
