use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod api;
mod config;
mod sse;

use config::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "nexonco")]
#[command(about = "Nexonco - Clinical Evidence MCP Server for Precision Oncology", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "nexonco.toml")]
    config: PathBuf,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Override the upstream CIViC GraphQL endpoint
    #[arg(long, env = "CIVIC_URL")]
    civic_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nexonco=info,tower_http=debug".into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    tracing::info!("Starting Nexonco MCP HTTP server");

    // Load configuration
    let mut config = ServerConfig::load(&args.config)?;
    if let Some(civic_url) = args.civic_url {
        config.upstream.url = civic_url;
    }

    let addr = format!("{}:{}", args.host, args.port);
    tracing::info!("MCP endpoint available at: http://{}/mcp", addr);

    api::serve(&addr, config).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_host_and_port() {
        let args = Args::try_parse_from(["nexonco"]).unwrap();
        assert_eq!(args.port, 8080);
        assert_eq!(args.host, "0.0.0.0");
        assert!(args.civic_url.is_none());
    }

    #[test]
    fn test_port_flag_overrides_default() {
        let args = Args::try_parse_from(["nexonco", "--port", "8081"]).unwrap();
        assert_eq!(args.port, 8081);
    }
}
