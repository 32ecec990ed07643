//! Yahoo Finance MCP server
//!
//! Exposes Yahoo Finance quotes, price history, news, financial statements
//! and analyst recommendations as MCP tools.
//!
//! # Usage
//!
//! ```bash
//! # SSE on 0.0.0.0:8000 (default)
//! yahoo-finance-mcp
//!
//! # stdio, for clients that spawn the server
//! yahoo-finance-mcp --transport stdio
//!
//! # Streamable HTTP with a five minute response cache
//! yahoo-finance-mcp --transport http --port 9000 --cache-ttl 300
//! ```

mod config;

use anyhow::Context;
use clap::Parser;
use config::{AppConfig, Overrides};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use yfmcp_market::{build_provider, tools};
use yfmcp_server::{McpServer, Transport, transport};
use yfmcp_tools::ToolRegistry;
use yfmcp_utils::{LogFormat, init_tracing};

#[derive(Parser, Debug)]
#[command(name = "yahoo-finance-mcp")]
#[command(version, about = "MCP server for Yahoo Finance market data", long_about = None)]
struct Args {
    /// JSON config file (defaults to ./yfmcp.json when present)
    #[arg(short, long, env = "YFMCP_CONFIG")]
    config: Option<PathBuf>,

    /// Transport: sse, http or stdio
    #[arg(short, long, env = "YFMCP_TRANSPORT")]
    transport: Option<Transport>,

    /// Bind host for HTTP transports
    #[arg(long, env = "YFMCP_HOST")]
    host: Option<String>,

    /// Bind port for HTTP transports
    #[arg(short, long, env = "YFMCP_PORT")]
    port: Option<u16>,

    /// Response cache TTL in seconds (0 disables caching)
    #[arg(long, env = "YFMCP_CACHE_TTL_SECS")]
    cache_ttl: Option<u64>,

    /// Outbound Yahoo requests per minute
    #[arg(long, env = "YFMCP_REQUESTS_PER_MINUTE")]
    requests_per_minute: Option<u32>,

    /// Log format: text or json
    #[arg(long, env = "YFMCP_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            transport: self.transport,
            host: self.host.clone(),
            port: self.port,
            cache_ttl_secs: self.cache_ttl,
            requests_per_minute: self.requests_per_minute,
            log_format: self.log_format,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply(args.overrides());
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.logging);
    info!("Starting {} MCP server", config.server.name);

    let provider = build_provider(&config.market).context("Failed to create market data provider")?;
    let registry = ToolRegistry::new();
    tools::register_all(&registry, provider);
    info!("Registered {} tools", registry.len());

    let server = McpServer::new(Arc::new(registry), config.server.name.clone());
    transport::serve(server, &config.server).await?;

    Ok(())
}
