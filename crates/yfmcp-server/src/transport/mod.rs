//! Wire transports for the MCP server

pub mod http;
pub mod stdio;

use crate::config::{ServerConfig, Transport};
use crate::error::ServerError;
use crate::server::McpServer;
use std::sync::Arc;

pub use http::{router, serve_http};
pub use stdio::{serve_lines, serve_stdio};

/// Run `server` on the transport selected in `config`
pub async fn serve(server: McpServer, config: &ServerConfig) -> Result<(), ServerError> {
    match config.transport {
        Transport::Stdio => serve_stdio(&server).await,
        Transport::Sse | Transport::Http => serve_http(Arc::new(server), config).await,
    }
}
