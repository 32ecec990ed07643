//! Model Context Protocol (MCP) server for the Yahoo Finance tools
//!
//! This crate exposes a [`ToolRegistry`](yfmcp_tools::ToolRegistry) over MCP:
//! - JSON-RPC 2.0 protocol types and version negotiation
//! - a transport-independent dispatcher ([`McpServer`])
//! - stdio, SSE and streamable HTTP transports
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use yfmcp_server::{McpServer, ServerConfig, transport};
//! use yfmcp_tools::ToolRegistry;
//!
//! # async fn example() -> Result<(), yfmcp_server::ServerError> {
//! let config = ServerConfig::default();
//! let registry = Arc::new(ToolRegistry::new());
//! let server = McpServer::new(registry, config.name.clone());
//!
//! transport::serve(server, &config).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod transport;

pub use config::{ServerConfig, Transport};
pub use error::ServerError;
pub use server::McpServer;

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;
