//! Shared utilities for the Yahoo Finance MCP server
//!
//! This crate provides common functionality used across the workspace,
//! including logging setup and configuration helpers.

pub mod config;
pub mod logging;

pub use config::{ConfigError, LogConfig, LogFormat};
pub use logging::init_tracing;
