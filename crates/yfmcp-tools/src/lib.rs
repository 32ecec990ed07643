//! Tool management and execution framework for the Yahoo Finance MCP server
//!
//! This crate provides a framework for defining tools and dispatching calls to
//! them by name.

pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::{Tool, parse_params};
