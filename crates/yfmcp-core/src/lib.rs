//! Core types for the Yahoo Finance MCP server
//!
//! This crate defines the error type shared by the tool layer and the tagged
//! [`ToolOutcome`] every tool produces.

pub mod error;
pub mod outcome;

pub use error::{Error, Result};
pub use outcome::{ERROR_PREFIX, OutcomeStatus, ToolOutcome};
