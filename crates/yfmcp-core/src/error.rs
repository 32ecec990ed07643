//! Error types for yfmcp-core

use thiserror::Error;

/// Result type alias for yfmcp-core
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that cross the tool boundary as protocol faults.
///
/// Data-level failures (provider errors, empty results) are *not* represented
/// here; they travel inside [`crate::ToolOutcome`] as normal tool results.
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// Tool arguments could not be deserialized
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// No tool registered under the requested name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool processing failed outside the outcome channel
    #[error("Tool processing failed: {0}")]
    ProcessingFailed(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidParams(err.to_string())
    }
}
