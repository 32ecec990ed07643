//! Tagged tool results
//!
//! Every lookup ends in one of four outcomes. Clients that predate the tagged
//! form only ever saw a single string, so [`ToolOutcome::legacy_text`] renders
//! the exact strings those clients pattern-match on, while
//! [`ToolOutcome::status`] exposes the tag for clients that want it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix carried by every failure string in the legacy text channel.
pub const ERROR_PREFIX: &str = "Error: ";

/// Outcome tag exposed to structured clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Ok,
    NotFound,
    InvalidArgument,
    Error,
}

impl OutcomeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotFound => "not_found",
            Self::InvalidArgument => "invalid_argument",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// Rendered JSON payload
    Success(String),
    /// The provider returned nothing for the request
    NotFound(String),
    /// A parameter outside its enumerated domain
    InvalidArgument(String),
    /// Provider-level failure; holds the bare message without the prefix
    Failed(String),
}

impl ToolOutcome {
    /// Build a failure outcome from any displayable error
    pub fn failed(err: impl fmt::Display) -> Self {
        Self::Failed(err.to_string())
    }

    pub fn status(&self) -> OutcomeStatus {
        match self {
            Self::Success(_) => OutcomeStatus::Ok,
            Self::NotFound(_) => OutcomeStatus::NotFound,
            Self::InvalidArgument(_) => OutcomeStatus::InvalidArgument,
            Self::Failed(_) => OutcomeStatus::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The single string a legacy client receives
    pub fn legacy_text(&self) -> String {
        match self {
            Self::Success(text) | Self::NotFound(text) | Self::InvalidArgument(text) => {
                text.clone()
            }
            Self::Failed(message) => format!("{ERROR_PREFIX}{message}"),
        }
    }

    /// Human-readable detail for non-success outcomes
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Success(_) => None,
            _ => Some(self.legacy_text()),
        }
    }
}

impl fmt::Display for ToolOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.legacy_text())
    }
}
