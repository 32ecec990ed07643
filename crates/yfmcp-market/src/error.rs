//! Error types for market-data operations

use thiserror::Error;

/// Market-data specific errors
#[derive(Debug, Error)]
pub enum MarketError {
    /// Network or HTTP transport error
    #[error("{0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status without a provider error description
    #[error("HTTP {status} from {endpoint}")]
    HttpStatus { status: u16, endpoint: String },

    /// Error description reported by the provider itself
    #[error("{0}")]
    Provider(String),

    /// Error from the chart client
    #[error("Yahoo Finance error: {0}")]
    YahooFinance(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Crumb or cookie negotiation failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Rate limit exceeded for API
    #[error("Rate limit exceeded for {provider}")]
    RateLimited { provider: String },

    /// Response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MarketError {
    pub fn http_status(status: u16, endpoint: &str) -> Self {
        Self::HttpStatus {
            status,
            endpoint: endpoint.to_string(),
        }
    }

    /// Whether a retry has a reasonable chance of succeeding
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the session crumb should be discarded before retrying
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::HttpStatus { status: 401 | 403 | 429, .. })
    }
}

/// Result type alias for market-data operations
pub type Result<T> = std::result::Result<T, MarketError>;

impl From<yahoo_finance_api::YahooError> for MarketError {
    fn from(err: yahoo_finance_api::YahooError) -> Self {
        use yahoo_finance_api::YahooError;
        match err {
            YahooError::ConnectionFailed(e) => Self::Network(e),
            YahooError::TooManyRequests(_) => Self::RateLimited {
                provider: "Yahoo Finance".to_string(),
            },
            other => Self::YahooFinance(other.to_string()),
        }
    }
}

impl From<MarketError> for yfmcp_core::Error {
    fn from(err: MarketError) -> Self {
        yfmcp_core::Error::ProcessingFailed(err.to_string())
    }
}
