//! Configuration for the market-data provider

use crate::error::{MarketError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Browser user agent sent with every Yahoo request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Base URLs of the Yahoo services the provider talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct YahooEndpoints {
    /// Primary query host
    pub query1: String,
    /// Secondary query host, used for quote summaries and fundamentals
    pub query2: String,
    /// Finance site host, serves the news stream
    pub finance: String,
    /// Page visited to obtain session cookies
    pub cookie: String,
}

impl Default for YahooEndpoints {
    fn default() -> Self {
        Self {
            query1: "https://query1.finance.yahoo.com".to_string(),
            query2: "https://query2.finance.yahoo.com".to_string(),
            finance: "https://finance.yahoo.com".to_string(),
            cookie: "https://fc.yahoo.com".to_string(),
        }
    }
}

impl YahooEndpoints {
    /// Point every endpoint at one base URL
    pub fn single_host(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            query1: base.clone(),
            query2: base.clone(),
            finance: base.clone(),
            cookie: base,
        }
    }
}

/// Configuration for market-data operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketConfig {
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Outbound request budget
    pub requests_per_minute: u32,

    /// Response cache lifetime in seconds; 0 disables caching
    pub cache_ttl_secs: u64,

    /// Session crumb lifetime in seconds
    pub crumb_ttl_secs: u64,

    /// Maximum number of attempts for transient failures
    pub max_retries: u32,

    /// Initial backoff between attempts in milliseconds
    pub retry_backoff_ms: u64,

    /// User agent presented to Yahoo
    pub user_agent: String,

    /// Service base URLs
    pub endpoints: YahooEndpoints,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            requests_per_minute: 60,
            cache_ttl_secs: 0,
            crumb_ttl_secs: 3600,
            max_retries: 3,
            retry_backoff_ms: 200,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            endpoints: YahooEndpoints::default(),
        }
    }
}

impl MarketConfig {
    /// Create a new configuration builder
    pub fn builder() -> MarketConfigBuilder {
        MarketConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.requests_per_minute == 0 {
            return Err(MarketError::Config(
                "requestsPerMinute must be greater than 0".to_string(),
            ));
        }

        if self.max_retries == 0 {
            return Err(MarketError::Config(
                "maxRetries must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(MarketError::Config(
                "requestTimeoutSecs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn crumb_ttl(&self) -> Duration {
        Duration::from_secs(self.crumb_ttl_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Cache lifetime, or `None` when caching is disabled
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }
}

/// Builder for MarketConfig
#[derive(Debug, Default)]
pub struct MarketConfigBuilder {
    request_timeout_secs: Option<u64>,
    requests_per_minute: Option<u32>,
    cache_ttl_secs: Option<u64>,
    crumb_ttl_secs: Option<u64>,
    max_retries: Option<u32>,
    retry_backoff_ms: Option<u64>,
    user_agent: Option<String>,
    endpoints: Option<YahooEndpoints>,
}

impl MarketConfigBuilder {
    /// Set request timeout
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Set the outbound request budget
    pub fn requests_per_minute(mut self, rpm: u32) -> Self {
        self.requests_per_minute = Some(rpm);
        self
    }

    /// Set response cache lifetime
    pub fn cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = Some(secs);
        self
    }

    /// Set session crumb lifetime
    pub fn crumb_ttl_secs(mut self, secs: u64) -> Self {
        self.crumb_ttl_secs = Some(secs);
        self
    }

    /// Set maximum retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set initial retry backoff
    pub fn retry_backoff_ms(mut self, millis: u64) -> Self {
        self.retry_backoff_ms = Some(millis);
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set service base URLs
    pub fn endpoints(mut self, endpoints: YahooEndpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<MarketConfig> {
        let defaults = MarketConfig::default();

        let config = MarketConfig {
            request_timeout_secs: self
                .request_timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
            requests_per_minute: self
                .requests_per_minute
                .unwrap_or(defaults.requests_per_minute),
            cache_ttl_secs: self.cache_ttl_secs.unwrap_or(defaults.cache_ttl_secs),
            crumb_ttl_secs: self.crumb_ttl_secs.unwrap_or(defaults.crumb_ttl_secs),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_backoff_ms: self.retry_backoff_ms.unwrap_or(defaults.retry_backoff_ms),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            endpoints: self.endpoints.unwrap_or(defaults.endpoints),
        };

        config.validate()?;
        Ok(config)
    }
}
