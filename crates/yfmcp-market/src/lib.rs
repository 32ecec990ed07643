//! Market-data layer of the Yahoo Finance MCP server
//!
//! This crate provides:
//!
//! - [`MarketDataProvider`], the async seam between tools and data sources
//! - [`YahooProvider`], which talks to Yahoo Finance with a cookie/crumb
//!   session, a request rate limiter and retry with backoff
//! - [`CachedProvider`], an optional TTL cache in front of any provider
//! - the five lookup tools (`get_stock_info`, `get_historical_prices`,
//!   `get_stock_news`, `get_financial_statement`, `get_recommendations`)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use yfmcp_market::{MarketConfig, YahooProvider, tools};
//! use yfmcp_tools::ToolRegistry;
//!
//! let provider = Arc::new(YahooProvider::new(&MarketConfig::default())?);
//! let registry = ToolRegistry::new();
//! tools::register_all(&registry, provider);
//!
//! let outcome = registry
//!     .call("get_stock_info", serde_json::json!({ "symbol": "AAPL" }))
//!     .await?;
//! println!("{}", outcome.legacy_text());
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod retry;
pub mod tools;

pub use api::YahooProvider;
pub use cache::{CacheKey, ResponseCache};
pub use config::{MarketConfig, YahooEndpoints};
pub use error::{MarketError, Result};
pub use models::{
    InfoMap, NewsItem, PriceBar, QuoteInfo, RecommendationRow, StatementKind, StatementTable,
};
pub use provider::{CachedProvider, MarketDataProvider};
pub use retry::RetryPolicy;

use std::sync::Arc;

/// Build the configured provider, wrapping it in a cache when enabled
pub fn build_provider(config: &MarketConfig) -> Result<Arc<dyn MarketDataProvider>> {
    let yahoo = YahooProvider::new(config)?;
    Ok(match config.cache_ttl() {
        Some(ttl) => {
            tracing::info!("Response cache enabled with {}s TTL", ttl.as_secs());
            Arc::new(CachedProvider::new(yahoo, ttl))
        }
        None => Arc::new(yahoo),
    })
}
