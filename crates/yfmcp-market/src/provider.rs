//! Market-data provider abstraction

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::future::Future;
use std::time::Duration;

use crate::cache::{CacheKey, ResponseCache};
use crate::error::Result;
use crate::models::{InfoMap, PriceBar, RecommendationRow, StatementKind, StatementTable};

/// Source of quote, price, news, fundamentals and analyst data
///
/// Implementations return provider data in normalized shapes; formatting for
/// clients is left to the tools.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Merged quote and profile fields for a symbol
    async fn info(&self, symbol: &str) -> Result<InfoMap>;

    /// OHLCV bars for a range such as `1mo` at an interval such as `1d`
    async fn history(&self, symbol: &str, period: &str, interval: &str) -> Result<Vec<PriceBar>>;

    /// Raw news items in provider order
    async fn news(&self, symbol: &str) -> Result<Vec<Value>>;

    /// Annual statement of the given kind
    async fn financial_statement(&self, symbol: &str, kind: StatementKind)
    -> Result<StatementTable>;

    /// Analyst recommendation trend in provider order
    async fn recommendations(&self, symbol: &str) -> Result<Vec<RecommendationRow>>;
}

/// Provider decorator that caches successful responses
pub struct CachedProvider<P> {
    inner: P,
    cache: ResponseCache,
}

impl<P: MarketDataProvider> CachedProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            cache: ResponseCache::new(ttl),
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    async fn cached<T, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let value = self
            .cache
            .get_or_fetch(key, || async {
                let fetched = fetch().await?;
                Ok::<_, crate::error::MarketError>(serde_json::to_value(fetched)?)
            })
            .await?;

        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    async fn info(&self, symbol: &str) -> Result<InfoMap> {
        self.cached(CacheKey::new(symbol, "info", json!({})), || {
            self.inner.info(symbol)
        })
        .await
    }

    async fn history(&self, symbol: &str, period: &str, interval: &str) -> Result<Vec<PriceBar>> {
        let key = CacheKey::new(
            symbol,
            "history",
            json!({ "period": period, "interval": interval }),
        );
        self.cached(key, || self.inner.history(symbol, period, interval))
            .await
    }

    async fn news(&self, symbol: &str) -> Result<Vec<Value>> {
        self.cached(CacheKey::new(symbol, "news", json!({})), || {
            self.inner.news(symbol)
        })
        .await
    }

    async fn financial_statement(
        &self,
        symbol: &str,
        kind: StatementKind,
    ) -> Result<StatementTable> {
        let key = CacheKey::new(symbol, "financial_statement", json!({ "kind": kind }));
        self.cached(key, || self.inner.financial_statement(symbol, kind))
            .await
    }

    async fn recommendations(&self, symbol: &str) -> Result<Vec<RecommendationRow>> {
        self.cached(CacheKey::new(symbol, "recommendations", json!({})), || {
            self.inner.recommendations(symbol)
        })
        .await
    }
}
