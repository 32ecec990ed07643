//! News lookup tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;
use yfmcp_core::{Result as CoreResult, ToolOutcome};
use yfmcp_tools::{Tool, parse_params};

use super::{render, symbol_property};
use crate::models::NewsItem;
use crate::provider::MarketDataProvider;

/// Headlines returned per call
pub const MAX_ITEMS: usize = 5;

/// Tool returning the latest headlines for a symbol
pub struct StockNewsTool {
    provider: Arc<dyn MarketDataProvider>,
}

#[derive(Debug, Deserialize)]
struct NewsParams {
    symbol: String,
}

impl StockNewsTool {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    async fn lookup(&self, symbol: &str) -> ToolOutcome {
        debug!("Fetching news for {}", symbol);
        match self.provider.news(symbol).await {
            Ok(items) if items.is_empty() => {
                ToolOutcome::NotFound(format!("No news found for {symbol}"))
            }
            Ok(items) => {
                let articles: Vec<NewsItem> = items
                    .iter()
                    .take(MAX_ITEMS)
                    .map(NewsItem::from_provider)
                    .collect();
                render(&articles, true)
            }
            Err(e) => ToolOutcome::failed(e),
        }
    }
}

#[async_trait]
impl Tool for StockNewsTool {
    async fn execute(&self, params: Value) -> CoreResult<ToolOutcome> {
        let params: NewsParams = parse_params(params)?;
        Ok(self.lookup(&params.symbol).await)
    }

    fn name(&self) -> &str {
        "get_stock_news"
    }

    fn description(&self) -> &str {
        "Get latest news articles for a stock."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": symbol_property()
            },
            "required": ["symbol"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MarketError;
    use crate::provider::MockMarketDataProvider;

    #[tokio::test]
    async fn test_at_most_five_items_with_string_fields() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_news().returning(|_| {
            Ok((0..8)
                .map(|i| {
                    if i % 2 == 0 {
                        json!({"content": {"title": format!("Story {i}")}})
                    } else {
                        json!({"title": format!("Story {i}"), "publisher": "AP"})
                    }
                })
                .collect())
        });

        let tool = StockNewsTool::new(Arc::new(mock));
        let outcome = tool.execute(json!({ "symbol": "AAPL" })).await.unwrap();
        let items: Vec<Value> = serde_json::from_str(&outcome.legacy_text()).unwrap();

        assert_eq!(items.len(), MAX_ITEMS);
        for item in &items {
            assert!(item["title"].is_string());
            assert!(item["publisher"].is_string());
            assert!(item["link"].is_string());
        }
        assert_eq!(items[0]["title"], "Story 0");
        assert_eq!(items[0]["publisher"], "Unknown");
        assert_eq!(items[1]["publisher"], "AP");
    }

    #[tokio::test]
    async fn test_no_news() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_news().returning(|_| Ok(Vec::new()));

        let tool = StockNewsTool::new(Arc::new(mock));
        let outcome = tool.execute(json!({ "symbol": "tsla" })).await.unwrap();
        assert_eq!(outcome.legacy_text(), "No news found for tsla");
    }

    #[tokio::test]
    async fn test_failure_is_error_text() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_news()
            .returning(|_| Err(MarketError::Auth("no crumb".to_string())));

        let tool = StockNewsTool::new(Arc::new(mock));
        let outcome = tool.execute(json!({ "symbol": "AAPL" })).await.unwrap();
        assert_eq!(outcome.legacy_text(), "Error: Authentication failed: no crumb");
    }
}
