//! Quote lookup tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;
use yfmcp_core::{Result as CoreResult, ToolOutcome};
use yfmcp_tools::{Tool, parse_params};

use super::{render, symbol_property};
use crate::models::QuoteInfo;
use crate::provider::MarketDataProvider;

/// Tool returning price, valuation and profile fields for a symbol
pub struct StockInfoTool {
    provider: Arc<dyn MarketDataProvider>,
}

#[derive(Debug, Deserialize)]
struct StockInfoParams {
    symbol: String,
}

impl StockInfoTool {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    async fn lookup(&self, symbol: &str) -> ToolOutcome {
        debug!("Fetching quote info for {}", symbol);
        match self.provider.info(symbol).await {
            Ok(info) => render(&QuoteInfo::from_info(symbol, &info), true),
            Err(e) => ToolOutcome::failed(e),
        }
    }
}

#[async_trait]
impl Tool for StockInfoTool {
    async fn execute(&self, params: Value) -> CoreResult<ToolOutcome> {
        let params: StockInfoParams = parse_params(params)?;
        Ok(self.lookup(&params.symbol).await)
    }

    fn name(&self) -> &str {
        "get_stock_info"
    }

    fn description(&self) -> &str {
        "Get comprehensive stock data including price, volume, and company info."
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
