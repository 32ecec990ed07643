//! Historical price lookup tool

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;
use yfmcp_core::{Result as CoreResult, ToolOutcome};
use yfmcp_tools::{Tool, parse_params};

use super::{render, symbol_property};
use crate::models::PriceBar;
use crate::provider::MarketDataProvider;

/// Rows returned per call, counted back from the latest bar
pub const MAX_ROWS: usize = 20;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Tool returning recent OHLCV rows for a symbol
pub struct HistoricalPricesTool {
    provider: Arc<dyn MarketDataProvider>,
}

#[derive(Debug, Deserialize)]
struct HistoricalParams {
    symbol: String,
    #[serde(default = "default_period")]
    period: String,
    #[serde(default = "default_interval")]
    interval: String,
}

fn default_period() -> String {
    "1mo".to_string()
}

fn default_interval() -> String {
    "1d".to_string()
}

#[derive(Debug, Serialize)]
struct HistoryRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: Option<f64>,
    #[serde(rename = "High")]
    high: Option<f64>,
    #[serde(rename = "Low")]
    low: Option<f64>,
    #[serde(rename = "Close")]
    close: Option<f64>,
    #[serde(rename = "Adj Close")]
    adj_close: Option<f64>,
    #[serde(rename = "Volume")]
    volume: Option<u64>,
}

impl From<PriceBar> for HistoryRow {
    fn from(bar: PriceBar) -> Self {
        Self {
            date: bar.timestamp.format(DATE_FORMAT).to_string(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            adj_close: bar.adj_close,
            volume: bar.volume,
        }
    }
}

/// Chronological rows, trimmed to the latest [`MAX_ROWS`]
fn recent_rows(mut bars: Vec<PriceBar>) -> Vec<HistoryRow> {
    bars.sort_by_key(|bar| bar.timestamp);
    let skip = bars.len().saturating_sub(MAX_ROWS);
    bars.into_iter().skip(skip).map(HistoryRow::from).collect()
}

impl HistoricalPricesTool {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    async fn lookup(&self, params: &HistoricalParams) -> ToolOutcome {
        debug!(
            "Fetching {} history for {} at {}",
            params.period, params.symbol, params.interval
        );
        match self
            .provider
            .history(&params.symbol, &params.period, &params.interval)
            .await
        {
            Ok(bars) if bars.is_empty() => {
                ToolOutcome::NotFound(format!("No data found for {}", params.symbol))
            }
            Ok(bars) => render(&recent_rows(bars), false),
            Err(e) => ToolOutcome::failed(e),
        }
    }
}

#[async_trait]
impl Tool for HistoricalPricesTool {
    async fn execute(&self, params: Value) -> CoreResult<ToolOutcome> {
        let params: HistoricalParams = parse_params(params)?;
        Ok(self.lookup(&params).await)
    }

    fn name(&self) -> &str {
        "get_historical_prices"
    }

    fn description(&self) -> &str {
        "Get historical OHLCV data. \
         period: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max. \
         interval: 1m, 5m, 15m, 30m, 60m, 1d, 1wk, 1mo"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": symbol_property(),
                "period": {
                    "type": "string",
                    "description": "Time range of the series",
                    "default": "1mo",
                    "examples": ["1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max"]
                },
                "interval": {
                    "type": "string",
                    "description": "Bar size",
                    "default": "1d",
                    "examples": ["1m", "5m", "15m", "30m", "60m", "1d", "1wk", "1mo"]
                }
            },
            "required": ["symbol"]
        })
    }
}
