//! Analyst recommendations lookup tool

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;
use yfmcp_core::{Result as CoreResult, ToolOutcome};
use yfmcp_tools::{Tool, parse_params};

use super::{render, symbol_property};
use crate::models::RecommendationRow;
use crate::provider::MarketDataProvider;

/// Rows returned per call, counted back from the last period
pub const MAX_ROWS: usize = 10;

/// Tool returning analyst buy/hold/sell counts for a symbol
pub struct RecommendationsTool {
    provider: Arc<dyn MarketDataProvider>,
}

#[derive(Debug, Deserialize)]
struct RecommendationParams {
    symbol: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationRecord<'a> {
    index: usize,
    period: Option<&'a str>,
    strong_buy: Option<i64>,
    buy: Option<i64>,
    hold: Option<i64>,
    sell: Option<i64>,
    strong_sell: Option<i64>,
    #[serde(rename = "Date")]
    date: &'a str,
}

/// Positionally indexed records for the last [`MAX_ROWS`] rows
fn records(rows: &[RecommendationRow]) -> Vec<RecommendationRecord<'_>> {
    let skip = rows.len().saturating_sub(MAX_ROWS);
    rows.iter()
        .enumerate()
        .skip(skip)
        .map(|(index, row)| RecommendationRecord {
            index,
            period: row.period.as_deref(),
            strong_buy: row.strong_buy,
            buy: row.buy,
            hold: row.hold,
            sell: row.sell,
            strong_sell: row.strong_sell,
            date: row.date.as_deref().unwrap_or_default(),
        })
        .collect()
}

impl RecommendationsTool {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    async fn lookup(&self, symbol: &str) -> ToolOutcome {
        debug!("Fetching recommendations for {}", symbol);
        match self.provider.recommendations(symbol).await {
            Ok(rows) if rows.is_empty() => {
                ToolOutcome::NotFound(format!("No recommendations for {symbol}"))
            }
            Ok(rows) => render(&records(&rows), false),
            Err(e) => ToolOutcome::failed(e),
        }
    }
}

#[async_trait]
impl Tool for RecommendationsTool {
    async fn execute(&self, params: Value) -> CoreResult<ToolOutcome> {
        let params: RecommendationParams = parse_params(params)?;
        Ok(self.lookup(&params.symbol).await)
    }

    fn name(&self) -> &str {
        "get_recommendations"
    }

    fn description(&self) -> &str {
        "Get analyst recommendations."
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
