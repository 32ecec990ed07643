//! Financial statement lookup tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;
use yfmcp_core::{Result as CoreResult, ToolOutcome};
use yfmcp_tools::{Tool, parse_params};

use super::{render, symbol_property};
use crate::models::StatementKind;
use crate::provider::MarketDataProvider;

/// Line items returned per call
pub const MAX_ROWS: usize = 10;

pub const INVALID_STATEMENT_TYPE: &str =
    "Invalid statement_type. Use: income, balance, or cashflow";

/// Tool returning annual income, balance sheet or cash flow statements
pub struct FinancialStatementTool {
    provider: Arc<dyn MarketDataProvider>,
}

#[derive(Debug, Deserialize)]
struct StatementParams {
    symbol: String,
    #[serde(default = "default_statement_type")]
    statement_type: String,
}

fn default_statement_type() -> String {
    StatementKind::Income.to_string()
}

impl FinancialStatementTool {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    async fn lookup(&self, params: &StatementParams) -> ToolOutcome {
        let Ok(kind) = params.statement_type.parse::<StatementKind>() else {
            return ToolOutcome::InvalidArgument(INVALID_STATEMENT_TYPE.to_string());
        };

        debug!("Fetching {} statement for {}", kind, params.symbol);
        match self.provider.financial_statement(&params.symbol, kind).await {
            Ok(table) if table.is_empty() => ToolOutcome::NotFound(format!(
                "No {} data for {}",
                params.statement_type, params.symbol
            )),
            Ok(table) => render(&table.head(MAX_ROWS).indexed(), true),
            Err(e) => ToolOutcome::failed(e),
        }
    }
}

#[async_trait]
impl Tool for FinancialStatementTool {
    async fn execute(&self, params: Value) -> CoreResult<ToolOutcome> {
        let params: StatementParams = parse_params(params)?;
        Ok(self.lookup(&params).await)
    }

    fn name(&self) -> &str {
        "get_financial_statement"
    }

    fn description(&self) -> &str {
        "Get financial statements. statement_type: income, balance, cashflow"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": symbol_property(),
                "statement_type": {
                    "type": "string",
                    "description": "Statement to fetch",
                    "enum": ["income", "balance", "cashflow"],
                    "default": "income"
                }
            },
            "required": ["symbol"]
        })
    }
}
