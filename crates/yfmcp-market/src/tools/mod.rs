//! Financial lookup tools exposed over MCP

pub mod financials;
pub mod historical;
pub mod news;
pub mod recommendations;
pub mod stock_info;

pub use financials::FinancialStatementTool;
pub use historical::HistoricalPricesTool;
pub use news::StockNewsTool;
pub use recommendations::RecommendationsTool;
pub use stock_info::StockInfoTool;

use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use yfmcp_core::ToolOutcome;
use yfmcp_tools::{Tool, ToolRegistry};

use crate::provider::MarketDataProvider;

/// Every lookup tool, bound to one provider
pub fn all_tools(provider: Arc<dyn MarketDataProvider>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(StockInfoTool::new(provider.clone())),
        Arc::new(HistoricalPricesTool::new(provider.clone())),
        Arc::new(StockNewsTool::new(provider.clone())),
        Arc::new(FinancialStatementTool::new(provider.clone())),
        Arc::new(RecommendationsTool::new(provider)),
    ]
}

/// Register every lookup tool with a registry
pub fn register_all(registry: &ToolRegistry, provider: Arc<dyn MarketDataProvider>) {
    for tool in all_tools(provider) {
        registry.register(tool);
    }
}

fn symbol_property() -> Value {
    json!({
        "type": "string",
        "description": "Stock ticker symbol (e.g., 'AAPL', 'MSFT')"
    })
}

/// Render a payload as the tool's JSON text
fn render<T: Serialize + ?Sized>(value: &T, pretty: bool) -> ToolOutcome {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match rendered {
        Ok(text) => ToolOutcome::Success(text),
        Err(e) => ToolOutcome::failed(e),
    }
}
