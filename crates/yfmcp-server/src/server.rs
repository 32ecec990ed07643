//! MCP request dispatcher
//!
//! Transport-independent: every transport hands raw JSON text to
//! [`McpServer::handle_message`] and forwards whatever response comes back.

use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use yfmcp_core::Error as CoreError;
use yfmcp_tools::ToolRegistry;

use crate::protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, InitializeParams, InitializeResult,
    JSONRPC_VERSION, JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND, PARSE_ERROR,
    ServerCapabilities, ServerInfo, ToolCallParams, ToolCallResult, ToolDefinition,
    ToolsCapability, ToolsListResult, negotiate_protocol_version,
};

const DEFAULT_INSTRUCTIONS: &str = "Yahoo Finance market data. Use get_stock_info for a quote \
     summary, get_historical_prices for OHLCV rows, get_stock_news for headlines, \
     get_financial_statement for annual statements and get_recommendations for analyst trends.";

/// MCP server bound to a tool registry
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    info: ServerInfo,
    instructions: Option<String>,
}

impl McpServer {
    pub fn new(registry: Arc<ToolRegistry>, name: impl Into<String>) -> Self {
        Self {
            registry,
            info: ServerInfo {
                name: name.into(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(DEFAULT_INSTRUCTIONS.to_string()),
        }
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Handle one raw JSON-RPC message
    ///
    /// Returns `None` for notifications and for responses sent by the client.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Unparsable message: {}", e);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {e}"),
                ));
            }
        };
        self.handle_value(value).await
    }

    /// Handle one decoded JSON-RPC message
    pub async fn handle_value(&self, value: Value) -> Option<JsonRpcResponse> {
        let Some(object) = value.as_object() else {
            return Some(JsonRpcResponse::error(
                Value::Null,
                INVALID_REQUEST,
                "Invalid request: expected a JSON object",
            ));
        };

        // Replies to server-initiated requests; nothing to answer
        if !object.contains_key("method")
            && (object.contains_key("result") || object.contains_key("error"))
        {
            debug!("Ignoring client response message");
            return None;
        }

        let id = object.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    id,
                    INVALID_REQUEST,
                    format!("Invalid request: {e}"),
                ));
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid request: unsupported jsonrpc version '{}'", request.jsonrpc),
            ));
        }

        if request.is_notification() {
            debug!("Notification: {}", request.method);
            return None;
        }

        debug!("Request {}: {}", id, request.method);
        Some(self.dispatch(id, request).await)
    }

    async fn dispatch(&self, id: Value, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => self.initialize(id, request.params),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.list_tools(id),
            "tools/call" => self.call_tool(id, request.params).await,
            other => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            ),
        }
    }

    fn initialize(&self, id: Value, params: Value) -> JsonRpcResponse {
        let params: InitializeParams = serde_json::from_value(params).unwrap_or_default();
        let version = negotiate_protocol_version(params.protocol_version.as_deref());

        if let Some(client) = &params.client_info {
            info!(
                client = %client.name,
                client_version = %client.version,
                protocol = version,
                "Client initialized"
            );
        }

        to_response(
            id,
            &InitializeResult {
                protocol_version: version.to_string(),
                capabilities: ServerCapabilities {
                    tools: ToolsCapability {
                        list_changed: false,
                    },
                },
                server_info: self.info.clone(),
                instructions: self.instructions.clone(),
            },
        )
    }

    fn list_tools(&self, id: Value) -> JsonRpcResponse {
        let tools = self
            .registry
            .list_tools()
            .iter()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            })
            .collect();

        to_response(id, &ToolsListResult { tools })
    }

    async fn call_tool(&self, id: Value, params: Value) -> JsonRpcResponse {
        if !params.is_object() {
            return JsonRpcResponse::error(
                id,
                INVALID_PARAMS,
                "Invalid params: tools/call expects an object",
            );
        }

        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {e}"));
            }
        };

        debug!("Calling tool: {}", params.name);
        let result = match self.registry.call(&params.name, params.arguments).await {
            Ok(outcome) => ToolCallResult::from_outcome(&outcome),
            Err(e @ (CoreError::UnknownTool(_) | CoreError::InvalidParams(_))) => {
                warn!("Tool call {} rejected: {}", params.name, e);
                ToolCallResult::error(e.to_string())
            }
            Err(e) => {
                error!("Tool call {} failed: {}", params.name, e);
                ToolCallResult::error(e.to_string())
            }
        };

        to_response(id, &result)
    }
}

fn to_response<T: Serialize>(id: Value, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Serialization error: {e}")),
    }
}
