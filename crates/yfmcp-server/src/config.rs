//! Server configuration

use crate::error::ServerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Wire transport the server listens on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// `GET /sse` event stream plus `POST /messages/`
    #[default]
    Sse,
    /// Streamable HTTP on `POST /mcp`
    Http,
    /// Newline-delimited JSON on stdin/stdout
    Stdio,
}

impl FromStr for Transport {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sse" => Ok(Self::Sse),
            "http" | "streamable-http" => Ok(Self::Http),
            "stdio" => Ok(Self::Stdio),
            other => Err(ServerError::Config(format!(
                "unknown transport '{other}', expected one of: sse, http, stdio"
            ))),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sse => "sse",
            Self::Http => "http",
            Self::Stdio => "stdio",
        })
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Name reported in `serverInfo`
    pub name: String,
    pub host: String,
    pub port: u16,
    pub transport: Transport,
    /// Path of the SSE event stream
    pub sse_path: String,
    /// Path clients POST messages to in SSE mode
    pub message_path: String,
    /// Interval between SSE keep-alive comments
    pub keep_alive_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "Yahoo Finance".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            transport: Transport::Sse,
            sse_path: "/sse".to_string(),
            message_path: "/messages/".to_string(),
            keep_alive_secs: 15,
        }
    }
}

impl ServerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.port == 0 {
            return Err(ServerError::Config("port must be greater than 0".to_string()));
        }

        for (field, path) in [("ssePath", &self.sse_path), ("messagePath", &self.message_path)] {
            if !path.starts_with('/') {
                return Err(ServerError::Config(format!(
                    "{field} must start with '/', got '{path}'"
                )));
            }
        }

        if self.sse_path == self.message_path {
            return Err(ServerError::Config(
                "ssePath and messagePath must differ".to_string(),
            ));
        }

        if self.keep_alive_secs == 0 {
            return Err(ServerError::Config(
                "keepAliveSecs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.transport, Transport::Sse);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_transport_parsing() {
        assert_eq!("sse".parse::<Transport>().unwrap(), Transport::Sse);
        assert_eq!("HTTP".parse::<Transport>().unwrap(), Transport::Http);
        assert_eq!("stdio".parse::<Transport>().unwrap(), Transport::Stdio);
        assert!("websocket".parse::<Transport>().is_err());
        assert_eq!(Transport::Http.to_string(), "http");
    }

    #[test]
    fn test_validation() {
        let config = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            message_path: "messages".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_document() {
        let config: ServerConfig =
            serde_json::from_value(json!({ "port": 9000, "transport": "stdio" })).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.transport, Transport::Stdio);
        assert_eq!(config.host, "0.0.0.0");

        let bad = serde_json::from_value::<ServerConfig>(json!({ "transport": "carrier-pigeon" }));
        assert!(bad.is_err());
    }
}
