//! Layered application configuration
//!
//! Precedence, later wins: built-in defaults, the JSON config file, then
//! `YFMCP_*` environment variables and command-line flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use yfmcp_market::MarketConfig;
use yfmcp_server::{ServerConfig, Transport};
use yfmcp_utils::config::resolve_env_value;
use yfmcp_utils::{LogConfig, LogFormat};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "yfmcp.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub market: MarketConfig,
    pub logging: LogConfig,
}

/// Settings supplied through flags or their environment variables
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub transport: Option<Transport>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cache_ttl_secs: Option<u64>,
    pub requests_per_minute: Option<u32>,
    pub log_format: Option<LogFormat>,
}

impl AppConfig {
    /// Load a config file, expanding `${VAR}` references in its strings
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let mut document: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        resolve_env_value(&mut document)?;

        serde_json::from_value(document)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Load the explicit file, else `yfmcp.json` when present, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Apply flag and environment overrides on top of the file values
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(transport) = overrides.transport {
            self.server.transport = transport;
        }
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(ttl) = overrides.cache_ttl_secs {
            self.market.cache_ttl_secs = ttl;
        }
        if let Some(rpm) = overrides.requests_per_minute {
            self.market.requests_per_minute = rpm;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.market.validate()?;
        Ok(())
    }
}
