//! Configuration management utilities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while resolving configuration values
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable referenced but not set
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    /// Invalid pattern error
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Unrecognised enumerated value
    #[error("Invalid value '{value}' for {field}")]
    InvalidValue { field: &'static str, value: String },
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidValue {
                field: "log format",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogConfig {
    /// Default filter directive, used when `RUST_LOG` is unset
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Resolve environment variable references in strings
///
/// Supports `${VAR}` and `$VAR` syntax.
///
/// # Example
///
/// ```
/// # use yfmcp_utils::config::resolve_env_string;
/// let result = resolve_env_string("no references here")?;
/// assert_eq!(result, "no references here");
/// # Ok::<(), yfmcp_utils::config::ConfigError>(())
/// ```
pub fn resolve_env_string(s: &str) -> Result<String, ConfigError> {
    let mut result = s.to_string();

    // Pattern for ${VAR} syntax
    let re_braces = regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;

    for cap in re_braces.captures_iter(s) {
        let var_name = &cap[1];
        let value = std::env::var(var_name)
            .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
        result = result.replace(&cap[0], &value);
    }

    // Pattern for $VAR syntax (without braces)
    let re_simple = regex::Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)")
        .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;

    for cap in re_simple.captures_iter(&result.clone()) {
        let var_name = &cap[1];
        let value = std::env::var(var_name)
            .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
        result = result.replace(&cap[0], &value);
    }

    Ok(result)
}

/// Expand environment references in every string of a JSON document
pub fn resolve_env_value(value: &mut serde_json::Value) -> Result<(), ConfigError> {
    match value {
        serde_json::Value::String(s) => {
            *s = resolve_env_string(s)?;
        }
        serde_json::Value::Array(items) => {
            for item in items {
                resolve_env_value(item)?;
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values_mut() {
                resolve_env_value(item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_env_var_resolution() {
        unsafe {
            std::env::set_var("YFMCP_TEST_VAR", "test_value");
            std::env::set_var("YFMCP_ANOTHER_VAR", "another_value");
        }

        let result = resolve_env_string("${YFMCP_TEST_VAR}").unwrap();
        assert_eq!(result, "test_value");

        let result = resolve_env_string("prefix_${YFMCP_TEST_VAR}_suffix").unwrap();
        assert_eq!(result, "prefix_test_value_suffix");

        let result = resolve_env_string("$YFMCP_TEST_VAR").unwrap();
        assert_eq!(result, "test_value");

        let result = resolve_env_string("${YFMCP_TEST_VAR}_${YFMCP_ANOTHER_VAR}").unwrap();
        assert_eq!(result, "test_value_another_value");
    }

    #[test]
    fn test_missing_env_var() {
        let err = resolve_env_string("${YFMCP_DEFINITELY_NOT_SET_42}").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotFound(name) if name == "YFMCP_DEFINITELY_NOT_SET_42"));
    }

    #[test]
    fn test_resolve_env_value_walks_tree() {
        unsafe {
            std::env::set_var("YFMCP_TEST_HOST", "127.0.0.1");
        }

        let mut value = json!({
            "server": { "host": "${YFMCP_TEST_HOST}", "port": 8000 },
            "tags": ["$YFMCP_TEST_HOST", "plain"]
        });
        resolve_env_value(&mut value).unwrap();

        assert_eq!(value["server"]["host"], "127.0.0.1");
        assert_eq!(value["server"]["port"], 8000);
        assert_eq!(value["tags"][0], "127.0.0.1");
        assert_eq!(value["tags"][1], "plain");
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("TEXT".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("yaml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_log_config_defaults_fill_missing_fields() {
        let config: LogConfig = serde_json::from_value(json!({ "format": "json" })).unwrap();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Json);
    }
}
