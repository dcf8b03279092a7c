//! Application configuration loaded from environment variables.

use std::str::FromStr;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::Invalid {
                key: "LOG_FORMAT",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` bind address (default: `"0.0.0.0"`)
/// - `PORT` listen port (default: `3000`)
/// - `RUST_LOG` tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` `text` or `json` (default: `text`)
/// - `DATABASE_URL` PostgreSQL URL; in-memory gateway and sink when unset
/// - `DATABASE_MAX_CONNECTIONS` pool size (default: `5`)
/// - `STREAM_NAME` stream receiving completion events (default: `"work_orders_stream"`)
/// - `CORS_ALLOWED_ORIGIN` single allowed origin; any origin when unset
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub stream_name: String,
    pub cors_allowed_origin: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: p,
            })?,
            None => defaults.port,
        };

        let database_max_connections = match non_empty("DATABASE_MAX_CONNECTIONS") {
            Some(n) => n.parse().map_err(|_| ConfigError::Invalid {
                key: "DATABASE_MAX_CONNECTIONS",
                value: n,
            })?,
            None => defaults.database_max_connections,
        };

        let log_format = match non_empty("LOG_FORMAT") {
            Some(f) => f.parse()?,
            None => defaults.log_format,
        };

        Ok(Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port,
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            log_format,
            database_url: non_empty("DATABASE_URL"),
            database_max_connections,
            stream_name: non_empty("STREAM_NAME").unwrap_or(defaults.stream_name),
            cors_allowed_origin: non_empty("CORS_ALLOWED_ORIGIN"),
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            database_max_connections: 5,
            stream_name: domain::DEFAULT_STREAM_NAME.to_string(),
            cors_allowed_origin: None,
        }
    }
}
