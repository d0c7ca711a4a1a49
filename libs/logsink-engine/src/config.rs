use std::time::Duration;

use serde::Deserialize;

use crate::error::IngestError;

/// Root configuration — parsed from TOML. Every table is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub listener: ListenerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-connection frame deadline; 0 or absent disables it.
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    5140
}

fn default_drain_timeout_ms() -> u64 {
    5000
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            read_timeout_ms: None,
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

impl ListenerConfig {
    /// `host:port` for binding.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Backend name: `memory` or `file`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Backend-specific table, handed to the backend factory as JSON.
    #[serde(default)]
    pub config: Option<toml::Value>,
}

fn default_backend() -> String {
    "memory".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            config: None,
        }
    }
}

impl StoreConfig {
    /// Serialize the backend table to JSON (or `"{}"`).
    pub fn config_json(&self) -> Result<String, IngestError> {
        match &self.config {
            Some(v) => serde_json::to_string(v)
                .map_err(|e| IngestError::Config(format!("store.config: {e}"))),
            None => Ok("{}".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"info,logsink_engine=debug"`.
    /// `RUST_LOG` takes precedence.
    #[serde(default)]
    pub filter: Option<String>,
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, IngestError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| IngestError::Config(format!("{path}: {e}")))?;
        Self::parse(&content).map_err(|e| match e {
            IngestError::Config(msg) => IngestError::Config(format!("{path}: {msg}")),
            other => other,
        })
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, IngestError> {
        toml::from_str(toml_str).map_err(|e| IngestError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = ServerConfig::parse("").unwrap();
        assert_eq!(config.listener.addr(), "127.0.0.1:5140");
        assert_eq!(config.listener.read_timeout(), None);
        assert_eq!(config.listener.drain_timeout(), Duration::from_secs(5));
        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.store.config_json().unwrap(), "{}");
        assert!(config.logging.filter.is_none());
    }

    #[test]
    fn parses_full_config() {
        let config = ServerConfig::parse(
            r#"
            [listener]
            host = "0.0.0.0"
            port = 9000
            read_timeout_ms = 2500

            [store]
            backend = "file"
            [store.config]
            data_dir = "./data"
            database = "logs"

            [logging]
            filter = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.addr(), "0.0.0.0:9000");
        assert_eq!(config.listener.read_timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(config.store.backend, "file");
        let json: serde_json::Value = serde_json::from_str(&config.store.config_json().unwrap()).unwrap();
        assert_eq!(json["data_dir"], "./data");
        assert_eq!(json["database"], "logs");
        assert_eq!(config.logging.filter.as_deref(), Some("debug"));
    }

    #[test]
    fn zero_read_timeout_means_disabled() {
        let config = ServerConfig::parse("[listener]\nread_timeout_ms = 0\n").unwrap();
        assert_eq!(config.listener.read_timeout(), None);
    }

    #[test]
    fn bad_toml_is_config_error() {
        assert!(matches!(
            ServerConfig::parse("[listener]\nport = \"x\""),
            Err(IngestError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = ServerConfig::load("/nonexistent/logsink.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/logsink.toml"));
    }
}
