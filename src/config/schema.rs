//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every section is `#[serde(default)]` so a minimal (or missing) file works.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Admin endpoints.
    pub admin: AdminConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Human readable service name.
    pub name: String,

    /// Interface to bind.
    pub bind_host: String,

    /// TCP port.
    pub port: u16,

    /// Time allowed to read a request head, e.g. `"15s"` or `"1m30s"`.
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,

    /// Total time allowed for producing a response.
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,

    /// How long shutdown waits for open connections to drain.
    #[serde(with = "humantime_serde")]
    pub graceful_timeout: Duration,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "HelloToolBase Service".to_string(),
            bind_host: "0.0.0.0".to_string(),
            port: 8080,
            read_timeout: DEFAULT_TIMEOUT,
            write_timeout: DEFAULT_TIMEOUT,
            graceful_timeout: DEFAULT_TIMEOUT,
            max_connections: 10_000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human readable or JSON lines.
    pub log_format: LogFormat,

    /// How many recent errors the metrics collector keeps.
    pub error_buffer_size: usize,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            error_buffer_size: 50,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount `/admin/*` routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}
