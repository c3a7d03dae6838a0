//! Observability configuration for logging and metrics.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use super::execution::default_true;
use crate::observability::{LogFormat, TracingConfig};

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObservabilityConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Prometheus exporter.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: `json` or `pretty`.
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Include span information.
    #[serde(default = "default_true")]
    pub include_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            include_spans: true,
        }
    }
}

impl LoggingConfig {
    /// Subscriber settings.
    #[must_use]
    pub fn to_tracing_config(&self) -> TracingConfig {
        TracingConfig {
            default_filter: self.level.clone(),
            format: LogFormat::parse(&self.format),
            ..TracingConfig::default()
        }
    }
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Start the exporter.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Scrape endpoint address.
    #[serde(default = "default_metrics_addr")]
    pub listen_addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: default_metrics_addr(),
        }
    }
}

impl MetricsConfig {
    /// Exporter settings; `None` when disabled.
    ///
    /// # Errors
    ///
    /// Returns error if `listen_addr` is not a socket address.
    pub fn to_exporter_config(
        &self,
    ) -> Result<Option<crate::observability::MetricsConfig>, std::net::AddrParseError> {
        if !self.enabled {
            return Ok(None);
        }
        let addr: SocketAddr = self.listen_addr.parse()?;
        Ok(Some(crate::observability::MetricsConfig::with_addr(addr)))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}
