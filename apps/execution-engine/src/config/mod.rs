//! Configuration module for the execution engine.
//!
//! Provides configuration loading, validation, and environment variable
//! interpolation for all execution engine components.
//!
//! # Usage
//!
//! ```rust,ignore
//! use dex_execution_engine::config::load_config;
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Access configuration values
//! println!("HTTP port: {}", config.server.http_port);
//! ```

mod circuit_breaker;
mod environment;
mod execution;
mod fees;
mod health;
mod monitor;
mod observability;
mod providers;
mod risk;
mod server;
mod signer;
mod validation;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use circuit_breaker::CircuitBreakerConfig;
pub use environment::{EnvironmentConfig, TradingMode};
pub use execution::{ExecutionConfig, QuoteTokenConfig};
pub use fees::FeesConfig;
pub use health::HealthConfig;
pub use monitor::MonitorConfig;
pub use observability::{LoggingConfig, MetricsConfig, ObservabilityConfig};
pub use providers::ProviderConfig;
pub use risk::RiskConfig;
pub use server::ServerConfig;
pub use signer::SignerConfig;
pub use validation::{StartupValidation, StartupValidationError, validate_startup_environment};

use crate::application::EngineSettings;
use crate::domain::provider_health::ProviderRole;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Environment configuration.
    #[serde(default)]
    pub environment: EnvironmentConfig,
    /// RPC nodes and quote aggregators.
    #[serde(default = "providers::default_providers")]
    pub providers: Vec<ProviderConfig>,
    /// Health monitor configuration.
    #[serde(default)]
    pub health: HealthConfig,
    /// Circuit breaker configuration.
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    /// Execution configuration.
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Fee estimator configuration.
    #[serde(default)]
    pub fees: FeesConfig,
    /// Risk gate configuration.
    #[serde(default)]
    pub risk: RiskConfig,
    /// Exit monitor configuration.
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Remote signer configuration.
    #[serde(default)]
    pub signer: SignerConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            environment: EnvironmentConfig::default(),
            providers: providers::default_providers(),
            health: HealthConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            execution: ExecutionConfig::default(),
            fees: FeesConfig::default(),
            risk: RiskConfig::default(),
            monitor: MonitorConfig::default(),
            signer: SignerConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    /// Engine tunables derived from the loaded sections.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            selection: self.execution.to_selection_policy(),
            risk: self.risk.to_limits(),
            fees: self.fees.to_policy(),
            fee_cache_ttl: self.fees.cache_ttl(),
            simulate_before_send: self.execution.simulate_before_send,
            execution: self.execution.to_settings(self.monitor.exit_plan()),
            monitor: self.monitor.to_service_config(),
        }
    }

    /// Providers serving `role`, in configuration order.
    pub fn providers_for(&self, role: ProviderRole) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter().filter(move |p| p.role == role)
    }
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.http_port == 0 {
        return Err(invalid("server.http_port must be non-zero"));
    }

    let mut ids = HashSet::new();
    for provider in &config.providers {
        if provider.endpoint.trim().is_empty() {
            return Err(invalid(format!("provider {} has no endpoint", provider.id)));
        }
        if !ids.insert(provider.id.as_str()) {
            return Err(invalid(format!("duplicate provider id: {}", provider.id)));
        }
    }
    for role in [ProviderRole::Rpc, ProviderRole::Quote] {
        if config.providers_for(role).next().is_none() {
            return Err(invalid(format!("at least one {role} provider is required")));
        }
    }

    let health = &config.health;
    if !(health.degraded_success_rate > 0.0
        && health.degraded_success_rate <= health.healthy_success_rate
        && health.healthy_success_rate <= 1.0)
    {
        return Err(invalid(
            "health success rates must satisfy 0 < degraded <= healthy <= 1",
        ));
    }
    if health.window_size == 0 {
        return Err(invalid("health.window_size must be at least 1"));
    }
    if !(0.0..1.0).contains(&health.jitter) {
        return Err(invalid("health.jitter must be in [0, 1)"));
    }

    if config.circuit_breaker.failure_threshold == 0 {
        return Err(invalid("circuit_breaker.failure_threshold must be at least 1"));
    }

    let exec = &config.execution;
    if !(0.0..1.0).contains(&exec.timing_jitter) {
        return Err(invalid("execution.timing_jitter must be in [0, 1)"));
    }
    if exec.slice_concurrency == 0 {
        return Err(invalid("execution.slice_concurrency must be at least 1"));
    }
    if exec.max_slice_attempts == 0 {
        return Err(invalid("execution.max_slice_attempts must be at least 1"));
    }
    if exec.twap_slices == 0 || exec.vwap_slices == 0 {
        return Err(invalid("execution TWAP/VWAP slice counts must be at least 1"));
    }
    if exec.iceberg_min_slices == 0 || exec.iceberg_min_slices > exec.iceberg_max_slices {
        return Err(invalid(
            "execution iceberg slices must satisfy 1 <= min <= max",
        ));
    }
    if exec.immediate_fraction > exec.iceberg_fraction {
        return Err(invalid(
            "execution.immediate_fraction must not exceed iceberg_fraction",
        ));
    }
    if exec.vwap_profile.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(invalid("execution.vwap_profile weights must be non-negative"));
    }

    config
        .monitor
        .exit_plan()
        .validate()
        .map_err(|e| invalid(format!("monitor.default_exit_plan: {e}")))?;
    if config.monitor.tick_interval_ms == 0 {
        return Err(invalid("monitor.tick_interval_ms must be non-zero"));
    }

    config
        .observability
        .metrics
        .to_exporter_config()
        .map_err(|e| invalid(format!("observability.metrics.listen_addr: {e}")))?;

    Ok(())
}
