//! Prometheus metrics for the execution engine.
//!
//! Covers provider health, circuit breakers, order and slice outcomes, risk
//! denials and the position monitor. Every function is a no-op until a
//! recorder is installed, so tests need no setup.
//!
//! # Example
//!
//! ```ignore
//! use dex_execution_engine::observability::{init_metrics, MetricsConfig};
//!
//! init_metrics(&MetricsConfig::default())?;
//! record_order_completed("twap", "FILLED", 12.5);
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for latency measurements (in seconds).
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 9090),
            // 5ms to 5 minutes; order durations span the TWAP window
            latency_buckets: vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0,
            ],
        }
    }
}

impl MetricsConfig {
    /// Create a new metrics configuration with custom address.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
///
/// # Errors
///
/// Returns an error if the metrics exporter fails to start (e.g., port already in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.latency_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// Provider Metrics
// ============================================================================

/// Record one probe or routed call against a provider.
pub fn record_provider_call(provider: &str, role: &str, success: bool, latency: Duration) {
    counter!(
        "provider_calls_total",
        "provider" => provider.to_string(),
        "role" => role.to_string(),
        "outcome" => if success { "success" } else { "failure" }
    )
    .increment(1);

    histogram!(
        "provider_latency_seconds",
        "provider" => provider.to_string(),
        "role" => role.to_string()
    )
    .record(latency.as_secs_f64());
}

/// Provider status gauge values.
pub mod provider_status {
    /// Healthy.
    pub const HEALTHY: f64 = 0.0;
    /// Degraded.
    pub const DEGRADED: f64 = 1.0;
    /// Unhealthy.
    pub const UNHEALTHY: f64 = 2.0;
}

/// Update the provider status gauge (see [`provider_status`]).
pub fn set_provider_status(provider: &str, role: &str, status: f64) {
    gauge!(
        "provider_status",
        "provider" => provider.to_string(),
        "role" => role.to_string()
    )
    .set(status);
}

/// Record a failover from one candidate to the next.
pub fn record_failover(role: &str, from_provider: &str) {
    counter!(
        "provider_failovers_total",
        "role" => role.to_string(),
        "from" => from_provider.to_string()
    )
    .increment(1);
}

// ============================================================================
// Circuit Breaker Metrics
// ============================================================================

/// Circuit breaker state values for the gauge.
pub mod circuit_breaker_state {
    /// Circuit is closed (healthy).
    pub const CLOSED: f64 = 0.0;
    /// Circuit is open (failing).
    pub const OPEN: f64 = 1.0;
    /// Circuit is half-open (probing).
    pub const HALF_OPEN: f64 = 2.0;
}

/// Update circuit breaker state gauge.
pub fn record_circuit_breaker_state(key: &str, state: f64) {
    gauge!("circuit_breaker_state", "key" => key.to_string()).set(state);
}

/// Record a fast-failed call.
pub fn record_circuit_breaker_rejected(key: &str) {
    counter!("circuit_breaker_rejected_total", "key" => key.to_string()).increment(1);
}

// ============================================================================
// Order Metrics
// ============================================================================

/// Record a completed parent order.
pub fn record_order_completed(algorithm: &str, status: &str, duration_seconds: f64) {
    counter!(
        "orders_completed_total",
        "algorithm" => algorithm.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        "order_duration_seconds",
        "algorithm" => algorithm.to_string()
    )
    .record(duration_seconds);
}

/// Record a slice outcome.
pub fn record_slice_outcome(algorithm: &str, status: &str, attempts: u32) {
    counter!(
        "order_slices_total",
        "algorithm" => algorithm.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!("order_slice_attempts", "algorithm" => algorithm.to_string())
        .record(f64::from(attempts));
}

/// Record a duplicate submission served from the idempotency store.
pub fn record_idempotent_replay() {
    counter!("order_idempotent_replays_total").increment(1);
}

/// Record a risk denial.
pub fn record_risk_denial(code: &str) {
    counter!("risk_denials_total", "code" => code.to_string()).increment(1);
}

// ============================================================================
// Position Monitor Metrics
// ============================================================================

/// Record one monitor pass.
pub fn record_monitor_pass(positions: usize, duration_seconds: f64) {
    counter!("position_monitor_passes_total").increment(1);
    histogram!("position_monitor_pass_seconds").record(duration_seconds);
    #[allow(clippy::cast_precision_loss)]
    gauge!("open_positions").set(positions as f64);
}

/// Record a failed evaluation of a single position.
pub fn record_monitor_evaluation_error(kind: &str) {
    counter!("position_monitor_errors_total", "kind" => kind.to_string()).increment(1);
}

/// Record an escalation after repeated evaluation failures.
pub fn record_monitor_alert() {
    counter!("position_monitor_alerts_total").increment(1);
}

/// Record a triggered exit.
pub fn record_exit_triggered(trigger: &str) {
    counter!("position_exits_total", "trigger" => trigger.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_config_default() {
        let config = MetricsConfig::default();
        assert_eq!(config.listen_addr.port(), 9090);
        assert!(!config.latency_buckets.is_empty());
    }

    #[test]
    fn test_metrics_config_with_addr() {
        let addr: SocketAddr = "127.0.0.1:9191".parse().unwrap();
        let config = MetricsConfig::with_addr(addr);
        assert_eq!(config.listen_addr, addr);
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        record_provider_call("rpc-a", "rpc", true, Duration::from_millis(10));
        set_provider_status("rpc-a", "rpc", provider_status::DEGRADED);
        record_circuit_breaker_state("rpc:rpc-a", circuit_breaker_state::OPEN);
        record_order_completed("twap", "FILLED", 1.0);
        record_monitor_pass(3, 0.01);
    }
}
