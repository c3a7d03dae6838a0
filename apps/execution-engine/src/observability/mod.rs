//! Observability module for metrics and structured logging.
//!
//! Prometheus metrics export plus `tracing-subscriber` setup.

mod metrics;
mod tracing;

pub use self::metrics::{
    MetricsConfig, MetricsError, circuit_breaker_state, init_metrics, provider_status,
    record_circuit_breaker_rejected, record_circuit_breaker_state, record_exit_triggered,
    record_failover, record_idempotent_replay, record_monitor_alert,
    record_monitor_evaluation_error, record_monitor_pass, record_order_completed,
    record_provider_call, record_risk_denial, record_slice_outcome, set_provider_status,
};
pub use self::tracing::{LogFormat, TracingConfig, TracingError, init_tracing};
