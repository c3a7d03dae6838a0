//! Circuit breaker configuration for resilience.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Circuit breaker configuration, shared by every provider breaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Duration in open state (seconds).
    #[serde(default = "default_recovery_timeout")]
    pub recovery_timeout_secs: u64,
    /// Calls running longer than this count as failures (milliseconds).
    #[serde(default = "default_call_timeout")]
    pub call_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout_secs: default_recovery_timeout(),
            call_timeout_ms: default_call_timeout(),
        }
    }
}

impl CircuitBreakerConfig {
    /// Convert config settings to resilience module's `CircuitBreakerConfig`.
    #[must_use]
    pub const fn to_resilience_config(&self) -> crate::resilience::CircuitBreakerConfig {
        crate::resilience::CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            recovery_timeout: Duration::from_secs(self.recovery_timeout_secs),
            call_timeout: Duration::from_millis(self.call_timeout_ms),
        }
    }
}

const fn default_failure_threshold() -> u32 {
    5
}

const fn default_recovery_timeout() -> u64 {
    60
}

const fn default_call_timeout() -> u64 {
    15_000
}
