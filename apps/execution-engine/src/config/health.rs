//! Provider health probing and status thresholds.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::services::HealthMonitorConfig;
use crate::domain::provider_health::HealthPolicy;

/// Health monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Probe interval (seconds).
    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,
    /// Relative jitter on each interval.
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    /// Samples kept per provider.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Success rate at or above which a provider is healthy.
    #[serde(default = "default_healthy_success_rate")]
    pub healthy_success_rate: f64,
    /// Success rate at or above which a provider is degraded.
    #[serde(default = "default_degraded_success_rate")]
    pub degraded_success_rate: f64,
    /// p95 latency ceiling for `healthy` (milliseconds).
    #[serde(default = "default_latency_ceiling")]
    pub latency_ceiling_ms: u64,
    /// Samples required before a provider is reported unhealthy.
    #[serde(default = "default_min_samples_for_unhealthy")]
    pub min_samples_for_unhealthy: usize,
    /// Deadline for one probe (milliseconds).
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_interval_secs: default_probe_interval(),
            jitter: default_jitter(),
            window_size: default_window_size(),
            healthy_success_rate: default_healthy_success_rate(),
            degraded_success_rate: default_degraded_success_rate(),
            latency_ceiling_ms: default_latency_ceiling(),
            min_samples_for_unhealthy: default_min_samples_for_unhealthy(),
            probe_timeout_ms: default_probe_timeout(),
        }
    }
}

impl HealthConfig {
    /// Probe loop settings.
    #[must_use]
    pub const fn to_monitor_config(&self) -> HealthMonitorConfig {
        HealthMonitorConfig {
            interval: Duration::from_secs(self.probe_interval_secs),
            jitter: self.jitter,
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
        }
    }

    /// Status derivation thresholds.
    #[must_use]
    pub const fn to_policy(&self) -> HealthPolicy {
        HealthPolicy {
            window_size: self.window_size,
            healthy_success_rate: self.healthy_success_rate,
            degraded_success_rate: self.degraded_success_rate,
            latency_ceiling: Duration::from_millis(self.latency_ceiling_ms),
            min_samples_for_unhealthy: self.min_samples_for_unhealthy,
        }
    }
}

const fn default_probe_interval() -> u64 {
    30
}

const fn default_jitter() -> f64 {
    0.2
}

const fn default_window_size() -> usize {
    20
}

const fn default_healthy_success_rate() -> f64 {
    0.9
}

const fn default_degraded_success_rate() -> f64 {
    0.5
}

const fn default_latency_ceiling() -> u64 {
    2_000
}

const fn default_min_samples_for_unhealthy() -> usize {
    3
}

const fn default_probe_timeout() -> u64 {
    5_000
}
