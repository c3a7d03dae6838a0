//! Status derivation thresholds.

use std::time::Duration;

use super::HealthStatus;

/// Thresholds used to derive [`HealthStatus`] from a rolling window.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthPolicy {
    /// Samples kept per provider.
    pub window_size: usize,
    /// Minimum success rate for `healthy`.
    pub healthy_success_rate: f64,
    /// Minimum success rate for `degraded`.
    pub degraded_success_rate: f64,
    /// p95 latency must be strictly below this for `healthy`.
    pub latency_ceiling: Duration,
    /// Samples required before a provider can be reported `unhealthy`.
    /// Smaller windows bottom out at `degraded`.
    pub min_samples_for_unhealthy: usize,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            window_size: 20,
            healthy_success_rate: 0.9,
            degraded_success_rate: 0.5,
            latency_ceiling: Duration::from_millis(2_000),
            min_samples_for_unhealthy: 3,
        }
    }
}

impl HealthPolicy {
    /// Derive a status.
    ///
    /// An empty window counts as healthy so the engine can route before the
    /// first probe pass completes. A window shorter than
    /// `min_samples_for_unhealthy` is never reported unhealthy, so a single
    /// failed probe cannot take the only provider of a role out of rotation.
    #[must_use]
    pub fn derive(
        &self,
        sample_count: usize,
        success_rate: f64,
        p95: Option<Duration>,
    ) -> HealthStatus {
        if sample_count == 0 {
            return HealthStatus::Healthy;
        }

        let latency_ok = p95.is_none_or(|p95| p95 < self.latency_ceiling);
        if success_rate >= self.healthy_success_rate && latency_ok {
            HealthStatus::Healthy
        } else if success_rate >= self.degraded_success_rate
            || sample_count < self.min_samples_for_unhealthy
        {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(10, 1.0, Some(100) => HealthStatus::Healthy ; "all good")]
    #[test_case(10, 0.9, Some(100) => HealthStatus::Healthy ; "exactly at healthy rate")]
    #[test_case(10, 0.95, Some(2_500) => HealthStatus::Degraded ; "slow but successful")]
    #[test_case(10, 0.6, Some(100) => HealthStatus::Degraded ; "flaky")]
    #[test_case(10, 0.5, None => HealthStatus::Degraded ; "exactly at degraded rate")]
    #[test_case(10, 0.3, Some(100) => HealthStatus::Unhealthy ; "mostly failing")]
    #[test_case(0, 0.0, None => HealthStatus::Healthy ; "no samples yet")]
    #[test_case(1, 0.0, None => HealthStatus::Degraded ; "one failure is not enough")]
    #[test_case(2, 0.0, None => HealthStatus::Degraded ; "two failures are not enough")]
    #[test_case(3, 0.0, None => HealthStatus::Unhealthy ; "three failures")]
    fn derive_status(samples: usize, rate: f64, p95_ms: Option<u64>) -> HealthStatus {
        HealthPolicy::default().derive(samples, rate, p95_ms.map(Duration::from_millis))
    }

    #[test]
    fn latency_ceiling_is_exclusive() {
        let policy = HealthPolicy::default();
        let status = policy.derive(5, 1.0, Some(policy.latency_ceiling));
        assert_eq!(status, HealthStatus::Degraded);
    }
}
