//! Rolling-window health record for one provider.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::provider_health::value_objects::{
    HealthPolicy, HealthStatus, Provider, ProviderStatus,
};

/// Outcome of one probe or routed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSample {
    /// Whether the call succeeded.
    pub success: bool,
    /// Observed latency.
    pub latency: Duration,
    /// When the sample was taken.
    pub at: DateTime<Utc>,
}

impl ProbeSample {
    /// Successful sample.
    #[must_use]
    pub const fn success(latency: Duration, at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            latency,
            at,
        }
    }

    /// Failed sample.
    #[must_use]
    pub const fn failure(latency: Duration, at: DateTime<Utc>) -> Self {
        Self {
            success: false,
            latency,
            at,
        }
    }
}

/// Status transition produced by [`ProviderHealth::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// Previous status.
    pub from: HealthStatus,
    /// New status.
    pub to: HealthStatus,
}

/// Health aggregate for a single provider.
///
/// Holds at most `policy.window_size` samples; the oldest is evicted first.
#[derive(Debug, Clone)]
pub struct ProviderHealth {
    provider: Provider,
    policy: HealthPolicy,
    samples: VecDeque<ProbeSample>,
    status: HealthStatus,
}

impl ProviderHealth {
    /// Start tracking a provider with an empty window.
    #[must_use]
    pub fn new(provider: Provider, policy: HealthPolicy) -> Self {
        let capacity = policy.window_size.max(1);
        Self {
            provider,
            policy,
            samples: VecDeque::with_capacity(capacity),
            status: HealthStatus::Healthy,
        }
    }

    /// Tracked provider.
    #[must_use]
    pub const fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Current derived status.
    #[must_use]
    pub const fn status(&self) -> HealthStatus {
        self.status
    }

    /// Samples currently in the window.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Append a sample and re-derive the status.
    ///
    /// Returns the transition if the status changed.
    pub fn record(&mut self, sample: ProbeSample) -> Option<StatusChange> {
        let window = self.policy.window_size.max(1);
        while self.samples.len() >= window {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);

        let next = self
            .policy
            .derive(self.samples.len(), self.success_rate(), self.latency_percentile(95));
        let previous = std::mem::replace(&mut self.status, next);
        (previous != next).then_some(StatusChange {
            from: previous,
            to: next,
        })
    }

    /// Fraction of successful samples; 1.0 for an empty window.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.samples.is_empty() {
            return 1.0;
        }
        let ok = self.samples.iter().filter(|s| s.success).count();
        ok as f64 / self.samples.len() as f64
    }

    /// Nearest-rank latency percentile over successful samples.
    #[must_use]
    pub fn latency_percentile(&self, percentile: u8) -> Option<Duration> {
        let mut latencies: Vec<Duration> = self
            .samples
            .iter()
            .filter(|s| s.success)
            .map(|s| s.latency)
            .collect();
        if latencies.is_empty() {
            return None;
        }
        latencies.sort_unstable();

        let p = usize::from(percentile.clamp(1, 100));
        let rank = (p * latencies.len()).div_ceil(100);
        latencies.get(rank.saturating_sub(1)).copied()
    }

    /// Time of the most recent sample.
    #[must_use]
    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        self.samples.back().map(|s| s.at)
    }

    /// Operational snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ProviderStatus {
        ProviderStatus {
            id: self.provider.id.clone(),
            endpoint: self.provider.endpoint.clone(),
            role: self.provider.role,
            status: self.status,
            success_rate: self.success_rate(),
            latency_p50_ms: self.latency_percentile(50).map(duration_ms),
            latency_p95_ms: self.latency_percentile(95).map(duration_ms),
            sample_count: self.samples.len(),
            last_check: self.last_check(),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provider_health::ProviderRole;

    fn health() -> ProviderHealth {
        ProviderHealth::new(
            Provider::new("rpc-a", "http://rpc-a", ProviderRole::Rpc),
            HealthPolicy::default(),
        )
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn new_provider_is_healthy_with_no_samples() {
        let h = health();
        assert_eq!(h.status(), HealthStatus::Healthy);
        assert_eq!(h.sample_count(), 0);
        assert!(h.latency_percentile(95).is_none());
        assert!(h.last_check().is_none());
    }

    #[test]
    fn window_evicts_oldest() {
        let mut h = health();
        let now = Utc::now();
        for _ in 0..20 {
            h.record(ProbeSample::failure(ms(10), now));
        }
        assert_eq!(h.status(), HealthStatus::Unhealthy);

        for _ in 0..20 {
            h.record(ProbeSample::success(ms(10), now));
        }
        assert_eq!(h.sample_count(), 20);
        assert!((h.success_rate() - 1.0).abs() < f64::EPSILON);
        assert_eq!(h.status(), HealthStatus::Healthy);
    }

    #[test]
    fn record_reports_transitions_only_on_change() {
        let mut h = health();
        let now = Utc::now();
        assert!(h.record(ProbeSample::success(ms(5), now)).is_none());

        let change = h.record(ProbeSample::failure(ms(5), now));
        assert_eq!(
            change,
            Some(StatusChange {
                from: HealthStatus::Healthy,
                to: HealthStatus::Degraded,
            })
        );
    }

    #[test]
    fn slow_provider_is_degraded() {
        let mut h = health();
        let now = Utc::now();
        for _ in 0..10 {
            h.record(ProbeSample::success(ms(3_000), now));
        }
        assert_eq!(h.status(), HealthStatus::Degraded);
    }

    #[test]
    fn percentiles_use_nearest_rank() {
        let mut h = health();
        let now = Utc::now();
        for v in 1..=20 {
            h.record(ProbeSample::success(ms(v * 10), now));
        }
        assert_eq!(h.latency_percentile(50), Some(ms(100)));
        assert_eq!(h.latency_percentile(95), Some(ms(190)));

        let snap = h.snapshot();
        assert_eq!(snap.latency_p50_ms, Some(100));
        assert_eq!(snap.latency_p95_ms, Some(190));
        assert_eq!(snap.sample_count, 20);
    }

    #[test]
    fn failed_samples_do_not_count_toward_latency() {
        let mut h = health();
        let now = Utc::now();
        h.record(ProbeSample::success(ms(50), now));
        h.record(ProbeSample::failure(ms(9_000), now));
        assert_eq!(h.latency_percentile(95), Some(ms(50)));
    }
}
