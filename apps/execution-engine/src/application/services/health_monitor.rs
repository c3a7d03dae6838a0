//! Provider Health Monitor Service
//!
//! Probes every configured provider on a jittered interval and keeps a
//! rolling health window per provider. Routed calls made by the provider
//! pool feed the same windows, so ranking reacts between probe passes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::application::ports::{HealthProbe, ProviderError};
use crate::domain::provider_health::{
    HealthPolicy, HealthStatus, ProbeSample, Provider, ProviderHealth, ProviderRole,
    ProviderStatus, rank_candidates,
};
use crate::domain::shared::ProviderId;
use crate::error::ExecutionError;
use crate::observability::{provider_status, record_provider_call, set_provider_status};

/// Probe loop settings.
#[derive(Debug, Clone)]
pub struct HealthMonitorConfig {
    /// Nominal probe interval.
    pub interval: Duration,
    /// Relative jitter applied to each interval (0.2 = ±20%).
    pub jitter: f64,
    /// Deadline for a single probe.
    pub probe_timeout: Duration,
}

impl Default for HealthMonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            jitter: 0.2,
            probe_timeout: Duration::from_secs(5),
        }
    }
}

struct MonitoredProvider {
    health: ProviderHealth,
    probe: Arc<dyn HealthProbe>,
}

/// Health monitor shared by the pools and the HTTP surface.
pub struct HealthMonitor {
    config: HealthMonitorConfig,
    policy: HealthPolicy,
    // registration order breaks ranking ties
    providers: RwLock<Vec<MonitoredProvider>>,
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("config", &self.config)
            .field("providers", &self.providers.read().len())
            .finish()
    }
}

impl HealthMonitor {
    /// Create an empty monitor.
    #[must_use]
    pub fn new(config: HealthMonitorConfig, policy: HealthPolicy) -> Self {
        Self {
            config,
            policy,
            providers: RwLock::new(Vec::new()),
        }
    }

    /// Start tracking a provider. Re-registering an id replaces its probe and
    /// clears its window.
    pub fn register(&self, provider: Provider, probe: Arc<dyn HealthProbe>) {
        let mut providers = self.providers.write();
        let entry = MonitoredProvider {
            health: ProviderHealth::new(provider, self.policy.clone()),
            probe,
        };
        if let Some(existing) = providers
            .iter_mut()
            .find(|p| p.health.provider().id == entry.health.provider().id)
        {
            *existing = entry;
        } else {
            providers.push(entry);
        }
    }

    /// Record the outcome of a probe or a routed call.
    pub fn record(&self, id: &ProviderId, success: bool, latency: Duration) {
        let at = Utc::now();
        let sample = if success {
            ProbeSample::success(latency, at)
        } else {
            ProbeSample::failure(latency, at)
        };

        let mut providers = self.providers.write();
        let Some(entry) = providers.iter_mut().find(|p| &p.health.provider().id == id) else {
            tracing::debug!(provider = %id, "Sample for unknown provider ignored");
            return;
        };
        let role = entry.health.provider().role;
        let change = entry.health.record(sample);
        let success_rate = entry.health.success_rate();
        drop(providers);

        record_provider_call(id.as_str(), &role.to_string(), success, latency);

        if let Some(change) = change {
            set_provider_status(id.as_str(), &role.to_string(), status_gauge(change.to));
            if change.to.rank() > change.from.rank() {
                tracing::warn!(
                    provider = %id,
                    role = %role,
                    from = %change.from,
                    to = %change.to,
                    success_rate,
                    "Provider health degraded"
                );
            } else {
                tracing::info!(
                    provider = %id,
                    role = %role,
                    from = %change.from,
                    to = %change.to,
                    success_rate,
                    "Provider health recovered"
                );
            }
        }
    }

    /// Routable providers for `role`, best first.
    #[must_use]
    pub fn ranked(&self, role: ProviderRole) -> Vec<ProviderId> {
        let providers = self.providers.read();
        rank_candidates(providers.iter().map(|p| &p.health), role)
            .into_iter()
            .map(|h| h.provider().id.clone())
            .collect()
    }

    /// Highest-ranked provider for `role`.
    ///
    /// Healthy providers win over degraded ones; unhealthy providers never
    /// qualify.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::NoProviderAvailable`] when every provider
    /// for the role is unhealthy or none is configured.
    pub fn best_provider(&self, role: ProviderRole) -> Result<Provider, ExecutionError> {
        let providers = self.providers.read();
        rank_candidates(providers.iter().map(|p| &p.health), role)
            .first()
            .map(|h| h.provider().clone())
            .ok_or(ExecutionError::NoProviderAvailable { role })
    }

    /// Current status of a single provider.
    #[must_use]
    pub fn status_of(&self, id: &ProviderId) -> Option<HealthStatus> {
        self.providers
            .read()
            .iter()
            .find(|p| &p.health.provider().id == id)
            .map(|p| p.health.status())
    }

    /// Snapshot of every provider, grouped by role in registration order.
    #[must_use]
    pub fn statuses(&self) -> Vec<ProviderStatus> {
        let mut all: Vec<_> = self
            .providers
            .read()
            .iter()
            .map(|p| p.health.snapshot())
            .collect();
        all.sort_by_key(|s| s.role == ProviderRole::Quote);
        all
    }

    /// Probe one provider now.
    pub async fn probe_one(&self, id: &ProviderId) {
        let probe = self
            .providers
            .read()
            .iter()
            .find(|p| &p.health.provider().id == id)
            .map(|p| Arc::clone(&p.probe));
        let Some(probe) = probe else {
            return;
        };

        let started = tokio::time::Instant::now();
        let outcome = tokio::time::timeout(self.config.probe_timeout, probe.probe())
            .await
            .unwrap_or_else(|_| {
                Err(ProviderError::Timeout {
                    message: format!("probe exceeded {:?}", self.config.probe_timeout),
                })
            });
        let latency = started.elapsed();

        if let Err(e) = &outcome {
            tracing::debug!(provider = %id, error = %e, "Probe failed");
        }
        self.record(id, outcome.is_ok(), latency);
    }

    /// Probe every provider concurrently.
    pub async fn probe_all(&self) {
        let ids: Vec<ProviderId> = self
            .providers
            .read()
            .iter()
            .map(|p| p.health.provider().id.clone())
            .collect();
        futures::future::join_all(ids.iter().map(|id| self.probe_one(id))).await;
    }

    /// Spawn one probe loop per provider, each on its own jittered schedule.
    pub fn spawn(self: &Arc<Self>, tracker: &TaskTracker, shutdown: CancellationToken) {
        let ids: Vec<ProviderId> = self
            .providers
            .read()
            .iter()
            .map(|p| p.health.provider().id.clone())
            .collect();

        tracing::info!(
            providers = ids.len(),
            interval_secs = self.config.interval.as_secs(),
            "Starting provider health monitor"
        );

        for id in ids {
            let monitor = Arc::clone(self);
            let shutdown = shutdown.clone();
            tracker.spawn(async move {
                loop {
                    let delay = monitor.next_delay();
                    tokio::select! {
                        () = tokio::time::sleep(delay) => monitor.probe_one(&id).await,
                        () = shutdown.cancelled() => {
                            tracing::debug!(provider = %id, "Health probe loop stopped");
                            break;
                        }
                    }
                }
            });
        }
    }

    fn next_delay(&self) -> Duration {
        jittered(self.config.interval, self.config.jitter)
    }
}

/// `base` scaled by a random factor in `[1 - jitter, 1 + jitter]`.
fn jittered(base: Duration, jitter: f64) -> Duration {
    if jitter <= 0.0 {
        return base;
    }
    let factor = rand::rng().random_range((1.0 - jitter).max(0.0)..=1.0 + jitter);
    base.mul_f64(factor)
}

const fn status_gauge(status: HealthStatus) -> f64 {
    match status {
        HealthStatus::Healthy => provider_status::HEALTHY,
        HealthStatus::Degraded => provider_status::DEGRADED,
        HealthStatus::Unhealthy => provider_status::UNHEALTHY,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;

    struct FlagProbe(AtomicBool);

    #[async_trait]
    impl HealthProbe for FlagProbe {
        async fn probe(&self) -> Result<(), ProviderError> {
            if self.0.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(ProviderError::Transport {
                    message: "down".to_string(),
                })
            }
        }
    }

    async fn check_rounds(monitor: &HealthMonitor, rounds: usize) {
        for _ in 0..rounds {
            monitor.probe_all().await;
        }
    }

    fn monitor_with(flags: &[(&str, ProviderRole, bool)]) -> (HealthMonitor, Vec<Arc<FlagProbe>>) {
        let monitor = HealthMonitor::new(HealthMonitorConfig::default(), HealthPolicy::default());
        let mut probes = Vec::new();
        for (id, role, up) in flags {
            let probe = Arc::new(FlagProbe(AtomicBool::new(*up)));
            monitor.register(
                Provider::new(*id, format!("https://{id}.example"), *role),
                Arc::clone(&probe) as Arc<dyn HealthProbe>,
            );
            probes.push(probe);
        }
        (monitor, probes)
    }

    #[tokio::test]
    async fn best_provider_prefers_healthy() {
        let (monitor, _) = monitor_with(&[
            ("a", ProviderRole::Rpc, false),
            ("b", ProviderRole::Rpc, true),
            ("c", ProviderRole::Rpc, false),
        ]);
        check_rounds(&monitor, 3).await;

        let best = monitor.best_provider(ProviderRole::Rpc).unwrap();
        assert_eq!(best.id.as_str(), "b");
        assert_eq!(monitor.ranked(ProviderRole::Rpc), vec![ProviderId::new("b")]);
    }

    #[tokio::test]
    async fn falls_back_to_degraded() {
        let (monitor, _) = monitor_with(&[("a", ProviderRole::Quote, true)]);
        let id = ProviderId::new("a");
        // 6 of 10 successes: degraded
        for i in 0..10 {
            monitor.record(&id, i % 5 < 3, Duration::from_millis(10));
        }
        assert_eq!(monitor.status_of(&id), Some(HealthStatus::Degraded));
        assert_eq!(monitor.best_provider(ProviderRole::Quote).unwrap().id, id);
    }

    #[tokio::test]
    async fn no_provider_available_is_a_distinct_error() {
        let (monitor, _) = monitor_with(&[
            ("a", ProviderRole::Rpc, false),
            ("q", ProviderRole::Quote, true),
        ]);
        check_rounds(&monitor, 3).await;

        let err = monitor.best_provider(ProviderRole::Rpc).unwrap_err();
        assert_eq!(
            err,
            ExecutionError::NoProviderAvailable {
                role: ProviderRole::Rpc
            }
        );
        assert!(monitor.best_provider(ProviderRole::Quote).is_ok());
    }

    #[tokio::test]
    async fn recovers_after_probes_succeed() {
        let (monitor, probes) = monitor_with(&[("a", ProviderRole::Rpc, false)]);
        check_rounds(&monitor, 3).await;
        assert_eq!(
            monitor.status_of(&ProviderId::new("a")),
            Some(HealthStatus::Unhealthy)
        );

        probes[0].0.store(true, Ordering::SeqCst);
        check_rounds(&monitor, 20).await;
        assert_eq!(
            monitor.status_of(&ProviderId::new("a")),
            Some(HealthStatus::Healthy)
        );
    }

    #[tokio::test]
    async fn single_failed_check_keeps_sole_provider_routable() {
        let (monitor, _) = monitor_with(&[("only", ProviderRole::Rpc, false)]);
        monitor.probe_all().await;

        let id = ProviderId::new("only");
        assert_eq!(monitor.status_of(&id), Some(HealthStatus::Degraded));
        assert_eq!(monitor.best_provider(ProviderRole::Rpc).unwrap().id, id);

        check_rounds(&monitor, 2).await;
        assert_eq!(monitor.status_of(&id), Some(HealthStatus::Unhealthy));
        assert!(monitor.best_provider(ProviderRole::Rpc).is_err());
    }

    #[test]
    fn statuses_list_rpc_first() {
        let (monitor, _) = monitor_with(&[
            ("q", ProviderRole::Quote, true),
            ("r", ProviderRole::Rpc, true),
        ]);
        let roles: Vec<_> = monitor.statuses().into_iter().map(|s| s.role).collect();
        assert_eq!(roles, vec![ProviderRole::Rpc, ProviderRole::Quote]);
    }

    #[test]
    fn jitter_stays_in_band() {
        for _ in 0..100 {
            let d = jittered(Duration::from_secs(30), 0.2);
            assert!(d >= Duration::from_secs(24) && d <= Duration::from_secs(36));
        }
    }
}
