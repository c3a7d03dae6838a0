//! Provider Pool / Failover Router
//!
//! Routes a call to the best live provider for a role and falls through the
//! ranked candidate list on breaker fast-fail, timeout or transient error.
//! Each candidate is tried at most once per call.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use super::health_monitor::HealthMonitor;
use crate::application::ports::ProviderError;
use crate::domain::provider_health::ProviderRole;
use crate::domain::shared::ProviderId;
use crate::error::ExecutionError;
use crate::observability::record_failover;
use crate::resilience::{BreakerCallError, CircuitBreakerRegistry};

/// One failed candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderAttempt {
    /// Provider tried.
    pub provider: ProviderId,
    /// Why it failed.
    pub reason: String,
    /// Back-off hint from a rate-limited provider.
    #[serde(skip)]
    pub retry_after: Option<Duration>,
}

/// Failure of a pooled call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// No healthy or degraded provider for the role.
    #[error("no {role} provider available")]
    NoProviderAvailable {
        /// Requested role.
        role: ProviderRole,
    },

    /// Every candidate failed.
    #[error("all {role} providers failed: {}", summarize(.attempts))]
    Exhausted {
        /// Requested role.
        role: ProviderRole,
        /// Each candidate and its failure.
        attempts: Vec<ProviderAttempt>,
    },

    /// A provider answered with a permanent rejection; failover would not help.
    #[error("{provider} rejected the request: {error}")]
    Rejected {
        /// Provider that answered.
        provider: ProviderId,
        /// The rejection.
        error: ProviderError,
    },
}

fn summarize(attempts: &[ProviderAttempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.provider, a.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

impl PoolError {
    /// Longest back-off hint any attempt returned.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Exhausted { attempts, .. } => attempts.iter().filter_map(|a| a.retry_after).max(),
            Self::NoProviderAvailable { .. } | Self::Rejected { .. } => None,
        }
    }
}

impl From<PoolError> for ExecutionError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::NoProviderAvailable { role } => Self::NoProviderAvailable { role },
            PoolError::Exhausted { role, attempts } => Self::ProvidersExhausted {
                role,
                summary: summarize(&attempts),
            },
            PoolError::Rejected { error, .. } => match error {
                ProviderError::Permanent { kind, message } => Self::PermanentOrder { kind, message },
                other => Self::TransientProvider {
                    message: other.to_string(),
                },
            },
        }
    }
}

/// Pool of interchangeable providers serving one role.
pub struct ProviderPool<P: ?Sized> {
    role: ProviderRole,
    providers: HashMap<ProviderId, Arc<P>>,
    health: Arc<HealthMonitor>,
    breakers: Arc<CircuitBreakerRegistry>,
}

impl<P: ?Sized> fmt::Debug for ProviderPool<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderPool")
            .field("role", &self.role)
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl<P: ?Sized + Send + Sync> ProviderPool<P> {
    /// Create an empty pool.
    #[must_use]
    pub fn new(
        role: ProviderRole,
        health: Arc<HealthMonitor>,
        breakers: Arc<CircuitBreakerRegistry>,
    ) -> Self {
        Self {
            role,
            providers: HashMap::new(),
            health,
            breakers,
        }
    }

    /// Add a provider. It must also be registered with the health monitor
    /// to be routable.
    #[must_use]
    pub fn with_provider(mut self, id: ProviderId, provider: Arc<P>) -> Self {
        self.providers.insert(id, provider);
        self
    }

    /// Role served.
    #[must_use]
    pub const fn role(&self) -> ProviderRole {
        self.role
    }

    /// Number of providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the pool has no providers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Breaker key for a provider in this pool.
    #[must_use]
    pub fn breaker_key(&self, id: &ProviderId) -> String {
        format!("{}:{}", self.role, id)
    }

    /// Run `f` against the best candidate, failing over down the ranking.
    ///
    /// Every attempt is recorded with the health monitor. Permanent
    /// rejections stop the failover and count as a healthy response.
    ///
    /// # Errors
    ///
    /// [`PoolError::NoProviderAvailable`] when the health monitor has no
    /// routable candidate, [`PoolError::Exhausted`] when all candidates
    /// failed, [`PoolError::Rejected`] on a permanent rejection.
    #[tracing::instrument(
        name = "provider.call",
        skip_all,
        fields(role = %self.role, operation = %operation)
    )]
    pub async fn call<T, F, Fut>(&self, operation: &str, f: F) -> Result<(T, ProviderId), PoolError>
    where
        F: Fn(Arc<P>) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let candidates: Vec<ProviderId> = self
            .health
            .ranked(self.role)
            .into_iter()
            .filter(|id| self.providers.contains_key(id))
            .collect();
        if candidates.is_empty() {
            tracing::warn!(role = %self.role, operation, "No provider available");
            return Err(PoolError::NoProviderAvailable { role: self.role });
        }

        let mut attempts = Vec::with_capacity(candidates.len());
        for id in candidates {
            let Some(provider) = self.providers.get(&id) else {
                continue;
            };
            match self.attempt(&id, provider, &f).await {
                Attempt::Succeeded(value) => return Ok((value, id)),
                Attempt::Rejected(error) => return Err(PoolError::Rejected { provider: id, error }),
                Attempt::Failed(failed) => {
                    tracing::debug!(
                        provider = %id,
                        role = %self.role,
                        operation,
                        reason = %failed.reason,
                        "Provider attempt failed, failing over"
                    );
                    record_failover(&self.role.to_string(), id.as_str());
                    attempts.push(failed);
                }
            }
        }

        tracing::warn!(
            role = %self.role,
            operation,
            attempts = attempts.len(),
            "All providers failed"
        );
        Err(PoolError::Exhausted {
            role: self.role,
            attempts,
        })
    }

    /// Run `f` against one specific provider, through its breaker.
    ///
    /// Used for follow-up calls that must reach the provider that served an
    /// earlier step (a swap built from that provider's quote).
    ///
    /// # Errors
    ///
    /// [`PoolError::NoProviderAvailable`] when `id` is not in the pool,
    /// [`PoolError::Exhausted`] with the single failed attempt, or
    /// [`PoolError::Rejected`].
    pub async fn call_on<T, F, Fut>(&self, id: &ProviderId, operation: &str, f: F) -> Result<T, PoolError>
    where
        F: Fn(Arc<P>) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let Some(provider) = self.providers.get(id) else {
            return Err(PoolError::NoProviderAvailable { role: self.role });
        };
        match self.attempt(id, provider, &f).await {
            Attempt::Succeeded(value) => Ok(value),
            Attempt::Rejected(error) => Err(PoolError::Rejected {
                provider: id.clone(),
                error,
            }),
            Attempt::Failed(failed) => {
                tracing::debug!(
                    provider = %id,
                    role = %self.role,
                    operation,
                    reason = %failed.reason,
                    "Pinned provider call failed"
                );
                Err(PoolError::Exhausted {
                    role: self.role,
                    attempts: vec![failed],
                })
            }
        }
    }

    async fn attempt<T, F, Fut>(&self, id: &ProviderId, provider: &Arc<P>, f: &F) -> Attempt<T>
    where
        F: Fn(Arc<P>) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let breaker = self.breakers.breaker(&self.breaker_key(id));
        let started = tokio::time::Instant::now();
        let outcome = breaker
            .call_with(|| f(Arc::clone(provider)), ProviderError::is_transient)
            .await;
        let latency = started.elapsed();

        let (reason, retry_after) = match outcome {
            Ok(value) => {
                self.health.record(id, true, latency);
                return Attempt::Succeeded(value);
            }
            Err(BreakerCallError::Inner(error)) if error.is_permanent() => {
                self.health.record(id, true, latency);
                return Attempt::Rejected(error);
            }
            Err(BreakerCallError::Open(open)) => (open.to_string(), None),
            Err(BreakerCallError::Timeout { timeout }) => {
                self.health.record(id, false, latency);
                (format!("timed out after {timeout:?}"), None)
            }
            Err(BreakerCallError::Inner(error)) => {
                self.health.record(id, false, latency);
                (error.to_string(), error.retry_after())
            }
        };

        Attempt::Failed(ProviderAttempt {
            provider: id.clone(),
            reason,
            retry_after,
        })
    }
}

enum Attempt<T> {
    Succeeded(T),
    Rejected(ProviderError),
    Failed(ProviderAttempt),
}
