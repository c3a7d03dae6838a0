//! Circuit breaker guarding a single upstream dependency.
//!
//! Stops calling a failing provider for a cooldown period so one dead
//! endpoint cannot stall every order.
//!
//! # State Machine
//!
//! ```text
//! CLOSED → OPEN (consecutive failures >= threshold)
//! OPEN → HALF_OPEN (first call after recovery timeout elapsed)
//! HALF_OPEN → CLOSED (probe call succeeds)
//! HALF_OPEN → OPEN (probe call fails, opened_at refreshed)
//! ```
//!
//! Exactly one probe is admitted in `HALF_OPEN`; every other caller is
//! rejected until the probe settles. A success in `CLOSED` resets the
//! failure counter to zero.
//!
//! # Example
//!
//! ```rust,ignore
//! use dex_execution_engine::resilience::{CircuitBreaker, CircuitBreakerConfig};
//!
//! let breaker = CircuitBreaker::new("rpc:helius", CircuitBreakerConfig::default());
//! let slot = breaker.call(|| rpc.get_slot()).await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::clock::{Clock, SystemClock};
use crate::observability::{
    circuit_breaker_state, record_circuit_breaker_rejected, record_circuit_breaker_state,
};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitBreakerState {
    /// Circuit is closed, calls flow normally.
    Closed,
    /// Circuit is open, calls are rejected.
    Open,
    /// Circuit admits a single probe call.
    HalfOpen,
}

impl CircuitBreakerState {
    const fn gauge_value(self) -> f64 {
        match self {
            Self::Closed => circuit_breaker_state::CLOSED,
            Self::Open => circuit_breaker_state::OPEN,
            Self::HalfOpen => circuit_breaker_state::HALF_OPEN,
        }
    }
}

impl std::fmt::Display for CircuitBreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "CLOSED"),
            Self::Open => write!(f, "OPEN"),
            Self::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// Time to stay `OPEN` before admitting a probe.
    pub recovery_timeout: Duration,
    /// Maximum call duration; exceeding it counts as a failure.
    pub call_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
            call_timeout: Duration::from_secs(5),
        }
    }
}

/// Returned when the breaker refuses a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circuit open for {key} (retry after {retry_after:?})")]
pub struct CircuitOpenError {
    /// Breaker key.
    pub key: String,
    /// Remaining cooldown; zero while a probe is in flight.
    pub retry_after: Duration,
}

/// Failure of a guarded call.
#[derive(Debug, Error)]
pub enum BreakerCallError<E> {
    /// Rejected without invoking the call.
    #[error(transparent)]
    Open(CircuitOpenError),

    /// Call exceeded the configured timeout.
    #[error("call timed out after {timeout:?}")]
    Timeout {
        /// Configured timeout.
        timeout: Duration,
    },

    /// Call returned an error.
    #[error(transparent)]
    Inner(E),
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitBreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

/// Circuit breaker for one upstream dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    key: String,
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<BreakerInner>,
    total_calls: AtomicU64,
    total_failures: AtomicU64,
    total_rejections: AtomicU64,
    state_transitions: AtomicU64,
}

impl CircuitBreaker {
    /// Create a breaker on the system clock.
    #[must_use]
    pub fn new(key: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self::with_clock(key, config, Arc::new(SystemClock))
    }

    /// Create a breaker on an injected clock.
    #[must_use]
    pub fn with_clock(
        key: impl Into<String>,
        config: CircuitBreakerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            key: key.into(),
            config,
            clock,
            inner: Mutex::new(BreakerInner {
                state: CircuitBreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
            total_calls: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
            total_rejections: AtomicU64::new(0),
            state_transitions: AtomicU64::new(0),
        }
    }

    /// Dependency key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Configuration.
    #[must_use]
    pub const fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state. Does not itself move `OPEN` to `HALF_OPEN`.
    #[must_use]
    pub fn state(&self) -> CircuitBreakerState {
        self.inner.lock().state
    }

    /// Current consecutive failure count.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }

    /// Ask for permission to make one call.
    ///
    /// The returned permit must be settled with [`CallPermit::success`] or
    /// [`CallPermit::failure`]. A probe permit dropped unsettled counts as a
    /// failed probe.
    pub fn try_acquire(&self) -> Result<CallPermit<'_>, CircuitOpenError> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let (probe, transition) = match inner.state {
            CircuitBreakerState::Closed => (false, None),
            CircuitBreakerState::Open => {
                let elapsed = inner
                    .opened_at
                    .map_or(self.config.recovery_timeout, |t| now.saturating_duration_since(t));
                if elapsed < self.config.recovery_timeout {
                    drop(inner);
                    return Err(self.reject(self.config.recovery_timeout - elapsed));
                }
                inner.state = CircuitBreakerState::HalfOpen;
                inner.probe_in_flight = true;
                (true, Some((CircuitBreakerState::Open, CircuitBreakerState::HalfOpen)))
            }
            CircuitBreakerState::HalfOpen => {
                if inner.probe_in_flight {
                    drop(inner);
                    return Err(self.reject(Duration::ZERO));
                }
                inner.probe_in_flight = true;
                (true, None)
            }
        };
        drop(inner);

        if let Some((from, to)) = transition {
            self.on_transition(from, to);
        }

        Ok(CallPermit {
            breaker: self,
            probe,
            settled: false,
        })
    }

    /// Run `f` through the breaker; any error counts as a failure.
    pub async fn call<T, E, F, Fut>(&self, f: F) -> Result<T, BreakerCallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.call_with(f, |_| true).await
    }

    /// Run `f` through the breaker with the configured timeout.
    ///
    /// Errors for which `counts_as_failure` returns false are recorded as
    /// successes: the dependency answered, the request itself was bad.
    pub async fn call_with<T, E, F, Fut, C>(
        &self,
        f: F,
        counts_as_failure: C,
    ) -> Result<T, BreakerCallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: FnOnce(&E) -> bool,
    {
        let permit = self.try_acquire().map_err(BreakerCallError::Open)?;

        match tokio::time::timeout(self.config.call_timeout, f()).await {
            Ok(Ok(value)) => {
                permit.success();
                Ok(value)
            }
            Ok(Err(err)) => {
                if counts_as_failure(&err) {
                    permit.failure();
                } else {
                    permit.success();
                }
                Err(BreakerCallError::Inner(err))
            }
            Err(_) => {
                permit.failure();
                Err(BreakerCallError::Timeout {
                    timeout: self.config.call_timeout,
                })
            }
        }
    }

    /// Counters snapshot.
    #[must_use]
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let inner = self.inner.lock();
        CircuitBreakerMetrics {
            key: self.key.clone(),
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            total_calls: self.total_calls.load(Ordering::Relaxed),
            total_failures: self.total_failures.load(Ordering::Relaxed),
            total_rejections: self.total_rejections.load(Ordering::Relaxed),
            state_transitions: self.state_transitions.load(Ordering::Relaxed),
        }
    }

    fn reject(&self, retry_after: Duration) -> CircuitOpenError {
        self.total_rejections.fetch_add(1, Ordering::Relaxed);
        record_circuit_breaker_rejected(&self.key);
        CircuitOpenError {
            key: self.key.clone(),
            retry_after,
        }
    }

    fn settle(&self, probe: bool, success: bool) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.total_failures.fetch_add(1, Ordering::Relaxed);
        }

        let now = self.clock.now();
        let mut inner = self.inner.lock();
        let from = inner.state;

        match (inner.state, probe) {
            (CircuitBreakerState::Closed, false) => {
                if success {
                    inner.consecutive_failures = 0;
                } else {
                    inner.consecutive_failures += 1;
                    if inner.consecutive_failures >= self.config.failure_threshold {
                        inner.state = CircuitBreakerState::Open;
                        inner.opened_at = Some(now);
                    }
                }
            }
            (CircuitBreakerState::HalfOpen, true) => {
                inner.probe_in_flight = false;
                if success {
                    inner.state = CircuitBreakerState::Closed;
                    inner.consecutive_failures = 0;
                    inner.opened_at = None;
                } else {
                    inner.state = CircuitBreakerState::Open;
                    inner.opened_at = Some(now);
                }
            }
            // Stragglers admitted before the circuit opened.
            _ => {}
        }

        let to = inner.state;
        let failures = inner.consecutive_failures;
        drop(inner);

        if from != to {
            if to == CircuitBreakerState::Open {
                tracing::warn!(
                    key = %self.key,
                    from = %from,
                    to = "OPEN",
                    consecutive_failures = failures,
                    "Circuit breaker opened"
                );
            }
            self.on_transition(from, to);
        }
    }

    fn on_transition(&self, from: CircuitBreakerState, to: CircuitBreakerState) {
        self.state_transitions.fetch_add(1, Ordering::Relaxed);
        record_circuit_breaker_state(&self.key, to.gauge_value());
        match to {
            CircuitBreakerState::HalfOpen => {
                tracing::info!(key = %self.key, from = %from, to = "HALF_OPEN", "Circuit breaker probing");
            }
            CircuitBreakerState::Closed => {
                tracing::info!(key = %self.key, from = %from, to = "CLOSED", "Circuit breaker closed");
            }
            CircuitBreakerState::Open => {}
        }
    }
}

/// Permission to make one call through a breaker.
#[derive(Debug)]
#[must_use = "a permit must be settled with success() or failure()"]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    settled: bool,
}

impl CallPermit<'_> {
    /// Whether this is the half-open probe.
    #[must_use]
    pub const fn is_probe(&self) -> bool {
        self.probe
    }

    /// Record a successful call.
    pub fn success(mut self) {
        self.settled = true;
        self.breaker.settle(self.probe, true);
    }

    /// Record a failed call.
    pub fn failure(mut self) {
        self.settled = true;
        self.breaker.settle(self.probe, false);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.probe {
            self.breaker.settle(true, false);
        }
    }
}

/// Metrics for a circuit breaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerMetrics {
    /// Dependency key.
    pub key: String,
    /// Current state.
    pub state: CircuitBreakerState,
    /// Current consecutive failure count.
    pub consecutive_failures: u32,
    /// Settled calls.
    pub total_calls: u64,
    /// Failed calls.
    pub total_failures: u64,
    /// Calls rejected without running.
    pub total_rejections: u64,
    /// Number of state transitions.
    pub state_transitions: u64,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::resilience::clock::ManualClock;

    fn breaker(clock: &Arc<ManualClock>) -> CircuitBreaker {
        CircuitBreaker::with_clock(
            "rpc:test",
            CircuitBreakerConfig::default(),
            Arc::clone(clock) as Arc<dyn Clock>,
        )
    }

    fn fail_times(breaker: &CircuitBreaker, n: u32) {
        for _ in 0..n {
            breaker.try_acquire().unwrap().failure();
        }
    }

    #[test]
    fn test_default_config() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.recovery_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_initial_state_is_closed() {
        let breaker = CircuitBreaker::new("test", CircuitBreakerConfig::default());
        assert_eq!(breaker.state(), CircuitBreakerState::Closed);
        assert!(breaker.try_acquire().is_ok());
    }

    #[test]
    fn opens_after_exactly_threshold_failures() {
        let clock = Arc::new(ManualClock::new());
        let breaker = breaker(&clock);

        fail_times(&breaker, 4);
        assert_eq!(breaker.state(), CircuitBreakerState::Closed);
        assert_eq!(breaker.consecutive_failures(), 4);

        fail_times(&breaker, 1);
        assert_eq!(breaker.state(), CircuitBreakerState::Open);
    }

    #[test]
    fn success_resets_failure_counter() {
        let clock = Arc::new(ManualClock::new());
        let breaker = breaker(&clock);

        fail_times(&breaker, 4);
        breaker.try_acquire().unwrap().success();
        fail_times(&breaker, 4);

        assert_eq!(breaker.state(), CircuitBreakerState::Closed);
        assert_eq!(breaker.consecutive_failures(), 4);
    }

    #[test]
    fn scenario_open_fast_fails_then_admits_one_probe() {
        let clock = Arc::new(ManualClock::new());
        let breaker = breaker(&clock);
        fail_times(&breaker, 5);

        clock.advance(Duration::from_secs(10));
        let err = breaker.try_acquire().unwrap_err();
        assert_eq!(err.key, "rpc:test");
        assert_eq!(err.retry_after, Duration::from_secs(50));
        assert_eq!(breaker.state(), CircuitBreakerState::Open);

        clock.advance(Duration::from_secs(51));
        let probe = breaker.try_acquire().unwrap();
        assert!(probe.is_probe());
        assert_eq!(breaker.state(), CircuitBreakerState::HalfOpen);

        // second caller while the probe is out
        assert!(breaker.try_acquire().is_err());

        probe.success();
        assert_eq!(breaker.state(), CircuitBreakerState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);
    }

    #[test]
    fn failed_probe_reopens_with_fresh_timer() {
        let clock = Arc::new(ManualClock::new());
        let breaker = breaker(&clock);
        fail_times(&breaker, 5);

        clock.advance(Duration::from_secs(61));
        breaker.try_acquire().unwrap().failure();
        assert_eq!(breaker.state(), CircuitBreakerState::Open);

        clock.advance(Duration::from_secs(30));
        let err = breaker.try_acquire().unwrap_err();
        assert_eq!(err.retry_after, Duration::from_secs(30));
    }

    #[test]
    fn dropped_probe_counts_as_failure() {
        let clock = Arc::new(ManualClock::new());
        let breaker = breaker(&clock);
        fail_times(&breaker, 5);
        clock.advance(Duration::from_secs(60));

        drop(breaker.try_acquire().unwrap());
        assert_eq!(breaker.state(), CircuitBreakerState::Open);
    }

    #[test]
    fn straggler_outcomes_do_not_move_open_breaker() {
        let clock = Arc::new(ManualClock::new());
        let breaker = breaker(&clock);

        let late = breaker.try_acquire().unwrap();
        fail_times(&breaker, 5);
        late.success();

        assert_eq!(breaker.state(), CircuitBreakerState::Open);
    }

    #[tokio::test]
    async fn call_does_not_invoke_fn_while_open() {
        let clock = Arc::new(ManualClock::new());
        let breaker = breaker(&clock);
        let invoked = AtomicUsize::new(0);

        for _ in 0..5 {
            let result: Result<(), _> = breaker
                .call(|| async {
                    invoked.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("boom")
                })
                .await;
            assert!(matches!(result, Err(BreakerCallError::Inner("boom"))));
        }
        assert_eq!(invoked.load(Ordering::SeqCst), 5);

        for _ in 0..3 {
            let result = breaker
                .call(|| async {
                    invoked.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, &str>(())
                })
                .await;
            assert!(matches!(result, Err(BreakerCallError::Open(_))));
        }
        assert_eq!(invoked.load(Ordering::SeqCst), 5);
        assert_eq!(breaker.metrics().total_rejections, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_counts_as_failure() {
        let config = CircuitBreakerConfig {
            failure_threshold: 1,
            call_timeout: Duration::from_millis(100),
            ..Default::default()
        };
        let breaker = CircuitBreaker::new("quote:slow", config);

        let result = breaker
            .call(|| async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, ()>(())
            })
            .await;

        assert!(matches!(result, Err(BreakerCallError::Timeout { .. })));
        assert_eq!(breaker.state(), CircuitBreakerState::Open);
    }

    #[tokio::test]
    async fn non_failure_errors_keep_breaker_closed() {
        let config = CircuitBreakerConfig {
            failure_threshold: 1,
            ..Default::default()
        };
        let breaker = CircuitBreaker::new("rpc:a", config);

        let result = breaker
            .call_with(|| async { Err::<(), _>("insufficient funds") }, |_| false)
            .await;

        assert!(matches!(result, Err(BreakerCallError::Inner(_))));
        assert_eq!(breaker.state(), CircuitBreakerState::Closed);
    }
}
