//! One circuit breaker per upstream dependency.
//!
//! Breakers are created lazily on first use and live for the process
//! lifetime. Nothing is persisted: a restart begins with every breaker
//! `CLOSED`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics};
use super::clock::{Clock, SystemClock};

/// Shared, read-mostly map of breakers keyed by dependency.
#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
}

impl CircuitBreakerRegistry {
    /// Create a registry on the system clock.
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a registry whose breakers share an injected clock.
    #[must_use]
    pub fn with_clock(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            breakers: RwLock::new(HashMap::new()),
        }
    }

    /// Breaker for `key`, created on first use.
    pub fn breaker(&self, key: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.read().get(key) {
            return Arc::clone(existing);
        }

        let mut breakers = self.breakers.write();
        Arc::clone(breakers.entry(key.to_string()).or_insert_with(|| {
            Arc::new(CircuitBreaker::with_clock(
                key,
                self.config.clone(),
                Arc::clone(&self.clock),
            ))
        }))
    }

    /// Existing breaker for `key`, if any call has been made through it.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.read().get(key).cloned()
    }

    /// Metrics for every known breaker, sorted by key.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CircuitBreakerMetrics> {
        let mut all: Vec<_> = self.breakers.read().values().map(|b| b.metrics()).collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        all
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::CircuitBreakerState;

    #[test]
    fn same_key_returns_same_breaker() {
        let registry = CircuitBreakerRegistry::default();
        let a = registry.breaker("rpc:a");
        let again = registry.breaker("rpc:a");
        assert!(Arc::ptr_eq(&a, &again));
    }

    #[test]
    fn breakers_are_isolated_per_key() {
        let registry = CircuitBreakerRegistry::default();
        let a = registry.breaker("rpc:a");
        for _ in 0..5 {
            a.try_acquire().unwrap().failure();
        }

        assert_eq!(a.state(), CircuitBreakerState::Open);
        assert_eq!(registry.breaker("rpc:b").state(), CircuitBreakerState::Closed);
        assert!(registry.get("rpc:c").is_none());
    }

    #[test]
    fn snapshot_is_sorted() {
        let registry = CircuitBreakerRegistry::default();
        registry.breaker("quote:z");
        registry.breaker("quote:a");
        let keys: Vec<_> = registry.snapshot().into_iter().map(|m| m.key).collect();
        assert_eq!(keys, vec!["quote:a", "quote:z"]);
    }
}
