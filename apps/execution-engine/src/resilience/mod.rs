//! Resilience patterns for upstream provider calls.
//!
//! Circuit breakers (one per dependency, held in a registry), an injectable
//! clock, and retry backoff.

mod circuit_breaker;
mod clock;
mod registry;
mod retry;

pub use circuit_breaker::{
    BreakerCallError, CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics,
    CircuitBreakerState, CircuitOpenError,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use registry::CircuitBreakerRegistry;
pub use retry::{
    ErrorCategory, ExponentialBackoffCalculator, RetryAfterExtractor, RetryPolicy,
    categorize_message, categorize_status, is_retryable_status,
};
