//! Retry policies with exponential backoff for provider calls.
//!
//! # Retryable Errors
//!
//! | Retryable | Non-Retryable |
//! |-----------|---------------|
//! | HTTP 429 (Rate Limited) | HTTP 400 (Bad Request) |
//! | HTTP 408, 5xx | HTTP 401/403 (Auth Errors) |
//! | Network timeouts | Insufficient funds or liquidity |
//! | Connection reset | Invalid mint or account |
//!
//! # Example
//!
//! ```rust,ignore
//! use dex_execution_engine::resilience::{ExponentialBackoffCalculator, RetryPolicy};
//!
//! let policy = RetryPolicy::default();
//! let mut backoff = ExponentialBackoffCalculator::new(&policy);
//!
//! let delay1 = backoff.next_backoff(); // ~200ms with jitter
//! let delay2 = backoff.next_backoff(); // ~400ms with jitter
//! ```

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Retry policy for slice attempts and provider calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt (default: 3).
    pub max_attempts: u32,
    /// Initial backoff duration (default: 200ms).
    pub initial_backoff: Duration,
    /// Maximum backoff duration (default: 5s).
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential growth (default: 2.0).
    pub backoff_multiplier: f64,
    /// Jitter factor for randomization (default: 0.2 = ±20%).
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter_factor: 0.2,
        }
    }
}

/// Calculator for exponential backoff with jitter.
#[derive(Debug)]
pub struct ExponentialBackoffCalculator {
    current_attempt: u32,
    max_attempts: u32,
    initial_backoff_ms: u64,
    max_backoff_ms: u64,
    backoff_multiplier: f64,
    jitter_factor: f64,
}

impl ExponentialBackoffCalculator {
    /// Create a new backoff calculator from a retry policy.
    #[must_use]
    pub const fn new(policy: &RetryPolicy) -> Self {
        Self {
            current_attempt: 0,
            max_attempts: policy.max_attempts,
            initial_backoff_ms: policy.initial_backoff.as_millis() as u64,
            max_backoff_ms: policy.max_backoff.as_millis() as u64,
            jitter_factor: policy.jitter_factor,
            backoff_multiplier: policy.backoff_multiplier,
        }
    }

    /// Get the next backoff duration with jitter.
    ///
    /// Returns `None` if max attempts exceeded.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.current_attempt >= self.max_attempts {
            return None;
        }

        let base_backoff_ms = self.calculate_base_backoff_ms();
        let jittered_ms = self.apply_jitter(base_backoff_ms);
        let capped_ms = jittered_ms.min(self.max_backoff_ms);

        self.current_attempt += 1;

        Some(Duration::from_millis(capped_ms))
    }

    /// Next delay, preferring a server-provided hint when present.
    pub fn next_backoff_or(&mut self, hint: Option<Duration>) -> Option<Duration> {
        match hint {
            Some(delay) if self.has_remaining_attempts() => {
                self.current_attempt += 1;
                Some(delay.min(Duration::from_millis(self.max_backoff_ms)))
            }
            _ => self.next_backoff(),
        }
    }

    fn calculate_base_backoff_ms(&self) -> u64 {
        let multiplier = self.backoff_multiplier.powi(self.current_attempt as i32);
        let backoff = (self.initial_backoff_ms as f64 * multiplier) as u64;
        backoff.min(self.max_backoff_ms)
    }

    /// Random value in [backoff * (1 - jitter), backoff * (1 + jitter)].
    fn apply_jitter(&self, backoff_ms: u64) -> u64 {
        if self.jitter_factor <= 0.0 {
            return backoff_ms;
        }
        let jitter_range = backoff_ms as f64 * self.jitter_factor;
        let min = (backoff_ms as f64 - jitter_range).max(0.0);
        let max = backoff_ms as f64 + jitter_range;

        rand::rng().random_range(min..=max) as u64
    }

    /// Get the current attempt number.
    #[must_use]
    pub const fn current_attempt(&self) -> u32 {
        self.current_attempt
    }

    /// Check if more retries are available.
    #[must_use]
    pub const fn has_remaining_attempts(&self) -> bool {
        self.current_attempt < self.max_attempts
    }
}

/// Check if an HTTP status code is retryable.
#[must_use]
pub fn is_retryable_status(status_code: u16) -> bool {
    matches!(categorize_status(status_code), ErrorCategory::Retryable | ErrorCategory::RateLimited)
}

/// Error categories for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transient failure.
    Retryable,
    /// Permanent failure.
    NonRetryable,
    /// Rate limited; honor Retry-After if available.
    RateLimited,
}

/// Categorize an HTTP response status.
#[must_use]
pub const fn categorize_status(status_code: u16) -> ErrorCategory {
    match status_code {
        429 => ErrorCategory::RateLimited,
        408 => ErrorCategory::Retryable,
        400..=499 => ErrorCategory::NonRetryable,
        500..=599 => ErrorCategory::Retryable,
        _ => ErrorCategory::NonRetryable,
    }
}

/// Categorize a provider error message.
#[must_use]
pub fn categorize_message(error_message: &str) -> ErrorCategory {
    let lower = error_message.to_lowercase();

    if lower.contains("rate limit") || lower.contains("too many requests") {
        return ErrorCategory::RateLimited;
    }

    if lower.contains("insufficient")
        || lower.contains("invalid mint")
        || lower.contains("invalid account")
        || lower.contains("token not tradable")
        || lower.contains("could not find any route")
    {
        return ErrorCategory::NonRetryable;
    }

    // unknown errors are assumed transient
    ErrorCategory::Retryable
}

/// Extract Retry-After duration from HTTP headers.
pub struct RetryAfterExtractor;

impl RetryAfterExtractor {
    /// Parse a Retry-After header value in seconds.
    #[must_use]
    pub fn parse(value: &str) -> Option<Duration> {
        value.trim().parse::<u64>().ok().map(Duration::from_secs)
    }
}
