//! Idempotency Store Trait
//!
//! Keyed by order id. `claim` is an atomic check-and-insert: exactly one
//! caller per id receives [`IdempotencyClaim::Acquired`] and must later call
//! `complete`.

use async_trait::async_trait;

use super::aggregate::OrderResult;
use crate::domain::shared::OrderId;

/// Outcome of an idempotency claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdempotencyClaim {
    /// Caller owns execution of this id.
    Acquired,
    /// Another caller is executing this id; wait for its result.
    InFlight,
    /// Already executed; the cached result.
    Completed(Box<OrderResult>),
}

/// Shared at-most-once execution record.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Atomically claim `id` or report its current state.
    async fn claim(&self, id: &OrderId) -> IdempotencyClaim;

    /// Store the final result and wake waiters.
    async fn complete(&self, id: &OrderId, result: OrderResult);

    /// Wait until `id` completes. Returns `None` if the id was never claimed.
    async fn wait(&self, id: &OrderId) -> Option<OrderResult>;

    /// Completed result, if any.
    async fn get(&self, id: &OrderId) -> Option<OrderResult>;

    /// Whether `id` is claimed but not complete.
    async fn is_in_flight(&self, id: &OrderId) -> bool;
}
