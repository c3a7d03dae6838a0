//! Cancel Order Use Case
//!
//! Cancels the slices of an in-flight order that have not been scheduled.
//! Slices already sent cannot be recalled and settle normally; the order's
//! aggregate result reports the cancelled size.

use std::sync::Arc;

use super::submit_order::ActiveOrders;
use crate::domain::shared::OrderId;

/// Use case for cancelling orders.
#[derive(Debug, Clone)]
pub struct CancelOrderUseCase {
    active: Arc<ActiveOrders>,
}

impl CancelOrderUseCase {
    /// Create a new `CancelOrderUseCase`.
    #[must_use]
    pub const fn new(active: Arc<ActiveOrders>) -> Self {
        Self { active }
    }

    /// Request cancellation.
    ///
    /// Returns false when the order is unknown or has already completed.
    pub fn execute(&self, order_id: &OrderId) -> bool {
        let cancelled = self.active.cancel(order_id);
        if cancelled {
            tracing::info!(order_id = %order_id, "Cancellation requested");
        } else {
            tracing::debug!(order_id = %order_id, "Cancel ignored, order not in flight");
        }
        cancelled
    }
}
