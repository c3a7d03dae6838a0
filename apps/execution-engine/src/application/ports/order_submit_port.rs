//! Order Submission Port (Driver Port)
//!
//! Lets the position monitor submit exits without depending on the use case
//! type that executes them.

use async_trait::async_trait;

use crate::domain::order_execution::{OrderRequest, OrderResult};

/// Submits an order and waits for its aggregate result.
#[async_trait]
pub trait OrderSubmitPort: Send + Sync {
    /// Execute `request` to completion.
    async fn submit(&self, request: OrderRequest) -> OrderResult;
}
