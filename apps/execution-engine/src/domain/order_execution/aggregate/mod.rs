//! Order Result Aggregate
//!
//! The aggregate outcome of a parent order. It is what callers receive and
//! what the idempotency store caches.

mod order_result;

pub use order_result::OrderResult;
