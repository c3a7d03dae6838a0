//! Order Execution Bounded Context
//!
//! Request, fill and result types for parent orders, plus the idempotency
//! store contract.
//!
//! # Key Concepts
//!
//! - **OrderRequest**: immutable once accepted; its id is the caller's
//!   idempotency key
//! - **OrderResult**: aggregate of every slice outcome; partial fills report
//!   filled, failed and cancelled sizes explicitly
//! - **Idempotency**: a completed result is returned unchanged for a repeated
//!   id; concurrent duplicates wait for the first submission

pub mod aggregate;
pub mod errors;
pub mod repository;
pub mod value_objects;

pub use aggregate::OrderResult;
pub use errors::OrderError;
pub use repository::{IdempotencyClaim, IdempotencyStore};
pub use value_objects::{Fill, OrderRequest, OrderStatus};
