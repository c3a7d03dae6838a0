//! Persistence Adapters
//!
//! In-process implementations of the position and idempotency stores.
//! State does not survive a restart.

pub mod in_memory;

pub use in_memory::{InMemoryIdempotencyStore, InMemoryPositionRepository};
