//! Application Layer
//!
//! The application layer orchestrates domain logic through use cases.
//! It defines:
//!
//! - **Ports**: Interfaces for providers, signer, stores and event sinks
//! - **Services**: Long-lived components (health monitor, provider pools,
//!   fee estimator, exit monitor)
//! - **Use Cases**: Order submission and cancellation
//! - **Engine**: The facade callers talk to

pub mod engine;
pub mod ports;
pub mod services;
pub mod use_cases;

pub use engine::{EngineParts, EngineSettings, ExecutionEngine};
