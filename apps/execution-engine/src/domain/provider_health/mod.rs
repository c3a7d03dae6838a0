//! Provider Health Bounded Context
//!
//! Tracks liveness and latency of interchangeable upstream endpoints (RPC and
//! quote providers) in a rolling window and derives a status from it.
//!
//! - `healthy`: success rate >= 90% and p95 latency below the ceiling
//! - `degraded`: success rate >= 50%
//! - `unhealthy`: otherwise
//!
//! Providers are created at configuration load and never removed; they are
//! only marked unhealthy.

pub mod aggregate;
pub mod services;
pub mod value_objects;

pub use aggregate::{ProbeSample, ProviderHealth, StatusChange};
pub use services::rank_candidates;
pub use value_objects::{HealthPolicy, HealthStatus, Provider, ProviderRole, ProviderStatus};
