//! Provider health value objects.

mod health_policy;
mod health_status;
mod provider;

pub use health_policy::HealthPolicy;
pub use health_status::{HealthStatus, ProviderStatus};
pub use provider::{Provider, ProviderRole};
