//! Provider Health Aggregate

mod provider_health;

pub use provider_health::{ProbeSample, ProviderHealth, StatusChange};
