//! Priority fee configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::fees::FeePolicy;

/// Fee estimator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeesConfig {
    /// Hard cap on the priority fee (lamports).
    #[serde(default = "default_max_priority_fee")]
    pub max_priority_fee_lamports: u64,
    /// Compute unit budget used to convert lamports to a unit price.
    #[serde(default = "default_compute_units")]
    pub compute_units: u32,
    /// How long sampled fees are reused (seconds).
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for FeesConfig {
    fn default() -> Self {
        Self {
            max_priority_fee_lamports: default_max_priority_fee(),
            compute_units: default_compute_units(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

impl FeesConfig {
    /// Fee limits.
    #[must_use]
    pub const fn to_policy(&self) -> FeePolicy {
        FeePolicy {
            max_priority_fee_lamports: self.max_priority_fee_lamports,
            compute_units: self.compute_units,
        }
    }

    /// Sample cache lifetime.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

const fn default_max_priority_fee() -> u64 {
    1_000_000
}

const fn default_compute_units() -> u32 {
    200_000
}

const fn default_cache_ttl() -> u64 {
    10
}
