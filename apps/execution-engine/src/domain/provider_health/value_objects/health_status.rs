//! Health status and the operational snapshot exposed to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ProviderRole;
use crate::domain::shared::ProviderId;

/// Derived provider status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Preferred for routing.
    Healthy,
    /// Used only when no healthy provider exists.
    Degraded,
    /// Not routed to.
    Unhealthy,
}

impl HealthStatus {
    /// Ordering key for ranking (lower is better).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Healthy => 0,
            Self::Degraded => 1,
            Self::Unhealthy => 2,
        }
    }

    /// Whether the pool may route to a provider in this status.
    #[must_use]
    pub const fn is_routable(self) -> bool {
        !matches!(self, Self::Unhealthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Point-in-time view of one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStatus {
    /// Provider id.
    pub id: ProviderId,
    /// Endpoint URL.
    pub endpoint: String,
    /// Role served.
    pub role: ProviderRole,
    /// Derived status.
    pub status: HealthStatus,
    /// Success rate over the window (0.0-1.0).
    pub success_rate: f64,
    /// Median latency of successful calls.
    pub latency_p50_ms: Option<u64>,
    /// 95th percentile latency of successful calls.
    pub latency_p95_ms: Option<u64>,
    /// Samples currently in the window.
    pub sample_count: usize,
    /// Time of the most recent sample.
    pub last_check: Option<DateTime<Utc>>,
}
