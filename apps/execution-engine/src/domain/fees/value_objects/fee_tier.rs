//! Priority fee tier.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::CongestionLevel;
use crate::domain::shared::Urgency;

/// Priority fee tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeTier {
    /// Cheapest.
    Low,
    /// Typical.
    Medium,
    /// Contested blocks.
    High,
    /// Land at any reasonable cost.
    Urgent,
}

impl FeeTier {
    /// Floor priority fee for the tier, in lamports.
    #[must_use]
    pub const fn base_lamports(self) -> u64 {
        match self {
            Self::Low => 1_000,
            Self::Medium => 10_000,
            Self::High => 100_000,
            Self::Urgent => 500_000,
        }
    }

    /// Tier used when no fee samples are available.
    #[must_use]
    pub const fn for_urgency(urgency: Urgency) -> Self {
        match urgency {
            Urgency::Low => Self::Low,
            Urgency::Medium => Self::Medium,
            Urgency::High => Self::High,
        }
    }

    /// Congestion x urgency matrix.
    #[must_use]
    pub const fn select(congestion: CongestionLevel, urgency: Urgency) -> Self {
        use CongestionLevel as C;
        match (congestion, urgency) {
            (C::Low, Urgency::Low | Urgency::Medium) | (C::Normal, Urgency::Low) => Self::Low,
            (C::Low, Urgency::High) | (C::Normal, Urgency::Medium) | (C::High, Urgency::Low) => {
                Self::Medium
            }
            (C::Normal, Urgency::High) | (C::High, Urgency::Medium) | (C::Extreme, Urgency::Low) => {
                Self::High
            }
            (C::High, Urgency::High) | (C::Extreme, Urgency::Medium | Urgency::High) => Self::Urgent,
        }
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Urgent => write!(f, "urgent"),
        }
    }
}
