//! Network congestion level.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Congestion bucket derived from the median recent prioritization fee
/// (micro-lamports per compute unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CongestionLevel {
    /// Median below 1,000.
    Low,
    /// Median below 10,000.
    Normal,
    /// Median below 100,000.
    High,
    /// Anything above.
    Extreme,
}

impl CongestionLevel {
    /// Bucket a median fee.
    #[must_use]
    pub const fn from_median_micro_lamports(median: u64) -> Self {
        match median {
            0..1_000 => Self::Low,
            1_000..10_000 => Self::Normal,
            10_000..100_000 => Self::High,
            _ => Self::Extreme,
        }
    }
}

impl fmt::Display for CongestionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Normal => write!(f, "normal"),
            Self::High => write!(f, "high"),
            Self::Extreme => write!(f, "extreme"),
        }
    }
}
