//! Execution algorithm variants.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Algorithm tag used for hints, results and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmKind {
    /// Single slice, executed now.
    Immediate,
    /// Equal slices over a time window.
    Twap,
    /// Slices weighted by a volume profile.
    Vwap,
    /// Many small slices, each spread-checked.
    Iceberg,
}

impl AlgorithmKind {
    /// Label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Twap => "twap",
            Self::Vwap => "vwap",
            Self::Iceberg => "iceberg",
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// TWAP parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TwapParams {
    /// Number of slices.
    pub slices: usize,
    /// Total execution window.
    pub window: Duration,
    /// Send-time jitter as a fraction of the nominal interval.
    pub jitter: f64,
}

/// VWAP parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct VwapParams {
    /// Number of slices.
    pub slices: usize,
    /// Total execution window.
    pub window: Duration,
    /// Relative volume per bucket; resampled to `slices`. Empty uses a
    /// mid-window hump.
    pub profile: Vec<f64>,
    /// Send-time jitter as a fraction of the nominal interval.
    pub jitter: f64,
}

/// Iceberg parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct IcebergParams {
    /// Number of slices (at least the configured minimum).
    pub slices: usize,
    /// Nominal spacing between slices.
    pub interval: Duration,
    /// Quotes whose price impact exceeds this are rejected and re-quoted.
    pub max_price_impact_bps: u32,
    /// Send-time jitter as a fraction of the interval.
    pub jitter: f64,
}

/// How a parent order is worked.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionAlgorithm {
    /// Single slice, executed now.
    Immediate,
    /// Time-weighted.
    Twap(TwapParams),
    /// Volume-weighted.
    Vwap(VwapParams),
    /// Hidden size.
    Iceberg(IcebergParams),
}

impl ExecutionAlgorithm {
    /// Tag of this variant.
    #[must_use]
    pub const fn kind(&self) -> AlgorithmKind {
        match self {
            Self::Immediate => AlgorithmKind::Immediate,
            Self::Twap(_) => AlgorithmKind::Twap,
            Self::Vwap(_) => AlgorithmKind::Vwap,
            Self::Iceberg(_) => AlgorithmKind::Iceberg,
        }
    }

    /// Whether slices must run one after another in index order.
    #[must_use]
    pub const fn is_sequential(&self) -> bool {
        matches!(self, Self::Twap(_) | Self::Vwap(_))
    }

    /// Price impact ceiling checked before each slice, if any.
    #[must_use]
    pub const fn max_price_impact_bps(&self) -> Option<u32> {
        match self {
            Self::Iceberg(p) => Some(p.max_price_impact_bps),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let twap = ExecutionAlgorithm::Twap(TwapParams {
            slices: 10,
            window: Duration::from_secs(60),
            jitter: 0.4,
        });
        assert_eq!(twap.kind(), AlgorithmKind::Twap);
        assert!(twap.is_sequential());
        assert_eq!(twap.max_price_impact_bps(), None);

        let iceberg = ExecutionAlgorithm::Iceberg(IcebergParams {
            slices: 20,
            interval: Duration::from_secs(2),
            max_price_impact_bps: 50,
            jitter: 0.4,
        });
        assert!(!iceberg.is_sequential());
        assert_eq!(iceberg.max_price_impact_bps(), Some(50));
    }

    #[test]
    fn kind_serde() {
        let json = serde_json::to_string(&AlgorithmKind::Vwap).unwrap();
        assert_eq!(json, "\"vwap\"");
        let parsed: AlgorithmKind = serde_json::from_str("\"iceberg\"").unwrap();
        assert_eq!(parsed, AlgorithmKind::Iceberg);
    }
}
