//! Risk decision.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason a buy was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    /// Too many concurrent positions.
    MaxOpenPositions,
    /// Resulting position notional above limit.
    PositionNotionalExceeded,
    /// Resulting aggregate exposure above limit.
    TotalExposureExceeded,
    /// Daily realized loss limit reached.
    DailyLossExceeded,
    /// Too many orders in the last hour.
    OrderRateExceeded,
    /// Sell not covered by an active position of at least its size.
    NotReduceOnly,
}

impl DenyReason {
    /// Stable reason code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MaxOpenPositions => "MAX_OPEN_POSITIONS",
            Self::PositionNotionalExceeded => "POSITION_NOTIONAL_EXCEEDED",
            Self::TotalExposureExceeded => "TOTAL_EXPOSURE_EXCEEDED",
            Self::DailyLossExceeded => "DAILY_LOSS_EXCEEDED",
            Self::OrderRateExceeded => "ORDER_RATE_EXCEEDED",
            Self::NotReduceOnly => "NOT_REDUCE_ONLY",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Structured denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDenial {
    /// Reason code.
    pub reason: DenyReason,
    /// Human-readable message.
    pub message: String,
    /// Observed value.
    pub observed: String,
    /// Configured limit.
    pub limit: String,
}

impl RiskDenial {
    /// Create a denial.
    #[must_use]
    pub fn new(
        reason: DenyReason,
        message: impl Into<String>,
        observed: impl ToString,
        limit: impl ToString,
    ) -> Self {
        Self {
            reason,
            message: message.into(),
            observed: observed.to_string(),
            limit: limit.to_string(),
        }
    }
}

impl fmt::Display for RiskDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (observed {}, limit {})",
            self.reason, self.message, self.observed, self.limit
        )
    }
}

/// Outcome of the risk gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskDecision {
    /// Proceed.
    Allow,
    /// Do not trade.
    Deny(RiskDenial),
}

impl RiskDecision {
    /// Whether the order may proceed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}
