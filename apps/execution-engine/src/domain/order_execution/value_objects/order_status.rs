//! Final status of a parent order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Every slice filled.
    Filled,
    /// Some slices filled; the shortfall is explicit.
    PartiallyFilled,
    /// Nothing filled.
    Failed,
    /// Cancelled before anything filled.
    Cancelled,
    /// Rejected by the risk gate.
    Denied,
}

impl OrderStatus {
    /// Label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Filled => "FILLED",
            Self::PartiallyFilled => "PARTIALLY_FILLED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Denied => "DENIED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
