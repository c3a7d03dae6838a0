//! Position lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position status. Transitions are forward-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    /// Held, no exit started.
    Open,
    /// At least one exit started; size not yet zero.
    Closing,
    /// Size reached zero.
    Closed,
}

impl PositionStatus {
    /// Whether the monitor should evaluate this position.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Open | Self::Closing)
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
        }
    }
}
