//! Exit trigger produced by position evaluation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Why an exit fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitTrigger {
    /// Price at or below the stop; exit the whole position.
    StopLoss {
        /// Observed price.
        price: Decimal,
    },
    /// Ladder rung crossed; exit that rung's fraction.
    TakeProfit {
        /// Rung index.
        rung: usize,
        /// Observed price.
        price: Decimal,
    },
    /// Price collapsed past the emergency level; exit the whole position.
    Emergency {
        /// Observed price.
        price: Decimal,
    },
    /// Held longer than allowed; exit the whole position.
    MaxHold {
        /// Seconds held.
        held_secs: u64,
    },
}

impl ExitTrigger {
    /// Short label used in exit order ids, logs and metrics.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::StopLoss { .. } => "sl".to_string(),
            Self::TakeProfit { rung, .. } => format!("tp{rung}"),
            Self::Emergency { .. } => "emergency".to_string(),
            Self::MaxHold { .. } => "maxhold".to_string(),
        }
    }

    /// Metric label without the rung index.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::StopLoss { .. } => "stop_loss",
            Self::TakeProfit { .. } => "take_profit",
            Self::Emergency { .. } => "emergency",
            Self::MaxHold { .. } => "max_hold",
        }
    }

    /// Whether the trigger exits the full remaining size.
    #[must_use]
    pub const fn is_full_exit(&self) -> bool {
        matches!(
            self,
            Self::StopLoss { .. } | Self::Emergency { .. } | Self::MaxHold { .. }
        )
    }
}
