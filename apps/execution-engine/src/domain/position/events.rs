//! Position update notifications.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::aggregate::Position;
use super::value_objects::{ExitTrigger, PositionStatus};
use crate::domain::shared::{OrderId, PositionId};

/// What changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PositionUpdateReason {
    /// First buy fill.
    Opened,
    /// Additional buy fill.
    Increased,
    /// Exit monitor started an exit.
    ExitStarted {
        /// Trigger.
        trigger: ExitTrigger,
    },
    /// Exit order completed.
    ExitSettled,
    /// Caller-initiated sell.
    Reduced,
}

/// Notification published whenever a position changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    /// Position id.
    pub position_id: PositionId,
    /// Token mint.
    pub mint: String,
    /// Status after the change.
    pub status: PositionStatus,
    /// Remaining size.
    pub size: Decimal,
    /// Entry price.
    pub entry_price: Decimal,
    /// Cumulative realized P&L.
    pub realized_pnl: Decimal,
    /// Order that caused the change.
    pub order_id: Option<OrderId>,
    /// What changed.
    pub reason: PositionUpdateReason,
    /// When.
    pub at: DateTime<Utc>,
}

impl PositionUpdate {
    /// Snapshot a position after a change.
    #[must_use]
    pub fn from_position(
        position: &Position,
        order_id: Option<OrderId>,
        reason: PositionUpdateReason,
    ) -> Self {
        Self {
            position_id: position.id().clone(),
            mint: position.token().mint.clone(),
            status: position.status(),
            size: position.size(),
            entry_price: position.entry_price(),
            realized_pnl: position.realized_pnl(),
            order_id,
            reason,
            at: position.updated_at(),
        }
    }
}
