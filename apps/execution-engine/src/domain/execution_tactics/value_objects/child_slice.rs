//! Child slice of a parent order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::OrderId;
use crate::error::ErrorInfo;

/// Slice lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SliceStatus {
    /// Planned, not yet started.
    Pending,
    /// Quote accepted and transaction sent.
    Submitted,
    /// Landed.
    Filled,
    /// Gave up after retries or a permanent error.
    Failed,
    /// Never scheduled because the order was cancelled or aborted.
    Cancelled,
}

impl SliceStatus {
    /// Whether the slice has reached a final state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Filled | Self::Failed | Self::Cancelled)
    }

    /// Label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::Filled => "filled",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// One child execution unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildSlice {
    /// Parent order.
    pub parent: OrderId,
    /// Sequence index (0-based).
    pub index: usize,
    /// Planned size in token units.
    pub planned_size: Decimal,
    /// Planned send time relative to order start.
    pub planned_offset_ms: u64,
    /// Current status.
    pub status: SliceStatus,
    /// Attempts made (quote + send cycles).
    pub attempts: u32,
    /// Filled size; equals `planned_size` when filled.
    pub filled_size: Decimal,
    /// Last error for failed slices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl ChildSlice {
    /// Create a pending slice.
    #[must_use]
    pub const fn new(
        parent: OrderId,
        index: usize,
        planned_size: Decimal,
        planned_offset_ms: u64,
    ) -> Self {
        Self {
            parent,
            index,
            planned_size,
            planned_offset_ms,
            status: SliceStatus::Pending,
            attempts: 0,
            filled_size: Decimal::ZERO,
            error: None,
        }
    }

    /// Mark as sent.
    pub fn mark_submitted(&mut self) {
        self.status = SliceStatus::Submitted;
    }

    /// Mark as filled.
    pub fn mark_filled(&mut self) {
        self.status = SliceStatus::Filled;
        self.filled_size = self.planned_size;
        self.error = None;
    }

    /// Mark as failed with the last error.
    pub fn mark_failed(&mut self, error: ErrorInfo) {
        self.status = SliceStatus::Failed;
        self.error = Some(error);
    }

    /// Mark as cancelled; no-op on terminal slices.
    pub fn mark_cancelled(&mut self) {
        if !self.status.is_terminal() {
            self.status = SliceStatus::Cancelled;
        }
    }
}
