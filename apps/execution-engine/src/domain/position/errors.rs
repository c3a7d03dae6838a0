//! Position errors.

use thiserror::Error;

use super::value_objects::PositionStatus;

/// Errors raised by the position aggregate and its repository.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PositionError {
    /// No position with this id.
    #[error("position not found: {position_id}")]
    NotFound {
        /// Position id.
        position_id: String,
    },

    /// Insert collided with an existing position.
    #[error("position already exists: {position_id}")]
    AlreadyExists {
        /// Position id.
        position_id: String,
    },

    /// Price feed value unusable for evaluation.
    #[error("invalid price: {price}")]
    InvalidPrice {
        /// Offending value.
        price: String,
    },

    /// Backward status transition attempted.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: PositionStatus,
        /// Requested status.
        to: PositionStatus,
    },

    /// An exit is already pending.
    #[error("exit already pending: {order_id}")]
    ExitPending {
        /// Pending exit order.
        order_id: String,
    },

    /// Settlement does not match the pending exit.
    #[error("exit mismatch: expected {expected}, got {actual}")]
    ExitMismatch {
        /// Pending exit order id, or `none`.
        expected: String,
        /// Order id being settled.
        actual: String,
    },

    /// Nothing left to exit.
    #[error("nothing to exit: {reason}")]
    NothingToExit {
        /// Detail.
        reason: String,
    },

    /// Exit plan failed validation.
    #[error("invalid exit plan: {message}")]
    InvalidExitPlan {
        /// Detail.
        message: String,
    },
}
