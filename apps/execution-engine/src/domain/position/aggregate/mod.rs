//! Position Aggregate

mod position;

pub use position::{ExitOrder, ExitSettlement, PendingExit, Position};
