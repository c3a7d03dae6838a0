//! Position Bounded Context
//!
//! A position is opened by the first fill of a buy order and supervised by
//! the exit monitor until its size reaches zero. Status only moves forward:
//! `open -> closing -> closed`.
//!
//! Positions and orders live in separate keyed stores; a position refers to
//! its pending exit order by id only.

pub mod aggregate;
pub mod errors;
pub mod events;
pub mod repository;
pub mod value_objects;

pub use aggregate::{ExitOrder, ExitSettlement, PendingExit, Position};
pub use errors::PositionError;
pub use events::{PositionUpdate, PositionUpdateReason};
pub use repository::{PositionMutation, PositionRepository};
pub use value_objects::{
    ExitPlan, ExitTrigger, LadderRung, LadderRungSpec, PositionStatus, PriceLevel, RungState,
    TrailingStop,
};
