//! Position value objects.

mod exit_plan;
mod exit_trigger;
mod position_status;

pub use exit_plan::{ExitPlan, LadderRung, LadderRungSpec, PriceLevel, RungState, TrailingStop};
pub use exit_trigger::ExitTrigger;
pub use position_status::PositionStatus;
