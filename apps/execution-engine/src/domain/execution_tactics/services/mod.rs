//! Execution Tactics Domain Services

mod slice_planner;
mod tactic_selector;

pub use slice_planner::plan_slices;
pub use tactic_selector::{SelectionContext, SelectionPolicy, TacticSelector};
