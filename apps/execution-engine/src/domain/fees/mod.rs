//! Fee Estimation Bounded Context
//!
//! Turns recent network prioritization fees and the order's urgency into a
//! priority-fee tier. Pure computation; sampling happens in the application
//! layer.

pub mod services;
pub mod value_objects;

pub use services::{FeeCalculator, FeePolicy};
pub use value_objects::{CongestionLevel, FeeEstimate, FeeTier};
