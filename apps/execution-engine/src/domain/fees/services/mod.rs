//! Fee domain services.

mod fee_calculator;

pub use fee_calculator::{FeeCalculator, FeePolicy};
