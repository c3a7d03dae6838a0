//! Fee value objects.

mod congestion;
mod fee_estimate;
mod fee_tier;

pub use congestion::CongestionLevel;
pub use fee_estimate::FeeEstimate;
pub use fee_tier::FeeTier;
