//! Computed priority fee.

use serde::{Deserialize, Serialize};

use super::{CongestionLevel, FeeTier};

/// Priority fee to attach to one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimate {
    /// Selected tier.
    pub tier: FeeTier,
    /// Observed congestion; `None` when sampling failed.
    pub congestion: Option<CongestionLevel>,
    /// Total priority fee in lamports.
    pub priority_fee_lamports: u64,
    /// Compute unit price passed to the swap builder.
    pub compute_unit_price_micro_lamports: u64,
    /// Compute unit budget the price was derived for.
    pub compute_units: u32,
}
