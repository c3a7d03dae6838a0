//! Executed slice.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::ProviderId;

/// A landed swap for one slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Slice index.
    pub slice_index: usize,
    /// Token quantity.
    pub quantity: Decimal,
    /// Execution price in quote units per token.
    pub price: Decimal,
    /// Transaction signature.
    pub signature: String,
    /// RPC provider that accepted the transaction.
    pub provider: ProviderId,
    /// Priority fee paid.
    pub priority_fee_lamports: u64,
    /// When the fill was recorded.
    pub filled_at: DateTime<Utc>,
}
