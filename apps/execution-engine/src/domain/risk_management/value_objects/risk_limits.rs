//! Risk limits.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Limits applied by the risk gate. Notional values are in quote units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Maximum concurrently open (or closing) positions.
    pub max_open_positions: usize,
    /// Maximum notional of any one position after the order.
    pub max_position_notional: Decimal,
    /// Maximum notional across all positions after the order.
    pub max_total_exposure: Decimal,
    /// Maximum realized loss per UTC day, as a positive amount.
    pub max_daily_loss: Decimal,
    /// Maximum accepted buy orders per rolling hour.
    pub max_orders_per_hour: u32,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_open_positions: 5,
            max_position_notional: Decimal::new(1_000, 0),
            max_total_exposure: Decimal::new(5_000, 0),
            max_daily_loss: Decimal::new(500, 0),
            max_orders_per_hour: 30,
        }
    }
}
