//! Pre-trade risk limits.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::risk_management::RiskLimits;

/// Risk gate configuration. Notional values are in quote-token units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Maximum open (or closing) positions.
    #[serde(default = "default_max_open_positions")]
    pub max_open_positions: usize,
    /// Maximum notional of one position.
    #[serde(default = "default_max_position_notional")]
    pub max_position_notional: Decimal,
    /// Maximum notional across all positions.
    #[serde(default = "default_max_total_exposure")]
    pub max_total_exposure: Decimal,
    /// Maximum realized loss per UTC day.
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss: Decimal,
    /// Maximum accepted buys per rolling hour.
    #[serde(default = "default_max_orders_per_hour")]
    pub max_orders_per_hour: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self::from(RiskLimits::default())
    }
}

impl From<RiskLimits> for RiskConfig {
    fn from(limits: RiskLimits) -> Self {
        Self {
            max_open_positions: limits.max_open_positions,
            max_position_notional: limits.max_position_notional,
            max_total_exposure: limits.max_total_exposure,
            max_daily_loss: limits.max_daily_loss,
            max_orders_per_hour: limits.max_orders_per_hour,
        }
    }
}

impl RiskConfig {
    /// Domain limits.
    #[must_use]
    pub const fn to_limits(&self) -> RiskLimits {
        RiskLimits {
            max_open_positions: self.max_open_positions,
            max_position_notional: self.max_position_notional,
            max_total_exposure: self.max_total_exposure,
            max_daily_loss: self.max_daily_loss,
            max_orders_per_hour: self.max_orders_per_hour,
        }
    }
}

fn default_max_open_positions() -> usize {
    RiskLimits::default().max_open_positions
}

fn default_max_position_notional() -> Decimal {
    RiskLimits::default().max_position_notional
}

fn default_max_total_exposure() -> Decimal {
    RiskLimits::default().max_total_exposure
}

fn default_max_daily_loss() -> Decimal {
    RiskLimits::default().max_daily_loss
}

fn default_max_orders_per_hour() -> u32 {
    RiskLimits::default().max_orders_per_hour
}
