//! Market and activity context for a risk decision.

use rust_decimal::Decimal;

/// Inputs to the risk gate beyond positions and P&L.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskContext {
    /// Price used to value the order (quote units per token).
    pub reference_price: Decimal,
    /// Buy orders accepted in the last hour.
    pub orders_last_hour: u32,
    /// Approved buys still executing that will open a new position.
    pub pending_new_positions: usize,
    /// Notional of approved buys whose fills are not yet applied.
    pub pending_notional: Decimal,
}

impl RiskContext {
    /// Context with nothing reserved.
    #[must_use]
    pub const fn new(reference_price: Decimal, orders_last_hour: u32) -> Self {
        Self {
            reference_price,
            orders_last_hour,
            pending_new_positions: 0,
            pending_notional: Decimal::ZERO,
        }
    }
}
