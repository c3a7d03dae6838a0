//! Order request.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::execution_tactics::AlgorithmKind;
use crate::domain::order_execution::errors::OrderError;
use crate::domain::position::ExitPlan;
use crate::domain::shared::{OrderId, PositionId, Side, Token, Urgency};

const MAX_SLIPPAGE_BPS: u32 = 10_000;
const MAX_TOKEN_DECIMALS: u8 = 18;

/// A caller's request to trade. Immutable once accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Caller-supplied idempotency key.
    pub id: OrderId,
    /// Token traded against the configured quote token.
    pub token: Token,
    /// Buy or sell.
    pub side: Side,
    /// Total size in token units.
    pub size: Decimal,
    /// Maximum deviation of the quoted price from the expected price.
    pub max_slippage_bps: u32,
    /// Caller urgency.
    #[serde(default)]
    pub urgency: Urgency,
    /// Force a specific algorithm.
    #[serde(default)]
    pub algorithm_hint: Option<AlgorithmKind>,
    /// Reference price for slippage checks; market price at acceptance when
    /// absent.
    #[serde(default)]
    pub expected_price: Option<Decimal>,
    /// Position to add to (buy) or reduce (sell).
    #[serde(default)]
    pub position_id: Option<PositionId>,
    /// Exit plan for the position a buy opens.
    #[serde(default)]
    pub exit_plan: Option<ExitPlan>,
}

impl OrderRequest {
    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::InvalidParameters`] naming the first bad field.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.id.as_str().trim().is_empty() {
            return Err(OrderError::invalid("id", "must not be empty"));
        }
        if self.token.mint.trim().is_empty() {
            return Err(OrderError::invalid("token.mint", "must not be empty"));
        }
        if self.token.decimals > MAX_TOKEN_DECIMALS {
            return Err(OrderError::invalid(
                "token.decimals",
                format!("must be at most {MAX_TOKEN_DECIMALS}"),
            ));
        }
        if self.token.round(self.size) <= Decimal::ZERO {
            return Err(OrderError::invalid(
                "size",
                format!("must be positive at token precision: {}", self.size),
            ));
        }
        if self.max_slippage_bps > MAX_SLIPPAGE_BPS {
            return Err(OrderError::invalid(
                "max_slippage_bps",
                format!("must be at most {MAX_SLIPPAGE_BPS}"),
            ));
        }
        if self.expected_price.is_some_and(|p| p <= Decimal::ZERO) {
            return Err(OrderError::invalid("expected_price", "must be positive"));
        }
        if let Some(plan) = &self.exit_plan {
            if self.side == Side::Sell {
                return Err(OrderError::invalid("exit_plan", "only valid on buy orders"));
            }
            plan.validate()
                .map_err(|e| OrderError::invalid("exit_plan", e.to_string()))?;
        }
        Ok(())
    }

    /// Position a buy fill lands in: the referenced one, or one derived from
    /// the order id.
    #[must_use]
    pub fn target_position_id(&self) -> PositionId {
        self.position_id
            .clone()
            .unwrap_or_else(|| PositionId::for_order(&self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> OrderRequest {
        OrderRequest {
            id: OrderId::new("o-1"),
            token: Token::new("MINT", 6),
            side: Side::Buy,
            size: dec!(10),
            max_slippage_bps: 100,
            urgency: Urgency::Medium,
            algorithm_hint: None,
            expected_price: None,
            position_id: None,
            exit_plan: None,
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn rejects_zero_size() {
        let mut r = request();
        r.size = dec!(0.0000001);
        let err = r.validate().unwrap_err();
        assert!(err.to_string().contains("size"));
    }

    #[test]
    fn rejects_excessive_slippage() {
        let mut r = request();
        r.max_slippage_bps = 10_001;
        assert!(r.validate().is_err());
    }

    #[test]
    fn rejects_exit_plan_on_sell() {
        let mut r = request();
        r.side = Side::Sell;
        r.exit_plan = Some(ExitPlan::default_spot());
        assert!(r.validate().is_err());
    }

    #[test]
    fn target_position_defaults_to_order() {
        let r = request();
        assert_eq!(r.target_position_id().as_str(), "pos-o-1");
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{
            "id": "abc",
            "token": {"mint": "So11111111111111111111111111111111111111112", "decimals": 9},
            "side": "buy",
            "size": "1.5",
            "max_slippage_bps": 50
        }"#;
        let r: OrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(r.urgency, Urgency::Medium);
        assert!(r.algorithm_hint.is_none());
        assert!(r.validate().is_ok());
    }
}
