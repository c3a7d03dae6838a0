//! HTTP request DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::execution_tactics::AlgorithmKind;
use crate::domain::order_execution::OrderRequest;
use crate::domain::position::ExitPlan;
use crate::domain::shared::{OrderId, PositionId, Side, Token, Urgency};

/// Body of `POST /api/v1/orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOrderRequest {
    /// Idempotency key; generated when absent.
    #[serde(default)]
    pub client_order_id: Option<String>,
    /// Token mint.
    pub mint: String,
    /// Mint decimals.
    pub decimals: u8,
    /// Buy or sell.
    pub side: Side,
    /// Size in whole tokens.
    pub size: Decimal,
    /// Slippage tolerance.
    pub max_slippage_bps: u32,
    /// Caller urgency.
    #[serde(default)]
    pub urgency: Urgency,
    /// Force an algorithm.
    #[serde(default)]
    pub algorithm: Option<AlgorithmKind>,
    /// Reference price for the slippage check.
    #[serde(default)]
    pub expected_price: Option<Decimal>,
    /// Position to add to or reduce.
    #[serde(default)]
    pub position_id: Option<String>,
    /// Exit plan for the position a buy opens.
    #[serde(default)]
    pub exit_plan: Option<ExitPlan>,
}

impl From<SubmitOrderRequest> for OrderRequest {
    fn from(req: SubmitOrderRequest) -> Self {
        Self {
            id: req
                .client_order_id
                .map_or_else(OrderId::generate, OrderId::new),
            token: Token::new(req.mint, req.decimals),
            side: req.side,
            size: req.size,
            max_slippage_bps: req.max_slippage_bps,
            urgency: req.urgency,
            algorithm_hint: req.algorithm,
            expected_price: req.expected_price,
            position_id: req.position_id.map(PositionId::new),
            exit_plan: req.exit_plan,
        }
    }
}
