//! Order Result Aggregate Root

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::execution_tactics::{AlgorithmKind, ChildSlice, SliceStatus};
use crate::domain::order_execution::value_objects::{Fill, OrderRequest, OrderStatus};
use crate::domain::risk_management::RiskDenial;
use crate::domain::shared::{OrderId, PositionId, Side};
use crate::error::{ErrorCode, ErrorInfo, ExecutionError};

/// Aggregate result of a parent order.
///
/// `filled_size + failed_size + cancelled_size == requested_size` whenever
/// slices were planned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
    /// Order id.
    pub order_id: OrderId,
    /// Token mint.
    pub mint: String,
    /// Side.
    pub side: Side,
    /// Final status.
    pub status: OrderStatus,
    /// Algorithm used; `None` if the order never reached planning.
    pub algorithm: Option<AlgorithmKind>,
    /// Requested size.
    pub requested_size: Decimal,
    /// Filled size.
    pub filled_size: Decimal,
    /// Size of slices that failed.
    pub failed_size: Decimal,
    /// Size of slices that were never scheduled.
    pub cancelled_size: Decimal,
    /// `requested_size - filled_size`.
    pub shortfall: Decimal,
    /// Volume-weighted fill price.
    pub average_price: Option<Decimal>,
    /// Landed slices.
    pub fills: Vec<Fill>,
    /// Every planned slice with its outcome.
    pub slices: Vec<ChildSlice>,
    /// Risk denial, for `DENIED` orders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<RiskDenial>,
    /// Error summary for anything short of a full fill.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    /// Position affected by the fills.
    pub position_id: Option<PositionId>,
    /// When execution started.
    pub started_at: DateTime<Utc>,
    /// When the result was finalized.
    pub completed_at: DateTime<Utc>,
}

impl OrderResult {
    fn base(request: &OrderRequest, status: OrderStatus, now: DateTime<Utc>) -> Self {
        Self {
            order_id: request.id.clone(),
            mint: request.token.mint.clone(),
            side: request.side,
            status,
            algorithm: None,
            requested_size: request.size,
            filled_size: Decimal::ZERO,
            failed_size: Decimal::ZERO,
            cancelled_size: Decimal::ZERO,
            shortfall: request.size,
            average_price: None,
            fills: Vec::new(),
            slices: Vec::new(),
            denial: None,
            error: None,
            position_id: request.position_id.clone(),
            started_at: now,
            completed_at: now,
        }
    }

    /// Result for an order the risk gate rejected.
    #[must_use]
    pub fn denied(request: &OrderRequest, denial: RiskDenial, now: DateTime<Utc>) -> Self {
        let mut result = Self::base(request, OrderStatus::Denied, now);
        result.denial = Some(denial);
        result
    }

    /// Result for an order that failed before any slice was planned.
    #[must_use]
    pub fn failed(request: &OrderRequest, error: &ExecutionError, now: DateTime<Utc>) -> Self {
        let mut result = Self::base(request, OrderStatus::Failed, now);
        result.failed_size = request.size;
        result.error = Some(error.to_info());
        result
    }

    /// Aggregate slice outcomes.
    ///
    /// `abort` is the order-level error that stopped scheduling, if any; it
    /// takes precedence over slice errors in the summary.
    #[must_use]
    pub fn from_slices(
        request: &OrderRequest,
        algorithm: AlgorithmKind,
        slices: Vec<ChildSlice>,
        fills: Vec<Fill>,
        abort: Option<&ExecutionError>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let sum = |status: SliceStatus| -> Decimal {
            slices
                .iter()
                .filter(|s| s.status == status)
                .map(|s| s.planned_size)
                .sum()
        };

        let filled_size: Decimal = fills.iter().map(|f| f.quantity).sum();
        let failed_size = sum(SliceStatus::Failed);
        let cancelled_size = sum(SliceStatus::Cancelled) + sum(SliceStatus::Pending);

        let status = if filled_size > Decimal::ZERO && failed_size + cancelled_size == Decimal::ZERO
        {
            OrderStatus::Filled
        } else if filled_size > Decimal::ZERO {
            OrderStatus::PartiallyFilled
        } else if failed_size == Decimal::ZERO && cancelled_size > Decimal::ZERO && abort.is_none()
        {
            OrderStatus::Cancelled
        } else {
            OrderStatus::Failed
        };

        let average_price = (filled_size > Decimal::ZERO).then(|| {
            let notional: Decimal = fills.iter().map(|f| f.quantity * f.price).sum();
            notional / filled_size
        });

        let error = match status {
            OrderStatus::Filled => None,
            _ => abort.map(ExecutionError::to_info).or_else(|| {
                slices
                    .iter()
                    .rev()
                    .find_map(|s| s.error.clone())
                    .or_else(|| {
                        (cancelled_size > Decimal::ZERO).then(|| ErrorInfo {
                            code: ErrorCode::Cancelled,
                            message: "remaining slices cancelled".to_string(),
                        })
                    })
            }),
        };

        Self {
            order_id: request.id.clone(),
            mint: request.token.mint.clone(),
            side: request.side,
            status,
            algorithm: Some(algorithm),
            requested_size: request.size,
            filled_size,
            failed_size,
            cancelled_size,
            shortfall: request.size - filled_size,
            average_price,
            fills,
            slices,
            denial: None,
            error,
            position_id: request.position_id.clone(),
            started_at,
            completed_at,
        }
    }

    /// Attach the position the fills landed in.
    #[must_use]
    pub fn with_position(mut self, position_id: Option<PositionId>) -> Self {
        if position_id.is_some() {
            self.position_id = position_id;
        }
        self
    }

    /// Record a failure that happened after the slices settled. Fills and
    /// status are kept.
    #[must_use]
    pub fn with_error(mut self, error: &ExecutionError) -> Self {
        self.error = Some(error.to_info());
        self
    }

    /// Whether any quantity filled.
    #[must_use]
    pub fn has_fills(&self) -> bool {
        self.filled_size > Decimal::ZERO
    }
}
