//! Risk Manager Domain Service

use rust_decimal::Decimal;

use crate::domain::order_execution::OrderRequest;
use crate::domain::position::Position;
use crate::domain::risk_management::value_objects::{
    DenyReason, RiskContext, RiskDecision, RiskDenial, RiskLimits,
};
use crate::domain::shared::Side;

/// Stateless pre-trade risk gate.
#[derive(Debug, Clone, Default)]
pub struct RiskManager {
    limits: RiskLimits,
}

impl RiskManager {
    /// Create a risk manager.
    #[must_use]
    pub const fn new(limits: RiskLimits) -> Self {
        Self { limits }
    }

    /// Configured limits.
    #[must_use]
    pub const fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Approve or deny an order.
    ///
    /// `current_positions` are the open and closing positions; `daily_pnl`
    /// is today's realized P&L (negative for a loss). Buys are checked
    /// against every limit, counting the exposure already reserved in
    /// `context`. Sells skip the limits but must be reduce-only.
    #[must_use]
    pub fn approve(
        &self,
        order: &OrderRequest,
        current_positions: &[Position],
        daily_pnl: Decimal,
        context: &RiskContext,
    ) -> RiskDecision {
        let denial = match order.side {
            Side::Sell => check_reduce_only(order, current_positions),
            Side::Buy => self.check_buy(order, current_positions, daily_pnl, context),
        };
        match denial {
            Some(denial) => RiskDecision::Deny(denial),
            None => RiskDecision::Allow,
        }
    }

    fn check_buy(
        &self,
        order: &OrderRequest,
        positions: &[Position],
        daily_pnl: Decimal,
        context: &RiskContext,
    ) -> Option<RiskDenial> {
        let limits = &self.limits;

        if -daily_pnl >= limits.max_daily_loss {
            return Some(RiskDenial::new(
                DenyReason::DailyLossExceeded,
                "daily realized loss limit reached",
                -daily_pnl,
                limits.max_daily_loss,
            ));
        }

        if context.orders_last_hour >= limits.max_orders_per_hour {
            return Some(RiskDenial::new(
                DenyReason::OrderRateExceeded,
                "too many orders in the last hour",
                context.orders_last_hour,
                limits.max_orders_per_hour,
            ));
        }

        let existing = order
            .position_id
            .as_ref()
            .and_then(|id| positions.iter().find(|p| p.id() == id));

        let open_or_reserved = positions.len() + context.pending_new_positions;
        if existing.is_none() && open_or_reserved >= limits.max_open_positions {
            return Some(RiskDenial::new(
                DenyReason::MaxOpenPositions,
                "maximum concurrent positions reached",
                open_or_reserved,
                limits.max_open_positions,
            ));
        }

        let order_notional = order.size * context.reference_price;
        let position_notional = order_notional + existing.map_or(Decimal::ZERO, Position::notional);
        if position_notional > limits.max_position_notional {
            return Some(RiskDenial::new(
                DenyReason::PositionNotionalExceeded,
                format!("position notional for {} above limit", order.token.mint),
                position_notional,
                limits.max_position_notional,
            ));
        }

        let exposure: Decimal = positions.iter().map(Position::notional).sum();
        let total = exposure + context.pending_notional + order_notional;
        if total > limits.max_total_exposure {
            return Some(RiskDenial::new(
                DenyReason::TotalExposureExceeded,
                "aggregate exposure above limit",
                total,
                limits.max_total_exposure,
            ));
        }

        None
    }
}

/// A sell is reduce-only when it names an active position and sells no more
/// than that position holds.
fn check_reduce_only(order: &OrderRequest, positions: &[Position]) -> Option<RiskDenial> {
    let Some(id) = order.position_id.as_ref() else {
        return Some(RiskDenial::new(
            DenyReason::NotReduceOnly,
            "sell does not reference a position",
            order.size,
            Decimal::ZERO,
        ));
    };
    let Some(position) = positions.iter().find(|p| p.id() == id) else {
        return Some(RiskDenial::new(
            DenyReason::NotReduceOnly,
            format!("position {id} is not open"),
            order.size,
            Decimal::ZERO,
        ));
    };
    if order.size > position.size() {
        return Some(RiskDenial::new(
            DenyReason::NotReduceOnly,
            format!("sell larger than position {id}"),
            order.size,
            position.size(),
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::ExitPlan;
    use crate::domain::shared::{OrderId, PositionId, Token, Urgency};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn limits() -> RiskLimits {
        RiskLimits {
            max_open_positions: 2,
            max_position_notional: dec!(1000),
            max_total_exposure: dec!(1500),
            max_daily_loss: dec!(100),
            max_orders_per_hour: 10,
        }
    }

    fn order(side: Side, size: Decimal) -> OrderRequest {
        OrderRequest {
            id: OrderId::new("o-1"),
            token: Token::new("MINT", 6),
            side,
            size,
            max_slippage_bps: 100,
            urgency: Urgency::Medium,
            algorithm_hint: None,
            expected_price: None,
            position_id: None,
            exit_plan: None,
        }
    }

    fn position(id: &str, size: Decimal, price: Decimal) -> Position {
        Position::open(
            PositionId::new(id),
            Token::new("MINT", 6),
            size,
            price,
            ExitPlan::default_spot(),
            Utc::now(),
        )
        .unwrap()
    }

    fn ctx(price: Decimal) -> RiskContext {
        RiskContext::new(price, 0)
    }

    fn denial(decision: RiskDecision) -> DenyReason {
        match decision {
            RiskDecision::Deny(d) => d.reason,
            RiskDecision::Allow => panic!("expected denial"),
        }
    }

    #[test]
    fn allows_order_within_limits() {
        let rm = RiskManager::new(limits());
        let decision = rm.approve(&order(Side::Buy, dec!(5)), &[], Decimal::ZERO, &ctx(dec!(100)));
        assert!(decision.is_allowed());
    }

    #[test]
    fn denies_when_daily_loss_reached() {
        let rm = RiskManager::new(limits());
        let decision = rm.approve(&order(Side::Buy, dec!(1)), &[], dec!(-100), &ctx(dec!(100)));
        assert_eq!(denial(decision), DenyReason::DailyLossExceeded);
    }

    #[test]
    fn denies_when_too_many_positions() {
        let rm = RiskManager::new(limits());
        let positions = [position("a", dec!(1), dec!(10)), position("b", dec!(1), dec!(10))];
        let decision = rm.approve(&order(Side::Buy, dec!(1)), &positions, Decimal::ZERO, &ctx(dec!(10)));
        assert_eq!(denial(decision), DenyReason::MaxOpenPositions);
    }

    #[test]
    fn adding_to_existing_position_does_not_count_as_new() {
        let rm = RiskManager::new(limits());
        let positions = [position("a", dec!(1), dec!(10)), position("b", dec!(1), dec!(10))];
        let mut o = order(Side::Buy, dec!(1));
        o.position_id = Some(PositionId::new("a"));
        assert!(rm.approve(&o, &positions, Decimal::ZERO, &ctx(dec!(10))).is_allowed());
    }

    #[test]
    fn denies_position_notional() {
        let rm = RiskManager::new(limits());
        let positions = [position("a", dec!(5), dec!(100))];
        let mut o = order(Side::Buy, dec!(6));
        o.position_id = Some(PositionId::new("a"));
        let decision = rm.approve(&o, &positions, Decimal::ZERO, &ctx(dec!(100)));
        assert_eq!(denial(decision), DenyReason::PositionNotionalExceeded);
    }

    #[test]
    fn denies_total_exposure() {
        let rm = RiskManager::new(limits());
        let positions = [position("a", dec!(9), dec!(100))];
        let decision = rm.approve(&order(Side::Buy, dec!(7)), &positions, Decimal::ZERO, &ctx(dec!(100)));
        assert_eq!(denial(decision), DenyReason::TotalExposureExceeded);
    }

    #[test]
    fn denies_order_rate() {
        let rm = RiskManager::new(limits());
        let context = RiskContext::new(dec!(1), 10);
        let decision = rm.approve(&order(Side::Buy, dec!(1)), &[], Decimal::ZERO, &context);
        assert_eq!(denial(decision), DenyReason::OrderRateExceeded);
    }

    #[test]
    fn covered_sell_skips_limits() {
        let rm = RiskManager::new(limits());
        let positions = [position("a", dec!(10), dec!(10)), position("b", dec!(1), dec!(10))];
        let mut o = order(Side::Sell, dec!(10));
        o.position_id = Some(PositionId::new("a"));
        let decision = rm.approve(&o, &positions, dec!(-5000), &ctx(dec!(100)));
        assert!(decision.is_allowed());
    }

    #[test]
    fn uncovered_sells_are_denied() {
        let rm = RiskManager::new(limits());
        let positions = [position("a", dec!(10), dec!(10))];

        let no_position = order(Side::Sell, dec!(1));
        assert_eq!(
            denial(rm.approve(&no_position, &positions, Decimal::ZERO, &ctx(dec!(10)))),
            DenyReason::NotReduceOnly
        );

        let mut unknown = order(Side::Sell, dec!(1));
        unknown.position_id = Some(PositionId::new("gone"));
        assert_eq!(
            denial(rm.approve(&unknown, &positions, Decimal::ZERO, &ctx(dec!(10)))),
            DenyReason::NotReduceOnly
        );

        let mut oversized = order(Side::Sell, dec!(10.5));
        oversized.position_id = Some(PositionId::new("a"));
        let RiskDecision::Deny(d) = rm.approve(&oversized, &positions, Decimal::ZERO, &ctx(dec!(10))) else {
            panic!("expected denial");
        };
        assert_eq!(d.reason, DenyReason::NotReduceOnly);
        assert_eq!(d.limit, "10");
    }

    #[test]
    fn reserved_buys_count_toward_position_cap_and_exposure() {
        let rm = RiskManager::new(limits());
        let positions = [position("a", dec!(1), dec!(10))];

        let mut context = ctx(dec!(10));
        context.pending_new_positions = 1;
        let decision = rm.approve(&order(Side::Buy, dec!(1)), &positions, Decimal::ZERO, &context);
        assert_eq!(denial(decision), DenyReason::MaxOpenPositions);

        let mut context = ctx(dec!(100));
        context.pending_notional = dec!(800);
        let decision = rm.approve(&order(Side::Buy, dec!(8)), &[], Decimal::ZERO, &context);
        assert_eq!(denial(decision), DenyReason::TotalExposureExceeded);
    }
}
