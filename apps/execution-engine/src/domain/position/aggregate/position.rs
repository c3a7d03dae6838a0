//! Position Aggregate Root

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::position::errors::PositionError;
use crate::domain::position::value_objects::{
    ExitPlan, ExitTrigger, LadderRung, PositionStatus, RungState,
};
use crate::domain::shared::{OrderId, PositionId, Side, Token};

/// Exit order in flight for a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingExit {
    /// Exit order id.
    pub order_id: OrderId,
    /// What fired.
    pub trigger: ExitTrigger,
    /// Requested exit size.
    pub size: Decimal,
    /// When the exit began.
    pub started_at: DateTime<Utc>,
}

/// Instructions for the exit order produced by [`Position::begin_exit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitOrder {
    /// Deterministic exit order id.
    pub order_id: OrderId,
    /// Size to sell.
    pub size: Decimal,
    /// Trigger that caused it.
    pub trigger: ExitTrigger,
}

/// Outcome of [`Position::settle_exit`] or [`Position::reduce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitSettlement {
    /// Size actually removed.
    pub filled: Decimal,
    /// P&L realized by this reduction.
    pub realized_pnl: Decimal,
    /// Whether the position is now closed.
    pub closed: bool,
}

/// Position Aggregate Root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    id: PositionId,
    token: Token,
    side: Side,
    entry_price: Decimal,
    size: Decimal,
    peak_size: Decimal,
    plan: ExitPlan,
    stop_loss_price: Option<Decimal>,
    ladder: Vec<LadderRung>,
    status: PositionStatus,
    realized_pnl: Decimal,
    pending_exit: Option<PendingExit>,
    exit_attempts: u32,
    last_price: Option<Decimal>,
    #[serde(default)]
    peak_price: Option<Decimal>,
    opened_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
}

impl Position {
    /// Open a long position from the first buy fill.
    ///
    /// # Errors
    ///
    /// Returns error if the plan is invalid or the fill is not positive.
    pub fn open(
        id: PositionId,
        token: Token,
        quantity: Decimal,
        price: Decimal,
        plan: ExitPlan,
        now: DateTime<Utc>,
    ) -> Result<Self, PositionError> {
        plan.validate()?;
        if price <= Decimal::ZERO {
            return Err(PositionError::InvalidPrice {
                price: price.to_string(),
            });
        }
        if quantity <= Decimal::ZERO {
            return Err(PositionError::NothingToExit {
                reason: format!("opening fill must be positive: {quantity}"),
            });
        }

        let ladder = plan
            .take_profit
            .iter()
            .map(|spec| LadderRung {
                spec: *spec,
                target_price: spec.target.resolve(price),
                state: RungState::Pending,
            })
            .collect();

        Ok(Self {
            id,
            token,
            side: Side::Buy,
            entry_price: price,
            size: quantity,
            peak_size: quantity,
            stop_loss_price: plan.stop_loss.map(|l| l.resolve(price)),
            plan,
            ladder,
            status: PositionStatus::Open,
            realized_pnl: Decimal::ZERO,
            pending_exit: None,
            exit_attempts: 0,
            last_price: None,
            peak_price: None,
            opened_at: now,
            updated_at: now,
            closed_at: None,
        })
    }

    /// Position id.
    #[must_use]
    pub const fn id(&self) -> &PositionId {
        &self.id
    }

    /// Token held.
    #[must_use]
    pub const fn token(&self) -> &Token {
        &self.token
    }

    /// Side that opened the position.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Volume-weighted entry price.
    #[must_use]
    pub const fn entry_price(&self) -> Decimal {
        self.entry_price
    }

    /// Remaining size.
    #[must_use]
    pub const fn size(&self) -> Decimal {
        self.size
    }

    /// Largest size held; ladder fractions apply to this.
    #[must_use]
    pub const fn peak_size(&self) -> Decimal {
        self.peak_size
    }

    /// Current stop price, including any breakeven or trailing raise.
    #[must_use]
    pub const fn stop_loss_price(&self) -> Option<Decimal> {
        self.stop_loss_price
    }

    /// Take-profit ladder.
    #[must_use]
    pub fn ladder(&self) -> &[LadderRung] {
        &self.ladder
    }

    /// Exit plan.
    #[must_use]
    pub const fn plan(&self) -> &ExitPlan {
        &self.plan
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> PositionStatus {
        self.status
    }

    /// Cumulative realized P&L in quote units.
    #[must_use]
    pub const fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    /// Exit in flight, if any.
    #[must_use]
    pub const fn pending_exit(&self) -> Option<&PendingExit> {
        self.pending_exit.as_ref()
    }

    /// Exits started so far.
    #[must_use]
    pub const fn exit_attempts(&self) -> u32 {
        self.exit_attempts
    }

    /// Most recent evaluated price.
    #[must_use]
    pub const fn last_price(&self) -> Option<Decimal> {
        self.last_price
    }

    /// Highest price seen while the position was active.
    #[must_use]
    pub const fn peak_price(&self) -> Option<Decimal> {
        self.peak_price
    }

    /// Open timestamp.
    #[must_use]
    pub const fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Last mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Close timestamp.
    #[must_use]
    pub const fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    /// Notional at entry price.
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.size * self.entry_price
    }

    /// Add a subsequent buy fill. Entry price becomes the volume-weighted
    /// average and percent levels are re-derived from it.
    ///
    /// # Errors
    ///
    /// Returns error if the position is closed or the fill is malformed.
    pub fn apply_entry_fill(
        &mut self,
        quantity: Decimal,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), PositionError> {
        if self.status == PositionStatus::Closed {
            return Err(PositionError::InvalidTransition {
                from: self.status,
                to: PositionStatus::Open,
            });
        }
        if price <= Decimal::ZERO || quantity <= Decimal::ZERO {
            return Err(PositionError::InvalidPrice {
                price: format!("{quantity} @ {price}"),
            });
        }

        let cost = self.size * self.entry_price + quantity * price;
        self.size += quantity;
        self.peak_size += quantity;
        self.entry_price = cost / self.size;
        self.rederive_levels();
        self.updated_at = now;
        Ok(())
    }

    fn rederive_levels(&mut self) {
        self.stop_loss_price = self.plan.stop_for_peak(self.entry_price, self.peak_price);
        for rung in &mut self.ladder {
            rung.target_price = rung.spec.target.resolve(self.entry_price);
        }
    }

    /// Evaluate the current price against the exit plan.
    ///
    /// Stop loss takes precedence over the emergency exit, then take profit,
    /// then max hold. The peak price and the stop it implies are updated
    /// first, so a new high can raise the stop. Returns `None` while an exit
    /// is pending or once closed.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::InvalidPrice`] for a non-positive price.
    pub fn evaluate(
        &mut self,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Option<ExitTrigger>, PositionError> {
        if price <= Decimal::ZERO {
            return Err(PositionError::InvalidPrice {
                price: price.to_string(),
            });
        }
        self.last_price = Some(price);

        if !self.status.is_active() {
            return Ok(None);
        }
        if self.peak_price.is_none_or(|peak| price > peak) {
            self.peak_price = Some(price);
            self.stop_loss_price = self.plan.stop_for_peak(self.entry_price, self.peak_price);
        }
        if self.pending_exit.is_some() {
            return Ok(None);
        }

        if self.stop_loss_price.is_some_and(|sl| price <= sl) {
            return Ok(Some(ExitTrigger::StopLoss { price }));
        }

        if self
            .plan
            .emergency_price(self.entry_price)
            .is_some_and(|floor| price <= floor)
        {
            return Ok(Some(ExitTrigger::Emergency { price }));
        }

        if let Some(rung) = self
            .ladder
            .iter()
            .position(|r| r.state == RungState::Pending && price >= r.target_price)
        {
            return Ok(Some(ExitTrigger::TakeProfit { rung, price }));
        }

        if let Some(max_hold) = self.plan.max_hold_secs {
            let held = (now - self.opened_at).num_seconds().max(0) as u64;
            if held >= max_hold {
                return Ok(Some(ExitTrigger::MaxHold { held_secs: held }));
            }
        }

        Ok(None)
    }

    /// Size an exit for `trigger` would sell.
    fn exit_size(&self, trigger: &ExitTrigger) -> Decimal {
        match trigger {
            ExitTrigger::StopLoss { .. }
            | ExitTrigger::Emergency { .. }
            | ExitTrigger::MaxHold { .. } => self.size,
            ExitTrigger::TakeProfit { rung, .. } => {
                let Some(r) = self.ladder.get(*rung) else {
                    return Decimal::ZERO;
                };
                let last_pending = self
                    .ladder
                    .iter()
                    .enumerate()
                    .all(|(i, other)| i == *rung || other.state != RungState::Pending);
                if last_pending && self.plan.ladder_fraction_sum() >= Decimal::ONE {
                    return self.size;
                }
                self.token.round(r.spec.fraction * self.peak_size).min(self.size)
            }
        }
    }

    /// Start an exit: mark the position closing and record the pending exit.
    ///
    /// A rung whose exit size rounds to zero is marked done and
    /// [`PositionError::NothingToExit`] is returned.
    ///
    /// # Errors
    ///
    /// Returns error if an exit is already pending or the position is closed.
    pub fn begin_exit(
        &mut self,
        trigger: ExitTrigger,
        now: DateTime<Utc>,
    ) -> Result<ExitOrder, PositionError> {
        if let Some(pending) = &self.pending_exit {
            return Err(PositionError::ExitPending {
                order_id: pending.order_id.to_string(),
            });
        }
        if self.status == PositionStatus::Closed {
            return Err(PositionError::InvalidTransition {
                from: self.status,
                to: PositionStatus::Closing,
            });
        }

        let size = self.exit_size(&trigger);
        if size <= Decimal::ZERO {
            if let ExitTrigger::TakeProfit { rung, .. } = trigger
                && let Some(r) = self.ladder.get_mut(rung)
            {
                r.state = RungState::Done;
            }
            return Err(PositionError::NothingToExit {
                reason: format!("{} exit size rounds to zero", trigger.label()),
            });
        }

        if let ExitTrigger::TakeProfit { rung, .. } = trigger
            && let Some(r) = self.ladder.get_mut(rung)
        {
            r.state = RungState::Triggered;
        }

        self.exit_attempts += 1;
        let order_id = OrderId::for_exit(&self.id, &trigger.label(), self.exit_attempts);
        self.status = PositionStatus::Closing;
        self.pending_exit = Some(PendingExit {
            order_id: order_id.clone(),
            trigger,
            size,
            started_at: now,
        });
        self.updated_at = now;

        Ok(ExitOrder {
            order_id,
            size,
            trigger,
        })
    }

    /// Apply the aggregate result of the pending exit order.
    ///
    /// A take-profit rung with any fill is done; with no fill it returns to
    /// pending so the next evaluation can retry.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::ExitMismatch`] if `order_id` is not the
    /// pending exit.
    pub fn settle_exit(
        &mut self,
        order_id: &OrderId,
        filled: Decimal,
        average_price: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> Result<ExitSettlement, PositionError> {
        let pending = match &self.pending_exit {
            Some(p) if &p.order_id == order_id => p.clone(),
            other => {
                return Err(PositionError::ExitMismatch {
                    expected: other
                        .as_ref()
                        .map_or_else(|| "none".to_string(), |p| p.order_id.to_string()),
                    actual: order_id.to_string(),
                });
            }
        };

        self.pending_exit = None;
        if let ExitTrigger::TakeProfit { rung, .. } = pending.trigger
            && let Some(r) = self.ladder.get_mut(rung)
        {
            r.state = if filled > Decimal::ZERO {
                RungState::Done
            } else {
                RungState::Pending
            };
        }

        Ok(self.remove(filled, average_price, now))
    }

    /// Reduce the position for a caller-initiated sell.
    ///
    /// # Errors
    ///
    /// Returns error if the position is already closed.
    pub fn reduce(
        &mut self,
        filled: Decimal,
        average_price: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> Result<ExitSettlement, PositionError> {
        if self.status == PositionStatus::Closed {
            return Err(PositionError::NothingToExit {
                reason: format!("position {} is closed", self.id),
            });
        }
        Ok(self.remove(filled, average_price, now))
    }

    fn remove(
        &mut self,
        filled: Decimal,
        average_price: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> ExitSettlement {
        let filled = filled.max(Decimal::ZERO).min(self.size);
        let realized_pnl = match average_price {
            Some(price) if filled > Decimal::ZERO => (price - self.entry_price) * filled,
            _ => Decimal::ZERO,
        };

        self.size -= filled;
        self.realized_pnl += realized_pnl;
        self.updated_at = now;

        let closed = self.size <= Decimal::ZERO;
        if closed && self.status != PositionStatus::Closed {
            self.status = PositionStatus::Closed;
            self.closed_at = Some(now);
            self.pending_exit = None;
        }

        ExitSettlement {
            filled,
            realized_pnl,
            closed,
        }
    }
}
