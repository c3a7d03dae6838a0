//! Exit plan: stop loss, take-profit ladder, max hold and the rules that
//! raise the stop as a position moves into profit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::position::errors::PositionError;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// A price threshold, fixed or relative to the entry price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PriceLevel {
    /// Fixed price.
    Absolute {
        /// Price in quote units.
        price: Decimal,
    },
    /// Signed percentage from entry (`-9` is 9% below, `8` is 8% above).
    PercentFromEntry {
        /// Signed percent.
        percent: Decimal,
    },
}

impl PriceLevel {
    /// Resolve against an entry price.
    #[must_use]
    pub fn resolve(&self, entry_price: Decimal) -> Decimal {
        match self {
            Self::Absolute { price } => *price,
            Self::PercentFromEntry { percent } => entry_price * (HUNDRED + *percent) / HUNDRED,
        }
    }

    /// Percent level.
    #[must_use]
    pub const fn percent(percent: Decimal) -> Self {
        Self::PercentFromEntry { percent }
    }

    /// Absolute level.
    #[must_use]
    pub const fn absolute(price: Decimal) -> Self {
        Self::Absolute { price }
    }
}

/// One configured take-profit rung.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderRungSpec {
    /// Fraction of the peak position size sold at this rung.
    pub fraction: Decimal,
    /// Target price.
    pub target: PriceLevel,
}

/// Stop that follows the peak price once a position is far enough in profit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailingStop {
    /// Gain over entry, in percent, at which trailing starts.
    pub activation_pct: Decimal,
    /// Distance below the peak, in percent.
    pub trail_pct: Decimal,
}

impl TrailingStop {
    /// Stop level for a peak price.
    #[must_use]
    pub fn level(&self, peak_price: Decimal) -> Decimal {
        peak_price * (HUNDRED - self.trail_pct) / HUNDRED
    }
}

/// Exit rules attached to a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitPlan {
    /// Stop-loss level.
    #[serde(default)]
    pub stop_loss: Option<PriceLevel>,
    /// Take-profit ladder, in ascending target order.
    #[serde(default)]
    pub take_profit: Vec<LadderRungSpec>,
    /// Exit everything after this many seconds regardless of P&L.
    #[serde(default)]
    pub max_hold_secs: Option<u64>,
    /// Trailing stop.
    #[serde(default)]
    pub trailing_stop: Option<TrailingStop>,
    /// Gain over entry, in percent, at which the stop moves up to entry.
    #[serde(default)]
    pub breakeven_at_pct: Option<Decimal>,
    /// Loss from entry, in percent, at which everything is sold even
    /// without a stop loss.
    #[serde(default)]
    pub emergency_exit_pct: Option<Decimal>,
}

impl ExitPlan {
    /// Spot default: stop 9% below entry, ladder 60% @ +8%, 25% @ +18%,
    /// 15% @ +40%.
    #[must_use]
    pub fn default_spot() -> Self {
        Self {
            stop_loss: Some(PriceLevel::percent(Decimal::new(-9, 0))),
            take_profit: vec![
                LadderRungSpec {
                    fraction: Decimal::new(60, 2),
                    target: PriceLevel::percent(Decimal::new(8, 0)),
                },
                LadderRungSpec {
                    fraction: Decimal::new(25, 2),
                    target: PriceLevel::percent(Decimal::new(18, 0)),
                },
                LadderRungSpec {
                    fraction: Decimal::new(15, 2),
                    target: PriceLevel::percent(Decimal::new(40, 0)),
                },
            ],
            max_hold_secs: None,
            trailing_stop: None,
            breakeven_at_pct: None,
            emergency_exit_pct: None,
        }
    }

    /// Default spot plan plus a 5% trailing stop from +15%, a breakeven
    /// stop from +10% and an emergency exit at -90%.
    #[must_use]
    pub fn protected_spot() -> Self {
        Self {
            trailing_stop: Some(TrailingStop {
                activation_pct: Decimal::new(15, 0),
                trail_pct: Decimal::new(5, 0),
            }),
            breakeven_at_pct: Some(Decimal::TEN),
            emergency_exit_pct: Some(Decimal::new(90, 0)),
            ..Self::default_spot()
        }
    }

    /// Price at or below which the emergency exit fires.
    #[must_use]
    pub fn emergency_price(&self, entry_price: Decimal) -> Option<Decimal> {
        self.emergency_exit_pct.map(|pct| entry_price * (HUNDRED - pct) / HUNDRED)
    }

    /// Stop level for a position that has traded as high as `peak_price`.
    ///
    /// Starts from the configured stop loss and only ever raises it: to
    /// entry once the breakeven gain was reached, and to the trailing level
    /// once the trailing activation gain was reached.
    #[must_use]
    pub fn stop_for_peak(
        &self,
        entry_price: Decimal,
        peak_price: Option<Decimal>,
    ) -> Option<Decimal> {
        let base = self.stop_loss.map(|l| l.resolve(entry_price));
        let Some(peak) = peak_price.filter(|_| entry_price > Decimal::ZERO) else {
            return base;
        };
        let gain_pct = (peak - entry_price) / entry_price * HUNDRED;

        let breakeven = self
            .breakeven_at_pct
            .filter(|at| gain_pct >= *at)
            .map(|_| entry_price);
        let trailing = self
            .trailing_stop
            .filter(|t| gain_pct >= t.activation_pct)
            .map(|t| t.level(peak));

        [base, breakeven, trailing].into_iter().flatten().max()
    }

    /// Sum of rung fractions.
    #[must_use]
    pub fn ladder_fraction_sum(&self) -> Decimal {
        self.take_profit.iter().map(|r| r.fraction).sum()
    }

    /// Validate structural rules.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::InvalidExitPlan`] when a fraction is outside
    /// `(0, 1]`, fractions sum above 1, a percent stop is not below entry,
    /// a percent target is not above entry, or an absolute level is not
    /// positive.
    pub fn validate(&self) -> Result<(), PositionError> {
        let invalid = |message: String| Err(PositionError::InvalidExitPlan { message });

        if let Some(level) = self.stop_loss {
            match level {
                PriceLevel::PercentFromEntry { percent }
                    if percent >= Decimal::ZERO || percent <= -HUNDRED =>
                {
                    return invalid(format!("stop loss percent must be in (-100, 0): {percent}"));
                }
                PriceLevel::Absolute { price } if price <= Decimal::ZERO => {
                    return invalid(format!("stop loss price must be positive: {price}"));
                }
                _ => {}
            }
        }

        for (i, rung) in self.take_profit.iter().enumerate() {
            if rung.fraction <= Decimal::ZERO || rung.fraction > Decimal::ONE {
                return invalid(format!("rung {i} fraction must be in (0, 1]: {}", rung.fraction));
            }
            match rung.target {
                PriceLevel::PercentFromEntry { percent } if percent <= Decimal::ZERO => {
                    return invalid(format!("rung {i} percent must be positive: {percent}"));
                }
                PriceLevel::Absolute { price } if price <= Decimal::ZERO => {
                    return invalid(format!("rung {i} price must be positive: {price}"));
                }
                _ => {}
            }
        }

        let sum = self.ladder_fraction_sum();
        if sum > Decimal::ONE {
            return invalid(format!("ladder fractions sum to {sum}, above 1"));
        }

        if self.max_hold_secs == Some(0) {
            return invalid("max hold must be positive".to_string());
        }

        if let Some(trailing) = self.trailing_stop {
            if trailing.activation_pct <= Decimal::ZERO {
                return invalid(format!(
                    "trailing activation must be positive: {}",
                    trailing.activation_pct
                ));
            }
            if trailing.trail_pct <= Decimal::ZERO || trailing.trail_pct >= HUNDRED {
                return invalid(format!(
                    "trailing distance must be in (0, 100): {}",
                    trailing.trail_pct
                ));
            }
        }

        if let Some(at) = self.breakeven_at_pct
            && at <= Decimal::ZERO
        {
            return invalid(format!("breakeven gain must be positive: {at}"));
        }

        if let Some(pct) = self.emergency_exit_pct
            && (pct <= Decimal::ZERO || pct >= HUNDRED)
        {
            return invalid(format!("emergency loss must be in (0, 100): {pct}"));
        }

        Ok(())
    }
}

/// Progress of one rung on a live position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RungState {
    /// Not yet crossed.
    Pending,
    /// Exit order in flight.
    Triggered,
    /// Exit settled with a fill.
    Done,
}

/// A rung on a live position with its resolved target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderRung {
    /// Configured rung.
    pub spec: LadderRungSpec,
    /// Target resolved against the current entry price.
    pub target_price: Decimal,
    /// Progress.
    pub state: RungState,
}
