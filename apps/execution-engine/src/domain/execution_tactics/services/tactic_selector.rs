//! Tactic Selector Domain Service

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::domain::execution_tactics::value_objects::{
    AlgorithmKind, ExecutionAlgorithm, IcebergParams, TwapParams, VwapParams,
};
use crate::domain::shared::Urgency;

/// Thresholds and default parameters for algorithm selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionPolicy {
    /// Orders below this fraction of visible liquidity execute immediately.
    pub immediate_fraction: Decimal,
    /// Orders at or above this fraction are worked as icebergs.
    pub iceberg_fraction: Decimal,
    /// TWAP defaults.
    pub twap: TwapParams,
    /// VWAP defaults.
    pub vwap: VwapParams,
    /// Minimum iceberg slice count.
    pub iceberg_min_slices: usize,
    /// Upper bound on iceberg slice count.
    pub iceberg_max_slices: usize,
    /// Nominal spacing between iceberg slices.
    pub iceberg_interval: Duration,
    /// Iceberg price impact ceiling.
    pub iceberg_max_price_impact_bps: u32,
    /// Iceberg send-time jitter.
    pub iceberg_jitter: f64,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            immediate_fraction: Decimal::new(1, 2),
            iceberg_fraction: Decimal::new(5, 2),
            twap: TwapParams {
                slices: 10,
                window: Duration::from_secs(300),
                jitter: 0.4,
            },
            vwap: VwapParams {
                slices: 10,
                window: Duration::from_secs(600),
                profile: Vec::new(),
                jitter: 0.4,
            },
            iceberg_min_slices: 20,
            iceberg_max_slices: 200,
            iceberg_interval: Duration::from_secs(3),
            iceberg_max_price_impact_bps: 100,
            iceberg_jitter: 0.4,
        }
    }
}

/// Inputs to selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionContext {
    /// Order size in token units.
    pub size: Decimal,
    /// Visible liquidity in token units; `None` when unknown.
    pub visible_liquidity: Option<Decimal>,
    /// Caller urgency.
    pub urgency: Urgency,
    /// Caller override.
    pub hint: Option<AlgorithmKind>,
}

/// Chooses an [`ExecutionAlgorithm`] for an order.
#[derive(Debug, Clone, Default)]
pub struct TacticSelector {
    policy: SelectionPolicy,
}

impl TacticSelector {
    /// Create a selector.
    #[must_use]
    pub const fn new(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    /// Active policy.
    #[must_use]
    pub const fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// Select the algorithm for the given context.
    ///
    /// A caller hint always wins. Otherwise the size as a fraction of visible
    /// liquidity picks the variant: below `immediate_fraction` is Immediate,
    /// below `iceberg_fraction` is TWAP (VWAP for low urgency), anything
    /// larger or with unknown liquidity is Iceberg.
    #[must_use]
    pub fn select(&self, ctx: &SelectionContext) -> ExecutionAlgorithm {
        let fraction = ctx
            .visible_liquidity
            .filter(|l| *l > Decimal::ZERO)
            .map(|l| ctx.size / l);

        let kind = ctx.hint.unwrap_or_else(|| match fraction {
            Some(f) if f < self.policy.immediate_fraction => AlgorithmKind::Immediate,
            Some(f) if f < self.policy.iceberg_fraction => match ctx.urgency {
                Urgency::Low => AlgorithmKind::Vwap,
                Urgency::Medium | Urgency::High => AlgorithmKind::Twap,
            },
            _ => AlgorithmKind::Iceberg,
        });

        self.build(kind, ctx)
    }

    fn build(&self, kind: AlgorithmKind, ctx: &SelectionContext) -> ExecutionAlgorithm {
        match kind {
            AlgorithmKind::Immediate => ExecutionAlgorithm::Immediate,
            AlgorithmKind::Twap => ExecutionAlgorithm::Twap(self.policy.twap.clone()),
            AlgorithmKind::Vwap => ExecutionAlgorithm::Vwap(self.policy.vwap.clone()),
            AlgorithmKind::Iceberg => ExecutionAlgorithm::Iceberg(IcebergParams {
                slices: self.iceberg_slices(ctx),
                interval: self.policy.iceberg_interval,
                max_price_impact_bps: self.policy.iceberg_max_price_impact_bps,
                jitter: self.policy.iceberg_jitter,
            }),
        }
    }

    /// Enough slices that each stays under the immediate threshold, within
    /// the configured bounds.
    fn iceberg_slices(&self, ctx: &SelectionContext) -> usize {
        let min = self.policy.iceberg_min_slices.max(1);
        let max = self.policy.iceberg_max_slices.max(min);

        let display = ctx
            .visible_liquidity
            .map(|l| l * self.policy.immediate_fraction)
            .filter(|d| *d > Decimal::ZERO);

        let needed = display
            .and_then(|d| (ctx.size / d).ceil().to_usize())
            .unwrap_or(min);

        needed.clamp(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn ctx(size: Decimal, liquidity: Option<Decimal>, urgency: Urgency) -> SelectionContext {
        SelectionContext {
            size,
            visible_liquidity: liquidity,
            urgency,
            hint: None,
        }
    }

    #[test_case(dec!(5), Urgency::Medium => AlgorithmKind::Immediate ; "half percent")]
    #[test_case(dec!(10), Urgency::Medium => AlgorithmKind::Twap ; "one percent")]
    #[test_case(dec!(30), Urgency::High => AlgorithmKind::Twap ; "mid size urgent")]
    #[test_case(dec!(30), Urgency::Low => AlgorithmKind::Vwap ; "mid size patient")]
    #[test_case(dec!(50), Urgency::Medium => AlgorithmKind::Iceberg ; "five percent")]
    #[test_case(dec!(400), Urgency::High => AlgorithmKind::Iceberg ; "large")]
    fn select_by_liquidity_fraction(size: Decimal, urgency: Urgency) -> AlgorithmKind {
        let selector = TacticSelector::default();
        selector.select(&ctx(size, Some(dec!(1000)), urgency)).kind()
    }

    #[test]
    fn unknown_liquidity_is_iceberg() {
        let selector = TacticSelector::default();
        let algo = selector.select(&ctx(dec!(1), None, Urgency::High));
        assert_eq!(algo.kind(), AlgorithmKind::Iceberg);

        let algo = selector.select(&ctx(dec!(1), Some(Decimal::ZERO), Urgency::High));
        assert_eq!(algo.kind(), AlgorithmKind::Iceberg);
    }

    #[test]
    fn hint_overrides_selection() {
        let selector = TacticSelector::default();
        let mut c = ctx(dec!(500), Some(dec!(1000)), Urgency::Medium);
        c.hint = Some(AlgorithmKind::Immediate);
        assert_eq!(selector.select(&c), ExecutionAlgorithm::Immediate);
    }

    #[test]
    fn iceberg_slices_respect_bounds() {
        let selector = TacticSelector::default();

        // 100 / (1000 * 0.01) = 10 -> raised to minimum 20
        match selector.select(&ctx(dec!(100), Some(dec!(1000)), Urgency::Medium)) {
            ExecutionAlgorithm::Iceberg(p) => assert_eq!(p.slices, 20),
            other => panic!("expected iceberg, got {other:?}"),
        }

        // 900 / (1000 * 0.01) = 90
        match selector.select(&ctx(dec!(900), Some(dec!(1000)), Urgency::Medium)) {
            ExecutionAlgorithm::Iceberg(p) => assert_eq!(p.slices, 90),
            other => panic!("expected iceberg, got {other:?}"),
        }

        // capped at 200
        match selector.select(&ctx(dec!(5000), Some(dec!(1000)), Urgency::Medium)) {
            ExecutionAlgorithm::Iceberg(p) => assert_eq!(p.slices, 200),
            other => panic!("expected iceberg, got {other:?}"),
        }
    }
}
