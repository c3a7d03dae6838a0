//! Priority fee calculation.

use crate::domain::fees::value_objects::{CongestionLevel, FeeEstimate, FeeTier};
use crate::domain::shared::Urgency;

const MICRO_LAMPORTS_PER_LAMPORT: u128 = 1_000_000;

/// Limits applied to every estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    /// Hard cap on the priority fee, in lamports.
    pub max_priority_fee_lamports: u64,
    /// Compute unit budget assumed per swap transaction.
    pub compute_units: u32,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            max_priority_fee_lamports: 1_000_000,
            compute_units: 200_000,
        }
    }
}

/// Stateless fee calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeeCalculator {
    policy: FeePolicy,
}

impl FeeCalculator {
    /// Create a calculator.
    #[must_use]
    pub const fn new(policy: FeePolicy) -> Self {
        Self { policy }
    }

    /// Active policy.
    #[must_use]
    pub const fn policy(&self) -> FeePolicy {
        self.policy
    }

    /// Estimate from recent per-compute-unit prioritization fees.
    ///
    /// The fee is the larger of the tier floor and the market percentile for
    /// the urgency (p25/p50/p75), clamped to the policy maximum. An empty
    /// sample set yields the fallback estimate.
    #[must_use]
    pub fn estimate(&self, samples_micro_lamports: &[u64], urgency: Urgency) -> FeeEstimate {
        if samples_micro_lamports.is_empty() {
            return self.fallback(urgency);
        }

        let mut sorted = samples_micro_lamports.to_vec();
        sorted.sort_unstable();

        let congestion = CongestionLevel::from_median_micro_lamports(percentile(&sorted, 50));
        let tier = FeeTier::select(congestion, urgency);

        let market_price = percentile(&sorted, urgency_percentile(urgency));
        let market_lamports = self.lamports_for_price(market_price);
        let fee = tier.base_lamports().max(market_lamports);

        self.build(tier, Some(congestion), fee)
    }

    /// Estimate used when fee sampling is unavailable.
    #[must_use]
    pub fn fallback(&self, urgency: Urgency) -> FeeEstimate {
        let tier = FeeTier::for_urgency(urgency);
        self.build(tier, None, tier.base_lamports())
    }

    fn build(&self, tier: FeeTier, congestion: Option<CongestionLevel>, fee: u64) -> FeeEstimate {
        let priority_fee_lamports = fee.min(self.policy.max_priority_fee_lamports);
        let compute_units = self.policy.compute_units.max(1);
        let price = u128::from(priority_fee_lamports) * MICRO_LAMPORTS_PER_LAMPORT
            / u128::from(compute_units);

        FeeEstimate {
            tier,
            congestion,
            priority_fee_lamports,
            compute_unit_price_micro_lamports: u64::try_from(price).unwrap_or(u64::MAX),
            compute_units,
        }
    }

    fn lamports_for_price(&self, micro_lamports_per_cu: u64) -> u64 {
        let total = u128::from(micro_lamports_per_cu) * u128::from(self.policy.compute_units)
            / MICRO_LAMPORTS_PER_LAMPORT;
        u64::try_from(total).unwrap_or(u64::MAX)
    }
}

const fn urgency_percentile(urgency: Urgency) -> usize {
    match urgency {
        Urgency::Low => 25,
        Urgency::Medium => 50,
        Urgency::High => 75,
    }
}

/// Nearest-rank percentile of a sorted, non-empty slice.
fn percentile(sorted: &[u64], p: usize) -> u64 {
    let rank = (p * sorted.len()).div_ceil(100).max(1);
    sorted.get(rank - 1).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_samples_fall_back_to_urgency_tier() {
        let calc = FeeCalculator::default();
        let est = calc.estimate(&[], Urgency::High);
        assert_eq!(est.tier, FeeTier::High);
        assert_eq!(est.congestion, None);
        assert_eq!(est.priority_fee_lamports, 100_000);
        assert_eq!(est.compute_unit_price_micro_lamports, 500_000);
    }

    #[test]
    fn quiet_network_uses_tier_floor() {
        let calc = FeeCalculator::default();
        let est = calc.estimate(&[10, 20, 30, 40], Urgency::Medium);
        assert_eq!(est.congestion, Some(CongestionLevel::Low));
        assert_eq!(est.tier, FeeTier::Low);
        assert_eq!(est.priority_fee_lamports, 1_000);
    }

    #[test]
    fn busy_network_escalates_tier() {
        let calc = FeeCalculator::default();
        // median 50_000 -> High congestion; high urgency -> Urgent tier
        let est = calc.estimate(&[20_000, 50_000, 80_000, 90_000], Urgency::High);
        assert_eq!(est.congestion, Some(CongestionLevel::High));
        assert_eq!(est.tier, FeeTier::Urgent);
        assert_eq!(est.priority_fee_lamports, 500_000);
    }

    #[test]
    fn fee_is_clamped_to_max() {
        let calc = FeeCalculator::new(FeePolicy {
            max_priority_fee_lamports: 200_000,
            compute_units: 200_000,
        });
        let est = calc.estimate(&[500_000, 600_000, 700_000], Urgency::High);
        assert_eq!(est.tier, FeeTier::Urgent);
        assert_eq!(est.priority_fee_lamports, 200_000);
        assert_eq!(est.compute_unit_price_micro_lamports, 1_000_000);
    }

    #[test]
    fn market_price_between_floor_and_cap() {
        let calc = FeeCalculator::new(FeePolicy {
            max_priority_fee_lamports: 10_000_000,
            compute_units: 200_000,
        });
        // median 5_000 -> Normal; medium urgency -> Medium tier (10_000 floor);
        // p50 = 5_000 * 200_000 / 1e6 = 1_000 lamports, floor wins
        let est = calc.estimate(&[1_000, 5_000, 9_000], Urgency::Medium);
        assert_eq!(est.tier, FeeTier::Medium);
        assert_eq!(est.priority_fee_lamports, 10_000);

        // High urgency reads p75 = 9_000 -> 1_800 lamports, High floor 100_000 wins
        let est = calc.estimate(&[1_000, 5_000, 9_000], Urgency::High);
        assert_eq!(est.tier, FeeTier::High);
        assert_eq!(est.priority_fee_lamports, 100_000);
    }

    #[test]
    fn extreme_market_fee_exceeds_floor() {
        let calc = FeeCalculator::new(FeePolicy {
            max_priority_fee_lamports: 50_000_000,
            compute_units: 200_000,
        });
        let est = calc.estimate(&[200_000, 300_000, 400_000], Urgency::Low);
        assert_eq!(est.congestion, Some(CongestionLevel::Extreme));
        assert_eq!(est.tier, FeeTier::High);
        // p25 of 3 samples is the first: 200_000 * 200_000 / 1e6 = 40_000 < 100_000 floor
        assert_eq!(est.priority_fee_lamports, 100_000);

        let est = calc.estimate(&[200_000, 3_000_000, 4_000_000], Urgency::High);
        // p75 = 4_000_000 * 200_000 / 1e6 = 800_000 > Urgent floor 500_000
        assert_eq!(est.priority_fee_lamports, 800_000);
    }
}
