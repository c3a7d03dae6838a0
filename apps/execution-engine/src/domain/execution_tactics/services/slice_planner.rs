//! Slice planning for each algorithm.

use std::f64::consts::PI;
use std::time::Duration;

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::domain::execution_tactics::errors::TacticError;
use crate::domain::execution_tactics::value_objects::{ChildSlice, ExecutionAlgorithm};
use crate::domain::shared::{OrderId, Token};

/// Split `total` into child slices for `algorithm`.
///
/// Sizes are rounded down to the token's precision and the last slice takes
/// the remainder, so planned sizes always sum to `total` (after rounding
/// `total` itself). Slices that would round to zero are dropped.
///
/// # Errors
///
/// Returns [`TacticError::InvalidSize`] when `total` rounds to zero and
/// [`TacticError::InvalidConfiguration`] for a zero slice count.
pub fn plan_slices<R: Rng>(
    parent: &OrderId,
    total: Decimal,
    token: &Token,
    algorithm: &ExecutionAlgorithm,
    rng: &mut R,
) -> Result<Vec<ChildSlice>, TacticError> {
    let total = token.round(total);
    if total <= Decimal::ZERO {
        return Err(TacticError::InvalidSize {
            size: total.to_string(),
        });
    }

    let (weights, window, jitter) = match algorithm {
        ExecutionAlgorithm::Immediate => (vec![1.0], Duration::ZERO, 0.0),
        ExecutionAlgorithm::Twap(p) => (vec![1.0; nonzero(p.slices)?], p.window, p.jitter),
        ExecutionAlgorithm::Vwap(p) => {
            let k = nonzero(p.slices)?;
            (volume_weights(&p.profile, k), p.window, p.jitter)
        }
        ExecutionAlgorithm::Iceberg(p) => {
            let k = nonzero(p.slices)?;
            let window = p.interval.saturating_mul(u32::try_from(k).unwrap_or(u32::MAX));
            (vec![1.0; k], window, p.jitter)
        }
    };

    let sizes = split(total, token, &weights);
    let count = sizes.len();
    let interval = window.checked_div(u32::try_from(count).unwrap_or(u32::MAX).max(1));
    let interval = interval.unwrap_or_default();

    let slices = sizes
        .into_iter()
        .enumerate()
        .map(|(index, size)| {
            let offset = jittered_offset(interval, index, jitter, rng);
            ChildSlice::new(parent.clone(), index, size, offset)
        })
        .collect();

    Ok(slices)
}

fn nonzero(slices: usize) -> Result<usize, TacticError> {
    if slices == 0 {
        return Err(TacticError::InvalidConfiguration {
            message: "slice count must be at least 1".to_string(),
        });
    }
    Ok(slices)
}

/// Weighted split with round-down and remainder on the last slice.
fn split(total: Decimal, token: &Token, weights: &[f64]) -> Vec<Decimal> {
    let weight_sum: f64 = weights.iter().sum();
    let mut sizes = Vec::with_capacity(weights.len());
    let mut allocated = Decimal::ZERO;

    for (i, w) in weights.iter().enumerate() {
        if i + 1 == weights.len() {
            sizes.push(total - allocated);
            break;
        }
        let share = Decimal::from_f64(w / weight_sum).unwrap_or_default();
        let size = token.round(total * share).min(total - allocated);
        allocated += size;
        sizes.push(size);
    }

    sizes.retain(|s| *s > Decimal::ZERO);
    sizes
}

/// Default profile: a hump peaking mid-window. A configured profile is
/// resampled to `k` buckets by nearest index.
fn volume_weights(profile: &[f64], k: usize) -> Vec<f64> {
    let usable: Vec<f64> = profile.iter().copied().filter(|w| *w > 0.0).collect();
    if usable.is_empty() {
        if k == 1 {
            return vec![1.0];
        }
        return (0..k)
            .map(|i| 1.0 + 0.5 * (PI * i as f64 / (k - 1) as f64).sin())
            .collect();
    }

    (0..k)
        .map(|i| {
            let pos = i * usable.len() / k;
            usable[pos.min(usable.len() - 1)]
        })
        .collect()
}

fn jittered_offset<R: Rng>(
    interval: Duration,
    index: usize,
    jitter: f64,
    rng: &mut R,
) -> u64 {
    let interval_ms = interval.as_millis() as f64;
    let nominal = interval_ms * index as f64;
    let jitter = jitter.clamp(0.0, 0.99);
    let delta = if jitter > 0.0 && interval_ms > 0.0 {
        rng.random_range(-jitter..=jitter) * interval_ms
    } else {
        0.0
    };
    (nominal + delta).max(0.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::execution_tactics::value_objects::{
        IcebergParams, SliceStatus, TwapParams, VwapParams,
    };
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rust_decimal_macros::dec;

    fn token() -> Token {
        Token::new("MINT", 6)
    }

    fn twap(slices: usize) -> ExecutionAlgorithm {
        ExecutionAlgorithm::Twap(TwapParams {
            slices,
            window: Duration::from_secs(100),
            jitter: 0.4,
        })
    }

    fn total_of(slices: &[ChildSlice]) -> Decimal {
        slices.iter().map(|s| s.planned_size).sum()
    }

    #[test]
    fn immediate_is_single_slice() {
        let mut rng = StdRng::seed_from_u64(1);
        let slices = plan_slices(
            &OrderId::new("o"),
            dec!(12.5),
            &token(),
            &ExecutionAlgorithm::Immediate,
            &mut rng,
        )
        .unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].planned_size, dec!(12.5));
        assert_eq!(slices[0].planned_offset_ms, 0);
        assert_eq!(slices[0].status, SliceStatus::Pending);
    }

    #[test]
    fn twap_equal_split_with_remainder() {
        let mut rng = StdRng::seed_from_u64(7);
        let slices =
            plan_slices(&OrderId::new("o"), dec!(1000), &token(), &twap(3), &mut rng).unwrap();
        assert_eq!(slices.len(), 3);
        assert_eq!(slices[0].planned_size, dec!(333.333333));
        assert_eq!(slices[1].planned_size, dec!(333.333333));
        assert_eq!(slices[2].planned_size, dec!(333.333334));
        assert_eq!(total_of(&slices), dec!(1000));
    }

    #[test]
    fn twap_offsets_stay_within_jitter_band() {
        let mut rng = StdRng::seed_from_u64(42);
        let slices =
            plan_slices(&OrderId::new("o"), dec!(1000), &token(), &twap(10), &mut rng).unwrap();
        // 100s window / 10 slices = 10s nominal interval, +/-40%
        for s in &slices {
            let nominal = s.index as u64 * 10_000;
            let lo = nominal.saturating_sub(4_000);
            let hi = nominal + 4_000;
            assert!(
                (lo..=hi).contains(&s.planned_offset_ms),
                "slice {} offset {} outside [{lo}, {hi}]",
                s.index,
                s.planned_offset_ms
            );
        }
        for pair in slices.windows(2) {
            assert!(pair[0].planned_offset_ms <= pair[1].planned_offset_ms);
        }
    }

    #[test]
    fn vwap_default_profile_weights_middle_heavier() {
        let mut rng = StdRng::seed_from_u64(3);
        let algo = ExecutionAlgorithm::Vwap(VwapParams {
            slices: 5,
            window: Duration::from_secs(50),
            profile: Vec::new(),
            jitter: 0.0,
        });
        let slices = plan_slices(&OrderId::new("o"), dec!(1000), &token(), &algo, &mut rng).unwrap();
        assert_eq!(slices.len(), 5);
        assert!(slices[2].planned_size > slices[0].planned_size);
        assert_eq!(total_of(&slices), dec!(1000));
        assert_eq!(slices[1].planned_offset_ms, 10_000);
    }

    #[test]
    fn vwap_configured_profile_is_resampled() {
        let mut rng = StdRng::seed_from_u64(3);
        let algo = ExecutionAlgorithm::Vwap(VwapParams {
            slices: 2,
            window: Duration::from_secs(10),
            profile: vec![3.0, 3.0, 1.0, 1.0],
            jitter: 0.0,
        });
        let slices = plan_slices(&OrderId::new("o"), dec!(100), &token(), &algo, &mut rng).unwrap();
        assert_eq!(slices[0].planned_size, dec!(75));
        assert_eq!(slices[1].planned_size, dec!(25));
    }

    #[test]
    fn iceberg_spreads_over_interval() {
        let mut rng = StdRng::seed_from_u64(9);
        let algo = ExecutionAlgorithm::Iceberg(IcebergParams {
            slices: 20,
            interval: Duration::from_secs(2),
            max_price_impact_bps: 50,
            jitter: 0.0,
        });
        let slices = plan_slices(&OrderId::new("o"), dec!(100), &token(), &algo, &mut rng).unwrap();
        assert_eq!(slices.len(), 20);
        assert!(slices.iter().all(|s| s.planned_size == dec!(5)));
        assert_eq!(slices[19].planned_offset_ms, 38_000);
    }

    #[test]
    fn tiny_total_drops_empty_slices() {
        let mut rng = StdRng::seed_from_u64(5);
        let tok = Token::new("MINT", 0);
        let slices = plan_slices(&OrderId::new("o"), dec!(3), &tok, &twap(10), &mut rng).unwrap();
        assert_eq!(total_of(&slices), dec!(3));
        assert!(slices.iter().all(|s| s.planned_size > Decimal::ZERO));
        assert!(slices.iter().enumerate().all(|(i, s)| s.index == i));
    }

    #[test]
    fn zero_total_is_rejected() {
        let mut rng = StdRng::seed_from_u64(5);
        let err = plan_slices(&OrderId::new("o"), dec!(0.0000001), &token(), &twap(3), &mut rng)
            .unwrap_err();
        assert!(matches!(err, TacticError::InvalidSize { .. }));
    }

    #[test]
    fn zero_slices_rejected() {
        let mut rng = StdRng::seed_from_u64(5);
        let err =
            plan_slices(&OrderId::new("o"), dec!(10), &token(), &twap(0), &mut rng).unwrap_err();
        assert!(matches!(err, TacticError::InvalidConfiguration { .. }));
    }

    proptest! {
        #[test]
        fn twap_and_vwap_sizes_sum_to_total(
            units in 1u64..10_000_000_000,
            slices in 1usize..50,
            vwap in any::<bool>(),
            seed in any::<u64>(),
        ) {
            let tok = token();
            let total = tok.from_base_units(units);
            let algo = if vwap {
                ExecutionAlgorithm::Vwap(VwapParams {
                    slices,
                    window: Duration::from_secs(60),
                    profile: Vec::new(),
                    jitter: 0.4,
                })
            } else {
                twap(slices)
            };
            let mut rng = StdRng::seed_from_u64(seed);
            let planned = plan_slices(&OrderId::new("p"), total, &tok, &algo, &mut rng).unwrap();
            prop_assert_eq!(total_of(&planned), total);
            prop_assert!(planned.iter().all(|s| s.planned_size > Decimal::ZERO));
        }
    }
}
