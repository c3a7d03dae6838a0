//! Property tests over provider ranking, breakers and slice planning.

use std::sync::Arc;
use std::time::Duration;

use dex_execution_engine::application::services::{HealthMonitor, HealthMonitorConfig};
use dex_execution_engine::domain::execution_tactics::{
    ExecutionAlgorithm, TwapParams, VwapParams, plan_slices,
};
use dex_execution_engine::domain::provider_health::{HealthPolicy, Provider};
use dex_execution_engine::infrastructure::mock::MockRpc;
use dex_execution_engine::resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerState, ManualClock,
};
use dex_execution_engine::{HealthProbe, HealthStatus, OrderId, ProviderId, ProviderRole, Token};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn monitor_with(failures: &[usize]) -> HealthMonitor {
    let monitor = HealthMonitor::new(HealthMonitorConfig::default(), HealthPolicy::default());
    for (i, failed) in failures.iter().enumerate() {
        let id = format!("rpc-{i}");
        monitor.register(
            Provider::new(id.as_str(), format!("http://{id}"), ProviderRole::Rpc),
            Arc::new(MockRpc::new()) as Arc<dyn HealthProbe>,
        );
        let id = ProviderId::new(id);
        for n in 0..20 {
            monitor.record(&id, n >= *failed, Duration::from_millis(50));
        }
    }
    monitor
}

proptest! {
    #[test]
    fn best_provider_is_healthy_when_one_exists(failures in prop::collection::vec(0usize..=20, 2..8)) {
        let monitor = monitor_with(&failures);
        let statuses = monitor.statuses();
        let any_healthy = statuses.iter().any(|s| s.status == HealthStatus::Healthy);

        match monitor.best_provider(ProviderRole::Rpc) {
            Ok(best) => {
                let status = monitor.status_of(&best.id).unwrap();
                prop_assert_ne!(status, HealthStatus::Unhealthy);
                if any_healthy {
                    prop_assert_eq!(status, HealthStatus::Healthy);
                }
            }
            Err(_) => prop_assert!(statuses.iter().all(|s| s.status == HealthStatus::Unhealthy)),
        }
    }

    #[test]
    fn breaker_opens_at_exactly_the_threshold(threshold in 1u32..10, prefix_successes in 0usize..5) {
        let clock = Arc::new(ManualClock::new());
        let breaker = CircuitBreaker::with_clock(
            "rpc:prop",
            CircuitBreakerConfig {
                failure_threshold: threshold,
                recovery_timeout: Duration::from_secs(60),
                call_timeout: Duration::from_secs(5),
            },
            Arc::clone(&clock) as _,
        );
        for _ in 0..prefix_successes {
            breaker.try_acquire().unwrap().success();
        }
        for _ in 1..threshold {
            breaker.try_acquire().unwrap().failure();
            prop_assert_eq!(breaker.state(), CircuitBreakerState::Closed);
        }
        breaker.try_acquire().unwrap().failure();
        prop_assert_eq!(breaker.state(), CircuitBreakerState::Open);

        clock.advance(Duration::from_secs(59));
        prop_assert!(breaker.try_acquire().is_err());
    }

    #[test]
    fn twap_and_vwap_slices_sum_to_the_order(
        units in 1u64..10_000_000,
        decimals in 0u8..9,
        slices in 1usize..50,
        vwap in any::<bool>(),
    ) {
        let token = Token::new("mint", decimals);
        let total = token.round(Decimal::new(i64::try_from(units).unwrap(), 3));
        prop_assume!(total > Decimal::ZERO);

        let algorithm = if vwap {
            ExecutionAlgorithm::Vwap(VwapParams {
                slices,
                window: Duration::from_secs(600),
                profile: Vec::new(),
                jitter: 0.4,
            })
        } else {
            ExecutionAlgorithm::Twap(TwapParams {
                slices,
                window: Duration::from_secs(300),
                jitter: 0.4,
            })
        };

        let planned = plan_slices(&OrderId::new("prop"), total, &token, &algorithm, &mut rand::rng()).unwrap();
        let sum: Decimal = planned.iter().map(|s| s.planned_size).sum();
        prop_assert_eq!(sum, total);
        prop_assert!(planned.iter().all(|s| s.planned_size > Decimal::ZERO));
    }
}
