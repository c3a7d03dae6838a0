//! Exit enforcement: stop loss, take-profit ladder, max hold and the
//! supervised monitor loop.

mod common;

use std::time::Duration;

use common::{Harness, buy, with_algorithm};
use dex_execution_engine::application::services::PositionMonitorConfig;
use dex_execution_engine::domain::position::{LadderRungSpec, PriceLevel};
use dex_execution_engine::domain::risk_management::RiskLimits;
use dex_execution_engine::{
    AlgorithmKind, EngineSettings, ExitPlan, OrderRequest, Position, PositionId, PositionStatus,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

fn settings() -> EngineSettings {
    EngineSettings {
        risk: RiskLimits {
            max_position_notional: dec!(10_000),
            max_total_exposure: dec!(50_000),
            ..RiskLimits::default()
        },
        monitor: PositionMonitorConfig {
            tick_interval: Duration::from_millis(500),
            ..PositionMonitorConfig::default()
        },
        ..EngineSettings::default()
    }
}

fn entry(id: &str, size: Decimal, plan: ExitPlan) -> OrderRequest {
    let mut request = with_algorithm(buy(id, size), AlgorithmKind::Immediate);
    request.exit_plan = Some(plan);
    request
}

fn stop_only(stop: Decimal) -> ExitPlan {
    ExitPlan {
        stop_loss: Some(PriceLevel::absolute(stop)),
        take_profit: Vec::new(),
        ..ExitPlan::default_spot()
    }
}

async fn open(harness: &Harness, id: &str, size: Decimal, plan: ExitPlan) -> Position {
    let result = harness.engine.submit_order(entry(id, size, plan)).await;
    let position_id = result.position_id.expect("entry opens a position");
    harness.engine.get_position(&position_id).await.unwrap()
}

#[tokio::test]
async fn stop_loss_breach_sells_full_size_within_one_tick() {
    let harness = Harness::with_settings(1, dec!(100), settings());
    let position = open(&harness, "c-entry", dec!(10), stop_only(dec!(95))).await;
    assert_eq!(position.entry_price(), dec!(100));
    assert_eq!(position.status(), PositionStatus::Open);

    harness.quote.set_price(dec!(94));
    let monitor = harness.engine.position_monitor();
    let report = monitor.run_pass().await;
    assert_eq!(report.triggered, 1);
    monitor.wait_for_exits().await;

    let closed = harness.engine.get_position(position.id()).await.unwrap();
    assert_eq!(closed.status(), PositionStatus::Closed);
    assert_eq!(closed.size(), dec!(0));
    assert_eq!(closed.realized_pnl(), dec!(-60));
    assert_eq!(harness.signer.signed(), 2);
}

#[tokio::test]
async fn ladder_sells_rung_fraction_of_peak_size() {
    let harness = Harness::with_settings(1, dec!(100), settings());
    let plan = ExitPlan {
        stop_loss: Some(PriceLevel::percent(dec!(-9))),
        take_profit: vec![
            LadderRungSpec {
                fraction: dec!(0.6),
                target: PriceLevel::percent(dec!(8)),
            },
            LadderRungSpec {
                fraction: dec!(0.4),
                target: PriceLevel::percent(dec!(18)),
            },
        ],
        ..ExitPlan::default_spot()
    };
    let position = open(&harness, "ladder-entry", dec!(10), plan).await;

    harness.quote.set_price(dec!(109));
    let monitor = harness.engine.position_monitor();
    assert_eq!(monitor.run_pass().await.triggered, 1);
    monitor.wait_for_exits().await;

    let after_first = harness.engine.get_position(position.id()).await.unwrap();
    assert_eq!(after_first.size(), dec!(4));
    assert_eq!(after_first.status(), PositionStatus::Closing);

    // the first rung does not fire twice
    assert_eq!(monitor.run_pass().await.triggered, 0);

    harness.quote.set_price(dec!(120));
    assert_eq!(monitor.run_pass().await.triggered, 1);
    monitor.wait_for_exits().await;
    let done = harness.engine.get_position(position.id()).await.unwrap();
    assert_eq!(done.status(), PositionStatus::Closed);
}

#[tokio::test]
async fn one_failing_position_does_not_block_others() {
    let harness = Harness::with_settings(1, dec!(100), settings());
    let good = open(&harness, "good-entry", dec!(10), stop_only(dec!(95))).await;

    let mut odd = entry("odd-entry", dec!(10), stop_only(dec!(95)));
    odd.token.mint = "OddMint".to_string();
    let odd = harness.engine.submit_order(odd).await;
    let odd_id = odd.position_id.unwrap();

    harness.quote.set_price(dec!(90));
    harness.quote.fail_mint(
        "OddMint",
        dex_execution_engine::ProviderError::Server {
            status: 502,
            message: "bad gateway".to_string(),
        },
    );

    let monitor = harness.engine.position_monitor();
    let report = monitor.run_pass().await;
    assert_eq!(report.evaluated, 2);
    assert_eq!(report.triggered, 1);
    assert_eq!(report.errors, 1);
    monitor.wait_for_exits().await;

    let good = harness.engine.get_position(good.id()).await.unwrap();
    assert_eq!(good.status(), PositionStatus::Closed);
    let odd = harness.engine.get_position(&odd_id).await.unwrap();
    assert_eq!(odd.status(), PositionStatus::Open);
}

#[tokio::test(start_paused = true)]
async fn supervised_loop_enforces_exits_and_stops_on_shutdown() {
    let harness = Harness::with_settings(1, dec!(100), settings());
    let position = open(&harness, "loop-entry", dec!(10), stop_only(dec!(95))).await;

    let tracker = TaskTracker::new();
    let shutdown = CancellationToken::new();
    harness.engine.start(&tracker, &shutdown);

    harness.quote.set_price(dec!(94));
    tokio::time::sleep(Duration::from_secs(2)).await;

    let closed = harness.engine.get_position(position.id()).await.unwrap();
    assert_eq!(closed.status(), PositionStatus::Closed);
    assert!(harness.engine.position_monitor().passes_completed() >= 2);

    shutdown.cancel();
    tracker.close();
    tokio::time::timeout(Duration::from_secs(5), tracker.wait())
        .await
        .expect("background tasks stop after shutdown");
}

#[tokio::test]
async fn max_hold_exits_regardless_of_price() {
    let harness = Harness::with_settings(1, dec!(100), settings());
    let plan = ExitPlan {
        stop_loss: None,
        take_profit: Vec::new(),
        max_hold_secs: Some(1),
        ..ExitPlan::default_spot()
    };
    let position = open(&harness, "hold-entry", dec!(10), plan).await;

    let monitor = harness.engine.position_monitor();
    assert_eq!(monitor.run_pass().await.triggered, 0);

    // hold time is measured on the wall clock
    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert_eq!(monitor.run_pass().await.triggered, 1);
    monitor.wait_for_exits().await;

    let closed = harness
        .engine
        .get_position(&PositionId::new(position.id().as_str()))
        .await
        .unwrap();
    assert_eq!(closed.status(), PositionStatus::Closed);
    assert_eq!(closed.realized_pnl(), dec!(0));
}

#[tokio::test]
async fn trailing_stop_locks_in_gains_after_a_rally() {
    let harness = Harness::with_settings(1, dec!(100), settings());
    let plan = ExitPlan {
        take_profit: Vec::new(),
        ..ExitPlan::protected_spot()
    };
    let position = open(&harness, "trail-entry", dec!(10), plan).await;
    let monitor = harness.engine.position_monitor();

    harness.quote.set_price(dec!(130));
    assert_eq!(monitor.run_pass().await.triggered, 0);
    let raised = harness.engine.get_position(position.id()).await.unwrap();
    assert_eq!(raised.peak_price(), Some(dec!(130)));
    assert_eq!(raised.stop_loss_price(), Some(dec!(123.5)));

    harness.quote.set_price(dec!(122));
    assert_eq!(monitor.run_pass().await.triggered, 1);
    monitor.wait_for_exits().await;

    let closed = harness.engine.get_position(position.id()).await.unwrap();
    assert_eq!(closed.status(), PositionStatus::Closed);
    assert_eq!(closed.realized_pnl(), dec!(220));
}
