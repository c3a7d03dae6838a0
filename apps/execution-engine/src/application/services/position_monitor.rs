//! Position Monitor Service
//!
//! A single supervised loop evaluates every open and closing position on a
//! fixed tick. Each position is priced through the quote pool and checked
//! against its stop loss, take-profit ladder and max hold. A trigger marks
//! the position closing and submits a sell through the execution engine.
//!
//! Failures are contained per position: an error or panic while evaluating
//! one position is logged and counted, and the pass moves on. Consecutive
//! failing passes escalate to an alert without stopping the loop.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::provider_pool::ProviderPool;
use crate::application::ports::{
    EngineEvent, EventPublisherPort, OrderSubmitPort, QuotePort, QuoteRequest,
};
use crate::domain::execution_tactics::AlgorithmKind;
use crate::domain::order_execution::{OrderRequest, OrderStatus};
use crate::domain::position::{
    ExitOrder, Position, PositionError, PositionRepository, PositionUpdate, PositionUpdateReason,
};
use crate::domain::shared::{PositionId, Side, Urgency};
use crate::observability::{
    record_exit_triggered, record_monitor_alert, record_monitor_evaluation_error,
    record_monitor_pass,
};

/// Configuration for the position monitor service.
#[derive(Debug, Clone)]
pub struct PositionMonitorConfig {
    /// Whether position monitoring is enabled.
    pub enabled: bool,
    /// Evaluation pass interval.
    pub tick_interval: Duration,
    /// Slippage tolerance for exit orders.
    pub exit_slippage_bps: u32,
    /// Urgency (fee tier) for exit orders.
    pub exit_urgency: Urgency,
    /// Consecutive failing passes before an alert is raised.
    pub alert_after_failed_passes: u32,
}

impl Default for PositionMonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval: Duration::from_secs(1),
            exit_slippage_bps: 300,
            exit_urgency: Urgency::High,
            alert_after_failed_passes: 5,
        }
    }
}

/// Position monitor errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PositionMonitorError {
    /// Service is not enabled.
    #[error("position monitor is not enabled")]
    NotEnabled,

    /// Price lookup failed.
    #[error("price feed error for {position_id}: {message}")]
    PriceFeedError {
        /// Position id.
        position_id: String,
        /// Error details.
        message: String,
    },

    /// The position rejected the evaluation.
    #[error("evaluation failed for {position_id}: {source}")]
    EvaluationFailed {
        /// Position id.
        position_id: String,
        /// Domain error.
        source: PositionError,
    },

    /// Evaluation panicked.
    #[error("evaluation panicked for {position_id}")]
    Panicked {
        /// Position id.
        position_id: String,
    },

    /// Position store unavailable.
    #[error("position repository error: {message}")]
    RepositoryError {
        /// Error details.
        message: String,
    },
}

impl PositionMonitorError {
    /// Metric label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotEnabled => "not_enabled",
            Self::PriceFeedError { .. } => "price_feed",
            Self::EvaluationFailed { .. } => "evaluation",
            Self::Panicked { .. } => "panic",
            Self::RepositoryError { .. } => "repository",
        }
    }
}

/// Outcome of one evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Positions evaluated.
    pub evaluated: usize,
    /// Exits started.
    pub triggered: usize,
    /// Positions whose evaluation failed.
    pub errors: usize,
}

/// Position monitor service for stop-loss, take-profit and max-hold exits.
pub struct PositionMonitorService {
    config: PositionMonitorConfig,
    positions: Arc<dyn PositionRepository>,
    quotes: Arc<ProviderPool<dyn QuotePort>>,
    orders: Arc<dyn OrderSubmitPort>,
    events: Arc<dyn EventPublisherPort>,
    exits: TaskTracker,
    passes: AtomicU64,
    failing_passes: AtomicU32,
}

impl std::fmt::Debug for PositionMonitorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionMonitorService")
            .field("config", &self.config)
            .field("passes", &self.passes.load(Ordering::Relaxed))
            .field("exits_in_flight", &self.exits.len())
            .finish_non_exhaustive()
    }
}

impl PositionMonitorService {
    /// Create a new position monitor service.
    #[must_use]
    pub fn new(
        config: PositionMonitorConfig,
        positions: Arc<dyn PositionRepository>,
        quotes: Arc<ProviderPool<dyn QuotePort>>,
        orders: Arc<dyn OrderSubmitPort>,
        events: Arc<dyn EventPublisherPort>,
    ) -> Self {
        Self {
            config,
            positions,
            quotes,
            orders,
            events,
            exits: TaskTracker::new(),
            passes: AtomicU64::new(0),
            failing_passes: AtomicU32::new(0),
        }
    }

    /// Spawn the monitoring loop on `tracker`.
    ///
    /// # Errors
    ///
    /// Returns `PositionMonitorError::NotEnabled` if monitoring is disabled.
    pub fn start(
        self: &Arc<Self>,
        tracker: &TaskTracker,
        shutdown: CancellationToken,
    ) -> Result<(), PositionMonitorError> {
        if !self.config.enabled {
            return Err(PositionMonitorError::NotEnabled);
        }
        tracing::info!(
            tick_ms = self.config.tick_interval.as_millis() as u64,
            "Starting position monitor service"
        );
        tracker.spawn(Arc::clone(self).run(shutdown));
        Ok(())
    }

    /// Run passes until `shutdown` fires.
    ///
    /// A pass in progress when shutdown fires runs to completion; exits it
    /// started are awaited before returning.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }

            if AssertUnwindSafe(self.run_pass()).catch_unwind().await.is_err() {
                tracing::error!("Position monitor pass panicked");
                self.note_pass(false);
            }
        }

        self.exits.close();
        self.exits.wait().await;
        tracing::info!("Position monitor stopped");
    }

    /// Evaluate every active position once.
    #[tracing::instrument(name = "monitor.pass", skip_all)]
    pub async fn run_pass(&self) -> PassReport {
        let started = Instant::now();
        let ids = match self.positions.active_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list active positions");
                record_monitor_evaluation_error("repository");
                self.note_pass(false);
                return PassReport {
                    errors: 1,
                    ..PassReport::default()
                };
            }
        };

        let outcomes = futures::future::join_all(ids.iter().map(|id| async move {
            match AssertUnwindSafe(self.evaluate_position(id)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => Err(PositionMonitorError::Panicked {
                    position_id: id.to_string(),
                }),
            }
        }))
        .await;

        let mut report = PassReport {
            evaluated: ids.len(),
            ..PassReport::default()
        };
        for (id, outcome) in ids.iter().zip(outcomes) {
            match outcome {
                Ok(Some(_)) => report.triggered += 1,
                Ok(None) => {}
                Err(e) => {
                    report.errors += 1;
                    record_monitor_evaluation_error(e.kind());
                    tracing::error!(position_id = %id, error = %e, "Position evaluation failed");
                }
            }
        }

        record_monitor_pass(ids.len(), started.elapsed().as_secs_f64());
        self.note_pass(report.errors == 0);
        report
    }

    /// Completed passes.
    #[must_use]
    pub fn passes_completed(&self) -> u64 {
        self.passes.load(Ordering::SeqCst)
    }

    /// Consecutive passes with at least one failure.
    #[must_use]
    pub fn consecutive_failed_passes(&self) -> u32 {
        self.failing_passes.load(Ordering::SeqCst)
    }

    /// Wait for every exit order started so far to complete.
    pub async fn wait_for_exits(&self) {
        self.exits.close();
        self.exits.wait().await;
        self.exits.reopen();
    }

    fn note_pass(&self, clean: bool) {
        self.passes.fetch_add(1, Ordering::SeqCst);
        if clean {
            self.failing_passes.store(0, Ordering::SeqCst);
            return;
        }

        let failing = self.failing_passes.fetch_add(1, Ordering::SeqCst) + 1;
        let threshold = self.config.alert_after_failed_passes.max(1);
        if failing % threshold == 0 {
            record_monitor_alert();
            tracing::error!(
                consecutive_failed_passes = failing,
                "ALERT: position monitor passes keep failing"
            );
        }
    }

    async fn evaluate_position(
        &self,
        id: &PositionId,
    ) -> Result<Option<ExitOrder>, PositionMonitorError> {
        let position = self.positions.get(id).await.map_err(repository)?;
        let Some(position) = position else {
            return Ok(None);
        };
        if !position.status().is_active() || position.pending_exit().is_some() {
            return Ok(None);
        }

        let price = self.current_price(&position).await?;
        let now = Utc::now();
        let mut exit: Option<ExitOrder> = None;
        let mut raised_stop: Option<Decimal> = None;

        let updated = self
            .positions
            .update(id, &mut |p| {
                exit = None;
                let stop_before = p.stop_loss_price();
                let evaluated = p.evaluate(price, now)?;
                raised_stop = p.stop_loss_price().filter(|_| p.stop_loss_price() != stop_before);
                let Some(trigger) = evaluated else {
                    return Ok(());
                };
                match p.begin_exit(trigger, now) {
                    Ok(order) => exit = Some(order),
                    Err(PositionError::NothingToExit { reason }) => {
                        tracing::debug!(position_id = %p.id(), reason, "Exit skipped");
                    }
                    Err(e) => return Err(e),
                }
                Ok(())
            })
            .await
            .map_err(|source| PositionMonitorError::EvaluationFailed {
                position_id: id.to_string(),
                source,
            })?;

        if let Some(stop) = raised_stop {
            tracing::info!(
                position_id = %id,
                stop = %stop,
                peak = ?updated.peak_price(),
                entry = %updated.entry_price(),
                "Stop raised"
            );
        }

        let Some(exit) = exit else {
            return Ok(None);
        };

        record_exit_triggered(exit.trigger.kind());
        tracing::warn!(
            position_id = %id,
            trigger = exit.trigger.kind(),
            price = %price,
            entry = %updated.entry_price(),
            size = %exit.size,
            exit_order_id = %exit.order_id,
            "Exit triggered"
        );
        self.publish(PositionUpdate::from_position(
            &updated,
            Some(exit.order_id.clone()),
            PositionUpdateReason::ExitStarted {
                trigger: exit.trigger,
            },
        ))
        .await;
        self.spawn_exit(&updated, &exit, price);
        Ok(Some(exit))
    }

    async fn current_price(&self, position: &Position) -> Result<Decimal, PositionMonitorError> {
        let request = QuoteRequest {
            token: position.token().clone(),
            side: Side::Sell,
            amount: position.size(),
            slippage_bps: self.config.exit_slippage_bps,
        };
        let request = &request;
        let (quote, _) = self
            .quotes
            .call("quote", |q| async move { q.quote(request).await })
            .await
            .map_err(|e| PositionMonitorError::PriceFeedError {
                position_id: position.id().to_string(),
                message: e.to_string(),
            })?;
        Ok(quote.price)
    }

    fn spawn_exit(&self, position: &Position, exit: &ExitOrder, price: Decimal) {
        let request = OrderRequest {
            id: exit.order_id.clone(),
            token: position.token().clone(),
            side: Side::Sell,
            size: exit.size,
            max_slippage_bps: self.config.exit_slippage_bps,
            urgency: self.config.exit_urgency,
            algorithm_hint: Some(AlgorithmKind::Immediate),
            expected_price: Some(price),
            position_id: Some(position.id().clone()),
            exit_plan: None,
        };
        let position_id = position.id().clone();
        let orders = Arc::clone(&self.orders);
        let positions = Arc::clone(&self.positions);
        let events = Arc::clone(&self.events);

        self.exits.spawn(async move {
            let result = orders.submit(request).await;
            if result.status == OrderStatus::Filled {
                tracing::info!(
                    position_id = %position_id,
                    order_id = %result.order_id,
                    filled = %result.filled_size,
                    "Exit order filled"
                );
            } else {
                tracing::warn!(
                    position_id = %position_id,
                    order_id = %result.order_id,
                    status = %result.status,
                    filled = %result.filled_size,
                    requested = %result.requested_size,
                    "Exit order incomplete"
                );
            }

            // fills were applied by the engine; clear an exit that never filled
            let order_id = result.order_id.clone();
            let mut cleared = false;
            let outcome = positions
                .update(&position_id, &mut |p| {
                    cleared = false;
                    if p.pending_exit().is_some_and(|e| e.order_id == order_id) {
                        p.settle_exit(&order_id, Decimal::ZERO, None, Utc::now())?;
                        cleared = true;
                    }
                    Ok(())
                })
                .await;

            match outcome {
                Ok(position) if cleared => {
                    tracing::warn!(position_id = %position_id, "Exit produced no fill, position re-armed");
                    let update = PositionUpdate::from_position(
                        &position,
                        Some(order_id),
                        PositionUpdateReason::ExitSettled,
                    );
                    if let Err(e) = events.publish(EngineEvent::PositionUpdated(update)).await {
                        tracing::debug!(error = %e, "Position update not delivered");
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(position_id = %position_id, error = %e, "Failed to settle exit");
                }
            }
        });
    }

    async fn publish(&self, update: PositionUpdate) {
        if let Err(e) = self.events.publish(EngineEvent::PositionUpdated(update)).await {
            tracing::debug!(error = %e, "Position update not delivered");
        }
    }
}

fn repository(err: PositionError) -> PositionMonitorError {
    PositionMonitorError::RepositoryError {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::application::ports::{
        HealthProbe, NoOpEventPublisher, ProviderError, Quote, SwapParams, UnsignedTransaction,
    };
    use crate::application::services::{HealthMonitor, HealthMonitorConfig};
    use crate::domain::order_execution::OrderResult;
    use crate::domain::position::{ExitPlan, PositionStatus, PriceLevel};
    use crate::domain::provider_health::{HealthPolicy, Provider, ProviderRole};
    use crate::domain::shared::{ProviderId, Token};
    use crate::error::{ExecutionError, PermanentErrorKind};
    use crate::infrastructure::mock::MockQuote;
    use crate::infrastructure::persistence::InMemoryPositionRepository;
    use crate::resilience::{CircuitBreakerConfig, CircuitBreakerRegistry};

    /// Records requests and reports nothing filled.
    #[derive(Default)]
    struct RecordingSubmitter {
        requests: Mutex<Vec<OrderRequest>>,
    }

    #[async_trait]
    impl OrderSubmitPort for RecordingSubmitter {
        async fn submit(&self, request: OrderRequest) -> OrderResult {
            self.requests.lock().push(request.clone());
            let err = ExecutionError::TransientProvider {
                message: "test".to_string(),
            };
            OrderResult::failed(&request, &err, Utc::now())
        }
    }

    /// Quote provider that panics for one mint.
    struct PanickingQuote {
        inner: MockQuote,
        poison: &'static str,
    }

    #[async_trait]
    impl QuotePort for PanickingQuote {
        async fn quote(&self, request: &QuoteRequest) -> Result<Quote, ProviderError> {
            assert_ne!(request.token.mint, self.poison, "malformed price feed");
            self.inner.quote(request).await
        }

        async fn swap_transaction(
            &self,
            quote: &Quote,
            params: &SwapParams,
        ) -> Result<UnsignedTransaction, ProviderError> {
            self.inner.swap_transaction(quote, params).await
        }
    }

    #[async_trait]
    impl HealthProbe for PanickingQuote {
        async fn probe(&self) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    fn quote_pool(quote: Arc<dyn QuotePort>, probe: Arc<dyn HealthProbe>) -> Arc<ProviderPool<dyn QuotePort>> {
        let health = Arc::new(HealthMonitor::new(
            HealthMonitorConfig::default(),
            HealthPolicy::default(),
        ));
        health.register(Provider::new("q1", "mock://q1", ProviderRole::Quote), probe);
        let breakers = Arc::new(CircuitBreakerRegistry::new(CircuitBreakerConfig::default()));
        Arc::new(
            ProviderPool::new(ProviderRole::Quote, health, breakers)
                .with_provider(ProviderId::new("q1"), quote),
        )
    }

    fn plan() -> ExitPlan {
        ExitPlan {
            stop_loss: Some(PriceLevel::absolute(dec!(95))),
            take_profit: Vec::new(),
            ..ExitPlan::default_spot()
        }
    }

    async fn open(repo: &InMemoryPositionRepository, id: &str, mint: &str) {
        let position = Position::open(
            PositionId::new(id),
            Token::new(mint, 6),
            dec!(10),
            dec!(100),
            plan(),
            Utc::now(),
        )
        .unwrap();
        repo.insert(position).await.unwrap();
    }

    fn service(
        repo: &Arc<InMemoryPositionRepository>,
        quotes: Arc<ProviderPool<dyn QuotePort>>,
        submitter: &Arc<RecordingSubmitter>,
    ) -> Arc<PositionMonitorService> {
        Arc::new(PositionMonitorService::new(
            PositionMonitorConfig::default(),
            Arc::clone(repo) as Arc<dyn PositionRepository>,
            quotes,
            Arc::clone(submitter) as Arc<dyn OrderSubmitPort>,
            Arc::new(NoOpEventPublisher),
        ))
    }

    #[tokio::test]
    async fn stop_loss_breach_submits_full_exit_in_one_pass() {
        let repo = Arc::new(InMemoryPositionRepository::new());
        open(&repo, "p1", "MINT").await;
        let quote = Arc::new(MockQuote::new(dec!(94)));
        let submitter = Arc::new(RecordingSubmitter::default());
        let monitor = service(
            &repo,
            quote_pool(Arc::clone(&quote) as Arc<dyn QuotePort>, quote),
            &submitter,
        );

        let report = monitor.run_pass().await;
        assert_eq!(report.triggered, 1);
        let position = repo.get(&PositionId::new("p1")).await.unwrap().unwrap();
        assert_eq!(position.status(), PositionStatus::Closing);

        monitor.wait_for_exits().await;
        let requests = submitter.requests.lock().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].side, Side::Sell);
        assert_eq!(requests[0].size, dec!(10));
        assert_eq!(requests[0].position_id, Some(PositionId::new("p1")));

        // the unfilled exit is cleared so the next pass can retry
        let position = repo.get(&PositionId::new("p1")).await.unwrap().unwrap();
        assert!(position.pending_exit().is_none());
        assert_eq!(position.status(), PositionStatus::Closing);
    }

    #[tokio::test]
    async fn price_above_stop_does_nothing() {
        let repo = Arc::new(InMemoryPositionRepository::new());
        open(&repo, "p1", "MINT").await;
        let quote = Arc::new(MockQuote::new(dec!(99)));
        let submitter = Arc::new(RecordingSubmitter::default());
        let monitor = service(
            &repo,
            quote_pool(Arc::clone(&quote) as Arc<dyn QuotePort>, quote),
            &submitter,
        );

        let report = monitor.run_pass().await;
        assert_eq!(report, PassReport { evaluated: 1, triggered: 0, errors: 0 });
        assert!(submitter.requests.lock().is_empty());
    }

    #[tokio::test]
    async fn failing_position_does_not_block_others() {
        let repo = Arc::new(InMemoryPositionRepository::new());
        open(&repo, "bad", "BAD").await;
        open(&repo, "good", "GOOD").await;
        let quote = Arc::new(MockQuote::new(dec!(94)));
        quote.fail_mint(
            "BAD",
            ProviderError::Permanent {
                kind: PermanentErrorKind::InvalidToken,
                message: "invalid mint".to_string(),
            },
        );
        let submitter = Arc::new(RecordingSubmitter::default());
        let monitor = service(
            &repo,
            quote_pool(Arc::clone(&quote) as Arc<dyn QuotePort>, quote),
            &submitter,
        );

        let report = monitor.run_pass().await;
        assert_eq!(report.errors, 1);
        assert_eq!(report.triggered, 1);
        assert_eq!(monitor.consecutive_failed_passes(), 1);
    }

    #[tokio::test]
    async fn panic_in_one_evaluation_is_contained() {
        let repo = Arc::new(InMemoryPositionRepository::new());
        open(&repo, "p", "POISON").await;
        open(&repo, "q", "GOOD").await;
        let quote = Arc::new(PanickingQuote {
            inner: MockQuote::new(dec!(94)),
            poison: "POISON",
        });
        let submitter = Arc::new(RecordingSubmitter::default());
        let monitor = service(
            &repo,
            quote_pool(Arc::clone(&quote) as Arc<dyn QuotePort>, quote),
            &submitter,
        );

        let report = monitor.run_pass().await;
        assert_eq!(report.errors, 1);
        assert_eq!(report.triggered, 1);
        let q = repo.get(&PositionId::new("q")).await.unwrap().unwrap();
        assert_eq!(q.status(), PositionStatus::Closing);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_keeps_running_after_failures_and_stops_on_shutdown() {
        let repo = Arc::new(InMemoryPositionRepository::new());
        open(&repo, "p", "POISON").await;
        let quote = Arc::new(PanickingQuote {
            inner: MockQuote::new(dec!(99)),
            poison: "POISON",
        });
        let submitter = Arc::new(RecordingSubmitter::default());
        let monitor = service(
            &repo,
            quote_pool(Arc::clone(&quote) as Arc<dyn QuotePort>, quote),
            &submitter,
        );

        let tracker = TaskTracker::new();
        let shutdown = CancellationToken::new();
        monitor.start(&tracker, shutdown.clone()).unwrap();

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert!(monitor.passes_completed() >= 3);
        assert!(monitor.consecutive_failed_passes() >= 3);

        shutdown.cancel();
        tracker.close();
        tracker.wait().await;
    }

    #[test]
    fn disabled_monitor_refuses_to_start() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let repo = Arc::new(InMemoryPositionRepository::new());
            let quote = Arc::new(MockQuote::new(dec!(1)));
            let submitter = Arc::new(RecordingSubmitter::default());
            let monitor = Arc::new(PositionMonitorService::new(
                PositionMonitorConfig {
                    enabled: false,
                    ..PositionMonitorConfig::default()
                },
                repo,
                quote_pool(Arc::clone(&quote) as Arc<dyn QuotePort>, quote),
                submitter,
                Arc::new(NoOpEventPublisher),
            ));
            let err = monitor
                .start(&TaskTracker::new(), CancellationToken::new())
                .unwrap_err();
            assert_eq!(err, PositionMonitorError::NotEnabled);
        });
    }
}
