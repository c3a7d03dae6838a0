//! Submit Order Use Case
//!
//! Runs an order request end to end:
//!
//! 1. Idempotency claim (a repeated id returns the cached result). The
//!    claimed order then runs on its own task, so a caller that goes away
//!    cannot leave the claim unresolved.
//! 2. Validation, target position check and a market snapshot (reference
//!    price, visible liquidity)
//! 3. Risk gate: buys against every limit including exposure reserved by
//!    buys still executing, sells for reduce-only
//! 4. Algorithm selection and slice planning
//! 5. Slice execution: TWAP/VWAP in sequence order, Immediate/Iceberg as
//!    spawned tasks bounded per order
//! 6. Position bookkeeping and publication of the aggregate result

use std::collections::{HashMap, HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use futures::FutureExt;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use super::slice_executor::{SliceExecutor, SliceJob};
use crate::application::ports::{
    EngineEvent, EventPublisherPort, OrderSubmitPort, QuoteRequest,
};
use crate::domain::execution_tactics::{
    ChildSlice, SelectionContext, TacticSelector, plan_slices,
};
use crate::domain::order_execution::{
    Fill, IdempotencyClaim, IdempotencyStore, OrderRequest, OrderResult,
};
use crate::domain::position::{
    ExitPlan, ExitSettlement, Position, PositionError, PositionRepository, PositionStatus,
    PositionUpdate, PositionUpdateReason,
};
use crate::domain::risk_management::{RiskContext, RiskDecision, RiskDenial, RiskManager};
use crate::domain::shared::{OrderId, PositionId, Side};
use crate::error::{ErrorInfo, ExecutionError, PermanentErrorKind};
use crate::observability::{
    record_idempotent_replay, record_order_completed, record_risk_denial,
};
use crate::resilience::RetryPolicy;

/// Smallest price impact used when deriving liquidity from a quote.
const MIN_IMPACT_BPS: Decimal = dec!(0.01);

/// Execution tuning shared by every order.
#[derive(Debug, Clone)]
pub struct ExecutionSettings {
    /// Slice retry backoff.
    pub retry: RetryPolicy,
    /// Slices of one order in flight at once (Immediate and Iceberg).
    pub slice_concurrency: usize,
    /// Exit plan for buys that carry none.
    pub default_exit_plan: ExitPlan,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            slice_concurrency: 3,
            default_exit_plan: ExitPlan::default_spot(),
        }
    }
}

/// In-flight orders and their cancellation tokens.
#[derive(Debug, Default)]
pub struct ActiveOrders {
    tokens: Mutex<HashMap<OrderId, CancellationToken>>,
}

impl ActiveOrders {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, id: &OrderId) -> CancellationToken {
        let token = CancellationToken::new();
        self.tokens.lock().insert(id.clone(), token.clone());
        token
    }

    fn finish(&self, id: &OrderId) {
        self.tokens.lock().remove(id);
    }

    /// Cancel the unscheduled slices of an in-flight order.
    ///
    /// Returns false when the order is unknown or already complete.
    pub fn cancel(&self, id: &OrderId) -> bool {
        match self.tokens.lock().get(id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether `id` is executing.
    #[must_use]
    pub fn contains(&self, id: &OrderId) -> bool {
        self.tokens.lock().contains_key(id)
    }
}

/// Accepted exposure-adding orders over the last hour.
#[derive(Debug, Default)]
struct OrderRateTracker {
    accepted: Mutex<VecDeque<DateTime<Utc>>>,
}

impl OrderRateTracker {
    fn count(&self, now: DateTime<Utc>) -> u32 {
        let mut accepted = self.accepted.lock();
        let horizon = now - TimeDelta::hours(1);
        while accepted.front().is_some_and(|t| *t <= horizon) {
            accepted.pop_front();
        }
        u32::try_from(accepted.len()).unwrap_or(u32::MAX)
    }

    fn record(&self, at: DateTime<Utc>) {
        self.accepted.lock().push_back(at);
    }
}

/// Buy exposure approved by the risk gate whose fills are not yet applied.
#[derive(Debug, Default)]
struct Reservations {
    pending: HashMap<OrderId, Reservation>,
}

#[derive(Debug)]
struct Reservation {
    target: PositionId,
    notional: Decimal,
}

impl Reservations {
    /// Distinct reserved positions not yet in `active`.
    fn new_positions(&self, active: &[Position]) -> usize {
        let targets: HashSet<&PositionId> = self
            .pending
            .values()
            .map(|r| &r.target)
            .filter(|target| active.iter().all(|p| p.id() != *target))
            .collect();
        targets.len()
    }

    fn notional(&self) -> Decimal {
        self.pending.values().map(|r| r.notional).sum()
    }
}

/// Releases an order's reservation when dropped.
struct ReservationGuard<'a> {
    reservations: &'a Mutex<Reservations>,
    order_id: Option<OrderId>,
}

impl Drop for ReservationGuard<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.order_id.take() {
            self.reservations.lock().pending.remove(&id);
        }
    }
}

enum Approval<'a> {
    Granted(ReservationGuard<'a>),
    Denied(RiskDenial),
}

struct MarketSnapshot {
    price: Option<Decimal>,
    visible_liquidity: Option<Decimal>,
}

/// Use case for submitting orders.
pub struct SubmitOrderUseCase {
    pipeline: Arc<OrderPipeline>,
    orders: TaskTracker,
}

struct OrderPipeline {
    executor: Arc<SliceExecutor>,
    selector: TacticSelector,
    risk: RiskManager,
    positions: Arc<dyn PositionRepository>,
    idempotency: Arc<dyn IdempotencyStore>,
    events: Arc<dyn EventPublisherPort>,
    active: Arc<ActiveOrders>,
    rate: OrderRateTracker,
    // one risk decision at a time so reservations are seen by the next one
    approvals: tokio::sync::Mutex<()>,
    reservations: Mutex<Reservations>,
    settings: ExecutionSettings,
}

impl std::fmt::Debug for SubmitOrderUseCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmitOrderUseCase")
            .field("executor", &self.pipeline.executor)
            .field("selector", &self.pipeline.selector)
            .field("risk", &self.pipeline.risk)
            .field("settings", &self.pipeline.settings)
            .field("in_flight", &self.orders.len())
            .finish_non_exhaustive()
    }
}

impl SubmitOrderUseCase {
    /// Create a new SubmitOrderUseCase.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        executor: Arc<SliceExecutor>,
        selector: TacticSelector,
        risk: RiskManager,
        positions: Arc<dyn PositionRepository>,
        idempotency: Arc<dyn IdempotencyStore>,
        events: Arc<dyn EventPublisherPort>,
        active: Arc<ActiveOrders>,
        settings: ExecutionSettings,
    ) -> Self {
        Self {
            pipeline: Arc::new(OrderPipeline {
                executor,
                selector,
                risk,
                positions,
                idempotency,
                events,
                active,
                rate: OrderRateTracker::default(),
                approvals: tokio::sync::Mutex::new(()),
                reservations: Mutex::new(Reservations::default()),
                settings,
            }),
            orders: TaskTracker::new(),
        }
    }

    /// Execute the use case.
    ///
    /// Never fails: every outcome, including denial and internal faults, is
    /// an [`OrderResult`]. The result is stored under the request id before
    /// it is returned. Once the id is claimed the order runs to completion
    /// even if this future is dropped.
    #[tracing::instrument(
        name = "order.submit",
        skip_all,
        fields(order_id = %request.id, side = %request.side, mint = %request.token.mint)
    )]
    pub async fn execute(&self, request: OrderRequest) -> OrderResult {
        let pipeline = &self.pipeline;
        match pipeline.idempotency.claim(&request.id).await {
            IdempotencyClaim::Completed(result) => {
                record_idempotent_replay();
                tracing::info!(order_id = %request.id, "Returning cached result for repeated order id");
                return *result;
            }
            IdempotencyClaim::InFlight => {
                record_idempotent_replay();
                tracing::info!(order_id = %request.id, "Order id already executing, waiting for its result");
                if let Some(result) = pipeline.idempotency.wait(&request.id).await {
                    return result;
                }
                let err = ExecutionError::Internal {
                    message: "in-flight order vanished from the idempotency store".to_string(),
                };
                return OrderResult::failed(&request, &err, Utc::now());
            }
            IdempotencyClaim::Acquired => {}
        }

        let fallback = request.clone();
        let task = {
            let pipeline = Arc::clone(pipeline);
            self.orders
                .spawn(async move { pipeline.execute_claimed(request).await }.in_current_span())
        };
        match task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(order_id = %fallback.id, error = %e, "Order task did not complete");
                let err = ExecutionError::Internal {
                    message: format!("order task did not complete: {e}"),
                };
                let result = OrderResult::failed(&fallback, &err, Utc::now());
                pipeline.active.finish(&fallback.id);
                pipeline.idempotency.complete(&fallback.id, result.clone()).await;
                result
            }
        }
    }

    /// Wait until every claimed order has completed.
    pub async fn drain(&self) {
        self.orders.close();
        self.orders.wait().await;
        self.orders.reopen();
    }

    /// Cached result of a completed order.
    pub async fn get_order(&self, id: &OrderId) -> Option<OrderResult> {
        self.pipeline.idempotency.get(id).await
    }
}

impl OrderPipeline {
    async fn execute_claimed(&self, request: OrderRequest) -> OrderResult {
        let started = Instant::now();
        let cancel = self.active.register(&request.id);
        let result = match AssertUnwindSafe(self.run(&request, &cancel)).catch_unwind().await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(order_id = %request.id, "Order execution panicked");
                let err = ExecutionError::Internal {
                    message: "order execution panicked".to_string(),
                };
                OrderResult::failed(&request, &err, Utc::now())
            }
        };
        self.active.finish(&request.id);
        self.idempotency.complete(&request.id, result.clone()).await;

        let algorithm = result.algorithm.map_or("none", |a| a.as_str());
        record_order_completed(algorithm, result.status.as_str(), started.elapsed().as_secs_f64());
        tracing::info!(
            order_id = %result.order_id,
            status = %result.status,
            algorithm,
            requested = %result.requested_size,
            filled = %result.filled_size,
            failed = %result.failed_size,
            cancelled = %result.cancelled_size,
            "Order completed"
        );

        self.publish(EngineEvent::OrderCompleted(Box::new(result.clone())))
            .await;
        result
    }

    async fn run(&self, request: &OrderRequest, cancel: &CancellationToken) -> OrderResult {
        let accepted_at = Utc::now();
        if let Err(e) = request.validate() {
            return OrderResult::failed(request, &e.into(), accepted_at);
        }
        if let Err(e) = self.check_target(request).await {
            return OrderResult::failed(request, &e, accepted_at);
        }

        let snapshot = match self.snapshot(request).await {
            Ok(snapshot) => snapshot,
            Err(e) => return OrderResult::failed(request, &e, Utc::now()),
        };
        let Some(expected_price) = request.expected_price.or(snapshot.price) else {
            let err = ExecutionError::TransientProvider {
                message: "no reference price available".to_string(),
            };
            return OrderResult::failed(request, &err, Utc::now());
        };

        let _reservation = match self.check_risk(request, expected_price).await {
            Ok(Approval::Granted(reservation)) => reservation,
            Ok(Approval::Denied(denial)) => {
                record_risk_denial(denial.reason.code());
                tracing::info!(
                    order_id = %request.id,
                    reason = %denial.reason,
                    observed = %denial.observed,
                    limit = %denial.limit,
                    "Order denied by risk gate"
                );
                return OrderResult::denied(request, denial, Utc::now());
            }
            Err(e) => return OrderResult::failed(request, &e, Utc::now()),
        };

        let algorithm = self.selector.select(&SelectionContext {
            size: request.size,
            visible_liquidity: snapshot.visible_liquidity,
            urgency: request.urgency,
            hint: request.algorithm_hint,
        });
        let planned = plan_slices(
            &request.id,
            request.size,
            &request.token,
            &algorithm,
            &mut rand::rng(),
        );
        let slices = match planned {
            Ok(slices) => slices,
            Err(e) => {
                let err = ExecutionError::InvalidRequest {
                    message: e.to_string(),
                };
                return OrderResult::failed(request, &err, Utc::now());
            }
        };

        tracing::info!(
            order_id = %request.id,
            mint = %request.token.mint,
            side = %request.side,
            size = %request.size,
            algorithm = algorithm.kind().as_str(),
            slices = slices.len(),
            expected_price = %expected_price,
            "Executing order"
        );

        let job = SliceJob {
            token: request.token.clone(),
            side: request.side,
            urgency: request.urgency,
            max_slippage_bps: request.max_slippage_bps,
            expected_price,
            max_price_impact_bps: algorithm.max_price_impact_bps(),
            algorithm: algorithm.kind(),
        };
        let (slices, fills, abort) = if algorithm.is_sequential() {
            self.run_sequential(&job, slices, cancel).await
        } else {
            self.run_concurrent(job, slices, cancel).await
        };

        let result = OrderResult::from_slices(
            request,
            algorithm.kind(),
            slices,
            fills,
            abort.as_ref(),
            accepted_at,
            Utc::now(),
        );
        match self.apply_to_position(request, &result).await {
            Ok(position_id) => result.with_position(position_id),
            Err(e) => {
                tracing::error!(order_id = %request.id, error = %e, "Failed to apply fills to position");
                result.with_error(&ExecutionError::Internal {
                    message: format!("fills not applied to position: {e}"),
                })
            }
        }
    }

    /// A buy that names a position must add to one that exists and is not
    /// closed. Sells are checked by the risk gate.
    async fn check_target(&self, request: &OrderRequest) -> Result<(), ExecutionError> {
        let (Side::Buy, Some(id)) = (request.side, request.position_id.as_ref()) else {
            return Ok(());
        };
        match self.positions.get(id).await.map_err(internal)? {
            Some(position) if position.status() != PositionStatus::Closed => Ok(()),
            Some(_) => Err(ExecutionError::InvalidRequest {
                message: format!("position {id} is closed"),
            }),
            None => Err(ExecutionError::InvalidRequest {
                message: format!("position {id} does not exist"),
            }),
        }
    }

    /// Reference price and liquidity from a quote for the full size.
    ///
    /// Liquidity is the size at which the quoted impact would reach 100%.
    /// Only a missing provider or an unknown token fails the order; other
    /// quote failures leave liquidity unknown.
    async fn snapshot(&self, request: &OrderRequest) -> Result<MarketSnapshot, ExecutionError> {
        let quote_request = QuoteRequest {
            token: request.token.clone(),
            side: request.side,
            amount: request.size,
            slippage_bps: request.max_slippage_bps,
        };
        let quote_request = &quote_request;
        let outcome = self
            .executor
            .quotes()
            .call("quote", |q| async move { q.quote(quote_request).await })
            .await;

        match outcome {
            Ok((quote, _)) => {
                let impact = quote.price_impact_bps.max(MIN_IMPACT_BPS);
                Ok(MarketSnapshot {
                    price: Some(quote.price),
                    visible_liquidity: Some(request.size * dec!(10_000) / impact),
                })
            }
            Err(e) => {
                let err = ExecutionError::from(e);
                let fatal = err.aborts_order()
                    || matches!(
                        err,
                        ExecutionError::PermanentOrder {
                            kind: PermanentErrorKind::InvalidToken,
                            ..
                        }
                    );
                if fatal {
                    return Err(err);
                }
                tracing::warn!(order_id = %request.id, error = %err, "Market snapshot failed, liquidity unknown");
                Ok(MarketSnapshot {
                    price: None,
                    visible_liquidity: None,
                })
            }
        }
    }

    /// Decide and, for an allowed buy, reserve its exposure until the guard
    /// is dropped.
    async fn check_risk(
        &self,
        request: &OrderRequest,
        reference_price: Decimal,
    ) -> Result<Approval<'_>, ExecutionError> {
        let _serialized = self.approvals.lock().await;
        let now = Utc::now();
        let positions = self.positions.active().await.map_err(internal)?;
        let daily_pnl = self.positions.daily_realized_pnl(now).await.map_err(internal)?;
        let (pending_new_positions, pending_notional) = {
            let reservations = self.reservations.lock();
            (reservations.new_positions(&positions), reservations.notional())
        };
        let context = RiskContext {
            reference_price,
            orders_last_hour: self.rate.count(now),
            pending_new_positions,
            pending_notional,
        };

        let mut guard = ReservationGuard {
            reservations: &self.reservations,
            order_id: None,
        };
        match self.risk.approve(request, &positions, daily_pnl, &context) {
            RiskDecision::Deny(denial) => return Ok(Approval::Denied(denial)),
            RiskDecision::Allow if request.side == Side::Sell => {}
            RiskDecision::Allow => {
                self.rate.record(now);
                self.reservations.lock().pending.insert(
                    request.id.clone(),
                    Reservation {
                        target: request.target_position_id(),
                        notional: request.size * reference_price,
                    },
                );
                guard.order_id = Some(request.id.clone());
            }
        }
        Ok(Approval::Granted(guard))
    }

    async fn run_sequential(
        &self,
        job: &SliceJob,
        mut slices: Vec<ChildSlice>,
        cancel: &CancellationToken,
    ) -> (Vec<ChildSlice>, Vec<Fill>, Option<ExecutionError>) {
        let start = Instant::now();
        let mut fills = Vec::new();
        let mut abort = None;

        for slice in &mut slices {
            if abort.is_some() || cancel.is_cancelled() {
                slice.mark_cancelled();
                continue;
            }
            let due = start + Duration::from_millis(slice.planned_offset_ms);
            tokio::select! {
                () = tokio::time::sleep_until(due) => {}
                () = cancel.cancelled() => {
                    slice.mark_cancelled();
                    continue;
                }
            }

            match self.executor.execute(job, slice, cancel).await {
                Ok(fill) => fills.push(fill),
                Err(e) if e.aborts_order() => {
                    tracing::warn!(order_id = %slice.parent, error = %e, "Aborting remaining slices");
                    abort = Some(e);
                }
                Err(_) => {}
            }
        }

        (slices, fills, abort)
    }

    async fn run_concurrent(
        &self,
        job: SliceJob,
        slices: Vec<ChildSlice>,
        cancel: &CancellationToken,
    ) -> (Vec<ChildSlice>, Vec<Fill>, Option<ExecutionError>) {
        let job = Arc::new(job);
        let semaphore = Arc::new(Semaphore::new(self.settings.slice_concurrency.max(1)));
        let abort_token = cancel.child_token();
        let abort_error: Arc<Mutex<Option<ExecutionError>>> = Arc::new(Mutex::new(None));
        let start = Instant::now();
        let planned = slices.clone();

        let mut tasks = JoinSet::new();
        for mut slice in slices {
            let executor = Arc::clone(&self.executor);
            let job = Arc::clone(&job);
            let semaphore = Arc::clone(&semaphore);
            let abort_token = abort_token.clone();
            let abort_error = Arc::clone(&abort_error);

            tasks.spawn(async move {
                let due = start + Duration::from_millis(slice.planned_offset_ms);
                let permit = tokio::select! {
                    permit = async {
                        tokio::time::sleep_until(due).await;
                        semaphore.acquire_owned().await
                    } => permit.ok(),
                    () = abort_token.cancelled() => None,
                };
                let Some(_permit) = permit.filter(|_| !abort_token.is_cancelled()) else {
                    slice.mark_cancelled();
                    return (slice, None);
                };

                match executor.execute(&job, &mut slice, &abort_token).await {
                    Ok(fill) => (slice, Some(fill)),
                    Err(e) => {
                        if e.aborts_order() {
                            let mut first = abort_error.lock();
                            if first.is_none() {
                                *first = Some(e);
                            }
                            abort_token.cancel();
                        }
                        (slice, None)
                    }
                }
            });
        }

        let mut done: Vec<ChildSlice> = Vec::with_capacity(planned.len());
        let mut fills = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slice, fill)) => {
                    fills.extend(fill);
                    done.push(slice);
                }
                Err(e) => tracing::error!(error = %e, "Slice task failed"),
            }
        }

        for mut lost in planned {
            if done.iter().all(|s| s.index != lost.index) {
                lost.mark_failed(internal_info("slice task panicked"));
                done.push(lost);
            }
        }
        done.sort_by_key(|s| s.index);
        fills.sort_by_key(|f| f.slice_index);

        let abort = abort_error.lock().take();
        (done, fills, abort)
    }

    /// Apply fills to the position they belong to and publish the update.
    async fn apply_to_position(
        &self,
        request: &OrderRequest,
        result: &OrderResult,
    ) -> Result<Option<PositionId>, PositionError> {
        let Some(avg) = result.average_price else {
            return Ok(None);
        };
        let filled = result.filled_size;
        let now = result.completed_at;

        let update = match (request.side, request.position_id.as_ref()) {
            (Side::Buy, _) => self.apply_entry(request, filled, avg, now).await?,
            (Side::Sell, Some(id)) => self.apply_exit(request, id, filled, avg, now).await?,
            (Side::Sell, None) => return Ok(None),
        };

        let id = update.position_id.clone();
        self.publish(EngineEvent::PositionUpdated(update)).await;
        Ok(Some(id))
    }

    async fn apply_entry(
        &self,
        request: &OrderRequest,
        filled: Decimal,
        avg: Decimal,
        now: DateTime<Utc>,
    ) -> Result<PositionUpdate, PositionError> {
        let plan = request
            .exit_plan
            .clone()
            .unwrap_or_else(|| self.settings.default_exit_plan.clone());
        let candidate = Position::open(
            request.target_position_id(),
            request.token.clone(),
            filled,
            avg,
            plan,
            now,
        )?;

        let (position, inserted) = self
            .positions
            .insert_or_update(candidate, &mut |p| p.apply_entry_fill(filled, avg, now))
            .await?;

        let reason = if inserted {
            tracing::info!(position_id = %position.id(), size = %position.size(), entry = %position.entry_price(), "Position opened");
            PositionUpdateReason::Opened
        } else {
            PositionUpdateReason::Increased
        };
        Ok(PositionUpdate::from_position(&position, Some(request.id.clone()), reason))
    }

    async fn apply_exit(
        &self,
        request: &OrderRequest,
        id: &PositionId,
        filled: Decimal,
        avg: Decimal,
        now: DateTime<Utc>,
    ) -> Result<PositionUpdate, PositionError> {
        let order_id = &request.id;
        let mut settlement: Option<ExitSettlement> = None;
        let mut was_exit = false;

        let position = self
            .positions
            .update(id, &mut |p| {
                was_exit = p.pending_exit().is_some_and(|e| &e.order_id == order_id);
                let s = if was_exit {
                    p.settle_exit(order_id, filled, Some(avg), now)?
                } else {
                    p.reduce(filled, Some(avg), now)?
                };
                settlement = Some(s);
                Ok(())
            })
            .await?;

        if let Some(s) = settlement {
            if !s.realized_pnl.is_zero() {
                self.positions.record_realized_pnl(s.realized_pnl, now).await?;
            }
            if s.closed {
                tracing::info!(position_id = %id, realized_pnl = %position.realized_pnl(), "Position closed");
            }
        }

        let reason = if was_exit {
            PositionUpdateReason::ExitSettled
        } else {
            PositionUpdateReason::Reduced
        };
        Ok(PositionUpdate::from_position(&position, Some(order_id.clone()), reason))
    }

    async fn publish(&self, event: EngineEvent) {
        if let Err(e) = self.events.publish(event).await {
            tracing::debug!(error = %e, "Engine event not delivered");
        }
    }
}

#[async_trait]
impl OrderSubmitPort for SubmitOrderUseCase {
    async fn submit(&self, request: OrderRequest) -> OrderResult {
        self.execute(request).await
    }
}

fn internal(err: PositionError) -> ExecutionError {
    ExecutionError::Internal {
        message: err.to_string(),
    }
}

fn internal_info(message: &str) -> ErrorInfo {
    ExecutionError::Internal {
        message: message.to_string(),
    }
    .to_info()
}
