//! Execution Engine
//!
//! Wires the use cases and supervised services together and exposes the
//! four caller operations: submit, position lookup, cancel and provider
//! health.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::application::ports::{
    EventPublisherPort, OrderSubmitPort, QuotePort, RpcPort, SignerPort,
};
use crate::application::services::{
    FeeService, HealthMonitor, PositionMonitorConfig, PositionMonitorError,
    PositionMonitorService, ProviderPool,
};
use crate::application::use_cases::{
    ActiveOrders, CancelOrderUseCase, ExecutionSettings, SliceExecutor, SubmitOrderUseCase,
};
use crate::domain::execution_tactics::{SelectionPolicy, TacticSelector};
use crate::domain::fees::{FeeCalculator, FeePolicy};
use crate::domain::order_execution::{IdempotencyStore, OrderRequest, OrderResult};
use crate::domain::position::{Position, PositionError, PositionRepository};
use crate::domain::provider_health::ProviderStatus;
use crate::domain::risk_management::{RiskLimits, RiskManager};
use crate::domain::shared::{OrderId, PositionId};

/// Adapters and stores the engine runs on.
#[derive(Clone)]
pub struct EngineParts {
    /// Shared provider health.
    pub health: Arc<HealthMonitor>,
    /// Quote/swap aggregators.
    pub quotes: Arc<ProviderPool<dyn QuotePort>>,
    /// RPC nodes.
    pub rpc: Arc<ProviderPool<dyn RpcPort>>,
    /// Transaction signer.
    pub signer: Arc<dyn SignerPort>,
    /// Position store.
    pub positions: Arc<dyn PositionRepository>,
    /// Idempotency store.
    pub idempotency: Arc<dyn IdempotencyStore>,
    /// Event sink.
    pub events: Arc<dyn EventPublisherPort>,
}

/// Tunables for every engine component.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Algorithm selection thresholds.
    pub selection: SelectionPolicy,
    /// Pre-trade risk limits.
    pub risk: RiskLimits,
    /// Priority fee limits.
    pub fees: FeePolicy,
    /// How long sampled fees are reused.
    pub fee_cache_ttl: Duration,
    /// Simulate each transaction before sending it.
    pub simulate_before_send: bool,
    /// Slice retry and concurrency.
    pub execution: ExecutionSettings,
    /// Exit monitor.
    pub monitor: PositionMonitorConfig,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            selection: SelectionPolicy::default(),
            risk: RiskLimits::default(),
            fees: FeePolicy::default(),
            fee_cache_ttl: Duration::from_secs(10),
            simulate_before_send: true,
            execution: ExecutionSettings::default(),
            monitor: PositionMonitorConfig::default(),
        }
    }
}

/// Execution and risk engine.
pub struct ExecutionEngine {
    submit: Arc<SubmitOrderUseCase>,
    cancel: CancelOrderUseCase,
    positions: Arc<dyn PositionRepository>,
    health: Arc<HealthMonitor>,
    monitor: Arc<PositionMonitorService>,
}

impl std::fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("submit", &self.submit)
            .field("health", &self.health)
            .field("monitor", &self.monitor)
            .finish_non_exhaustive()
    }
}

impl ExecutionEngine {
    /// Build the engine. Background services start with [`Self::start`].
    #[must_use]
    pub fn new(parts: EngineParts, settings: EngineSettings) -> Self {
        let fees = Arc::new(FeeService::new(
            FeeCalculator::new(settings.fees),
            Arc::clone(&parts.rpc),
            settings.fee_cache_ttl,
        ));
        let executor = Arc::new(SliceExecutor::new(
            Arc::clone(&parts.quotes),
            Arc::clone(&parts.rpc),
            parts.signer,
            fees,
            settings.execution.retry.clone(),
            settings.simulate_before_send,
        ));
        let active = Arc::new(ActiveOrders::new());
        let submit = Arc::new(SubmitOrderUseCase::new(
            executor,
            TacticSelector::new(settings.selection),
            RiskManager::new(settings.risk),
            Arc::clone(&parts.positions),
            parts.idempotency,
            Arc::clone(&parts.events),
            Arc::clone(&active),
            settings.execution,
        ));
        let monitor = Arc::new(PositionMonitorService::new(
            settings.monitor,
            Arc::clone(&parts.positions),
            parts.quotes,
            Arc::clone(&submit) as Arc<dyn OrderSubmitPort>,
            parts.events,
        ));

        Self {
            submit,
            cancel: CancelOrderUseCase::new(active),
            positions: parts.positions,
            health: parts.health,
            monitor,
        }
    }

    /// Start the health probe loop and the exit monitor on `tracker`.
    pub fn start(&self, tracker: &TaskTracker, shutdown: &CancellationToken) {
        self.health.spawn(tracker, shutdown.clone());
        match self.monitor.start(tracker, shutdown.clone()) {
            Ok(()) => {}
            Err(PositionMonitorError::NotEnabled) => {
                tracing::warn!("Position monitor disabled, exits will not be enforced");
            }
            Err(e) => tracing::error!(error = %e, "Position monitor failed to start"),
        }
    }

    /// Execute an order to completion.
    pub async fn submit_order(&self, request: OrderRequest) -> OrderResult {
        self.submit.execute(request).await
    }

    /// Wait for every order already claimed to complete.
    pub async fn drain_orders(&self) {
        self.submit.drain().await;
    }

    /// Result of a completed order.
    pub async fn get_order(&self, id: &OrderId) -> Option<OrderResult> {
        self.submit.get_order(id).await
    }

    /// Current state of a position.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::NotFound`] for an unknown id.
    pub async fn get_position(&self, id: &PositionId) -> Result<Position, PositionError> {
        self.positions
            .get(id)
            .await?
            .ok_or_else(|| PositionError::NotFound {
                position_id: id.to_string(),
            })
    }

    /// Open and closing positions.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read.
    pub async fn active_positions(&self) -> Result<Vec<Position>, PositionError> {
        self.positions.active().await
    }

    /// Stop scheduling further slices of an in-flight order.
    ///
    /// Returns `false` if the order is unknown or already complete.
    #[must_use]
    pub fn cancel_order(&self, id: &OrderId) -> bool {
        self.cancel.execute(id)
    }

    /// Health snapshot of every provider.
    #[must_use]
    pub fn get_provider_health(&self) -> Vec<ProviderStatus> {
        self.health.statuses()
    }

    /// Exit monitor, for supervision checks.
    #[must_use]
    pub const fn position_monitor(&self) -> &Arc<PositionMonitorService> {
        &self.monitor
    }
}
