//! Shared harness: an engine wired to scripted providers.

#![allow(dead_code)]

use std::sync::Arc;

use dex_execution_engine::application::services::{HealthMonitor, HealthMonitorConfig, ProviderPool};
use dex_execution_engine::domain::provider_health::{HealthPolicy, Provider};
use dex_execution_engine::infrastructure::events::BroadcastEventPublisher;
use dex_execution_engine::infrastructure::mock::{MockQuote, MockRpc, MockSigner};
use dex_execution_engine::resilience::{CircuitBreakerConfig, CircuitBreakerRegistry};
use dex_execution_engine::{
    AlgorithmKind, EngineParts, EngineSettings, EventPublisherPort, ExecutionEngine, HealthProbe,
    InMemoryIdempotencyStore, InMemoryPositionRepository, OrderId, OrderRequest, ProviderRole,
    QuotePort, RpcPort, Side, Token, Urgency,
};
use rust_decimal::Decimal;

pub const MINT: &str = "BoNKmint111111111111111111111111111111111111";

/// Engine plus handles on every scripted dependency.
pub struct Harness {
    pub engine: Arc<ExecutionEngine>,
    pub rpc: Vec<Arc<MockRpc>>,
    pub quote: Arc<MockQuote>,
    pub signer: Arc<MockSigner>,
    pub health: Arc<HealthMonitor>,
    pub breakers: Arc<CircuitBreakerRegistry>,
    pub positions: Arc<InMemoryPositionRepository>,
    pub events: Arc<BroadcastEventPublisher>,
}

impl Harness {
    /// One quote provider at `price`, `rpc_count` RPC nodes, default settings.
    pub fn new(rpc_count: usize, price: Decimal) -> Self {
        Self::with_settings(rpc_count, price, EngineSettings::default())
    }

    pub fn with_settings(rpc_count: usize, price: Decimal, settings: EngineSettings) -> Self {
        let health = Arc::new(HealthMonitor::new(
            HealthMonitorConfig::default(),
            HealthPolicy::default(),
        ));
        let breakers = Arc::new(CircuitBreakerRegistry::new(CircuitBreakerConfig::default()));

        let mut rpc_pool =
            ProviderPool::<dyn RpcPort>::new(ProviderRole::Rpc, Arc::clone(&health), Arc::clone(&breakers));
        let mut rpc = Vec::new();
        for i in 0..rpc_count {
            let id = format!("rpc-{i}");
            let mock = Arc::new(MockRpc::new());
            rpc_pool = rpc_pool.with_provider(id.as_str().into(), Arc::clone(&mock) as Arc<dyn RpcPort>);
            health.register(
                Provider::new(id.as_str(), format!("http://{id}"), ProviderRole::Rpc),
                Arc::clone(&mock) as Arc<dyn HealthProbe>,
            );
            rpc.push(mock);
        }

        let quote = Arc::new(MockQuote::new(price));
        let quote_pool =
            ProviderPool::<dyn QuotePort>::new(ProviderRole::Quote, Arc::clone(&health), Arc::clone(&breakers))
                .with_provider("jupiter".into(), Arc::clone(&quote) as Arc<dyn QuotePort>);
        health.register(
            Provider::new("jupiter", "http://jupiter", ProviderRole::Quote),
            Arc::clone(&quote) as Arc<dyn HealthProbe>,
        );

        let signer = Arc::new(MockSigner::new("TestWallet111"));
        let positions = Arc::new(InMemoryPositionRepository::new());
        let events = Arc::new(BroadcastEventPublisher::default());

        let parts = EngineParts {
            health: Arc::clone(&health),
            quotes: Arc::new(quote_pool),
            rpc: Arc::new(rpc_pool),
            signer: Arc::clone(&signer) as _,
            positions: Arc::clone(&positions) as _,
            idempotency: Arc::new(InMemoryIdempotencyStore::new()),
            events: Arc::clone(&events) as Arc<dyn EventPublisherPort>,
        };

        Self {
            engine: Arc::new(ExecutionEngine::new(parts, settings)),
            rpc,
            quote,
            signer,
            health,
            breakers,
            positions,
            events,
        }
    }

    /// Total sends across the given RPC nodes.
    pub fn sends(&self, indexes: &[usize]) -> usize {
        indexes.iter().map(|i| self.rpc[*i].send_calls()).sum()
    }
}

pub fn buy(id: &str, size: Decimal) -> OrderRequest {
    OrderRequest {
        id: OrderId::new(id),
        token: Token::new(MINT, 6),
        side: Side::Buy,
        size,
        max_slippage_bps: 100,
        urgency: Urgency::Medium,
        algorithm_hint: None,
        expected_price: None,
        position_id: None,
        exit_plan: None,
    }
}

pub fn with_algorithm(mut request: OrderRequest, algorithm: AlgorithmKind) -> OrderRequest {
    request.algorithm_hint = Some(algorithm);
    request
}
