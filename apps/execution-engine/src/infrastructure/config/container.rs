//! Dependency Injection Container
//!
//! Builds the engine from configuration: real RPC, quote and signer
//! adapters in LIVE mode, scripted in-process providers in PAPER mode.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::application::ports::{
    EventPublisherPort, HealthProbe, ProviderError, QuotePort, RpcPort, SignerPort,
};
use crate::application::services::{HealthMonitor, ProviderPool};
use crate::application::{EngineParts, ExecutionEngine};
use crate::config::{Config, ProviderConfig, TradingMode};
use crate::domain::provider_health::{Provider, ProviderRole};
use crate::domain::shared::Token;
use crate::infrastructure::events::BroadcastEventPublisher;
use crate::infrastructure::mock::{MockQuote, MockRpc, MockSigner};
use crate::infrastructure::persistence::{InMemoryIdempotencyStore, InMemoryPositionRepository};
use crate::infrastructure::quote::{JupiterConfig, JupiterQuoteClient};
use crate::infrastructure::rpc::{SolanaRpcClient, SolanaRpcConfig};
use crate::infrastructure::signer::{RemoteSigner, RemoteSignerConfig};
use crate::resilience::CircuitBreakerRegistry;

const PAPER_WALLET: &str = "PaperWa11et1111111111111111111111111111111";
const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Failure to build an adapter.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// An adapter could not be constructed.
    #[error("failed to build provider {id}: {source}")]
    Provider {
        /// Provider id.
        id: String,
        /// Underlying error.
        source: ProviderError,
    },
}

/// Handles on the scripted providers of a PAPER engine.
#[derive(Debug, Clone)]
pub struct PaperProviders {
    /// RPC doubles, in configuration order.
    pub rpc: Vec<Arc<MockRpc>>,
    /// Quote doubles, in configuration order.
    pub quotes: Vec<Arc<MockQuote>>,
    /// Signer double.
    pub signer: Arc<MockSigner>,
}

/// Wired engine and the shared components around it.
#[derive(Debug)]
pub struct EngineContainer {
    /// The engine.
    pub engine: Arc<ExecutionEngine>,
    /// Event fan-out.
    pub events: Arc<BroadcastEventPublisher>,
    /// Shared provider health.
    pub health: Arc<HealthMonitor>,
    /// Provider breakers.
    pub breakers: Arc<CircuitBreakerRegistry>,
    /// Trading mode the engine was built for.
    pub mode: TradingMode,
    /// Scripted providers, PAPER mode only.
    pub paper: Option<PaperProviders>,
}

struct Adapters {
    rpc: Vec<(Provider, Arc<dyn RpcPort>, Arc<dyn HealthProbe>)>,
    quotes: Vec<(Provider, Arc<dyn QuotePort>, Arc<dyn HealthProbe>)>,
    signer: Arc<dyn SignerPort>,
}

impl EngineContainer {
    /// Build the engine for the configured mode.
    ///
    /// # Errors
    ///
    /// Returns error if a LIVE adapter cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, ContainerError> {
        match config.environment.mode {
            TradingMode::Paper => Ok(Self::paper(config)),
            TradingMode::Live => {
                let adapters = live_adapters(config)?;
                Ok(Self::assemble(config, adapters, TradingMode::Live, None))
            }
        }
    }

    /// Engine on scripted providers, one per configured provider id.
    #[must_use]
    pub fn paper(config: &Config) -> Self {
        let mut rpc = Vec::new();
        let mut rpc_mocks = Vec::new();
        for provider in config.providers_for(ProviderRole::Rpc) {
            let mock = Arc::new(MockRpc::new());
            rpc_mocks.push(Arc::clone(&mock));
            rpc.push((
                provider.to_provider(),
                Arc::clone(&mock) as Arc<dyn RpcPort>,
                mock as Arc<dyn HealthProbe>,
            ));
        }

        let mut quotes = Vec::new();
        let mut quote_mocks = Vec::new();
        for provider in config.providers_for(ProviderRole::Quote) {
            let mock = Arc::new(MockQuote::new(Decimal::ONE));
            quote_mocks.push(Arc::clone(&mock));
            quotes.push((
                provider.to_provider(),
                Arc::clone(&mock) as Arc<dyn QuotePort>,
                mock as Arc<dyn HealthProbe>,
            ));
        }

        let wallet = if config.signer.public_key.is_empty() {
            PAPER_WALLET.to_string()
        } else {
            config.signer.public_key.clone()
        };
        let signer = Arc::new(MockSigner::new(wallet));

        let paper = PaperProviders {
            rpc: rpc_mocks,
            quotes: quote_mocks,
            signer: Arc::clone(&signer),
        };
        let adapters = Adapters {
            rpc,
            quotes,
            signer,
        };
        Self::assemble(config, adapters, TradingMode::Paper, Some(paper))
    }

    /// PAPER engine on default configuration.
    #[must_use]
    pub fn paper_default() -> Self {
        Self::paper(&Config::default())
    }

    fn assemble(
        config: &Config,
        adapters: Adapters,
        mode: TradingMode,
        paper: Option<PaperProviders>,
    ) -> Self {
        let health = Arc::new(HealthMonitor::new(
            config.health.to_monitor_config(),
            config.health.to_policy(),
        ));
        let breakers = Arc::new(CircuitBreakerRegistry::new(
            config.circuit_breaker.to_resilience_config(),
        ));

        let mut rpc_pool = ProviderPool::<dyn RpcPort>::new(
            ProviderRole::Rpc,
            Arc::clone(&health),
            Arc::clone(&breakers),
        );
        for (provider, port, probe) in adapters.rpc {
            rpc_pool = rpc_pool.with_provider(provider.id.clone(), port);
            health.register(provider, probe);
        }

        let mut quote_pool = ProviderPool::<dyn QuotePort>::new(
            ProviderRole::Quote,
            Arc::clone(&health),
            Arc::clone(&breakers),
        );
        for (provider, port, probe) in adapters.quotes {
            quote_pool = quote_pool.with_provider(provider.id.clone(), port);
            health.register(provider, probe);
        }

        let events = Arc::new(BroadcastEventPublisher::default());
        let parts = EngineParts {
            health: Arc::clone(&health),
            quotes: Arc::new(quote_pool),
            rpc: Arc::new(rpc_pool),
            signer: adapters.signer,
            positions: Arc::new(InMemoryPositionRepository::new()),
            idempotency: Arc::new(InMemoryIdempotencyStore::new()),
            events: Arc::clone(&events) as Arc<dyn EventPublisherPort>,
        };

        tracing::info!(
            mode = mode.as_str(),
            rpc_providers = config.providers_for(ProviderRole::Rpc).count(),
            quote_providers = config.providers_for(ProviderRole::Quote).count(),
            "Engine assembled"
        );

        Self {
            engine: Arc::new(ExecutionEngine::new(parts, config.engine_settings())),
            events,
            health,
            breakers,
            mode,
            paper,
        }
    }
}

fn build_error(provider: &ProviderConfig) -> impl FnOnce(ProviderError) -> ContainerError + '_ {
    move |source| ContainerError::Provider {
        id: provider.id.clone(),
        source,
    }
}

fn live_adapters(config: &Config) -> Result<Adapters, ContainerError> {
    let mut rpc = Vec::new();
    for provider in config.providers_for(ProviderRole::Rpc) {
        let mut rpc_config = SolanaRpcConfig::new(&provider.endpoint);
        rpc_config.timeout = provider.timeout();
        let client = Arc::new(SolanaRpcClient::new(rpc_config).map_err(build_error(provider))?);
        rpc.push((
            provider.to_provider(),
            Arc::clone(&client) as Arc<dyn RpcPort>,
            client as Arc<dyn HealthProbe>,
        ));
    }

    let mut quotes = Vec::new();
    for provider in config.providers_for(ProviderRole::Quote) {
        let client = Arc::new(
            JupiterQuoteClient::new(JupiterConfig {
                base_url: provider.endpoint.clone(),
                quote_token: config.execution.quote_token.to_token(),
                probe_token: Token::new(SOL_MINT, 9),
                timeout: provider.timeout(),
            })
            .map_err(build_error(provider))?,
        );
        quotes.push((
            provider.to_provider(),
            Arc::clone(&client) as Arc<dyn QuotePort>,
            client as Arc<dyn HealthProbe>,
        ));
    }

    let signer = RemoteSigner::new(RemoteSignerConfig {
        endpoint: config.signer.endpoint.clone(),
        public_key: config.signer.public_key.clone(),
        auth_token: Some(config.signer.auth_token.clone()).filter(|t| !t.is_empty()),
        timeout: config.signer.timeout(),
    })
    .map_err(|source| ContainerError::Provider {
        id: "signer".to_string(),
        source,
    })?;

    Ok(Adapters {
        rpc,
        quotes,
        signer: Arc::new(signer),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paper_container_registers_every_provider() {
        let container = EngineContainer::paper_default();
        assert_eq!(container.mode, TradingMode::Paper);
        let paper = container.paper.as_ref().unwrap();
        assert_eq!(paper.rpc.len(), 1);
        assert_eq!(paper.quotes.len(), 1);
        assert_eq!(container.engine.get_provider_health().len(), 2);
    }

    #[test]
    fn live_container_builds_real_adapters() {
        let mut config = Config::default();
        config.environment.mode = TradingMode::Live;
        config.signer.endpoint = "http://127.0.0.1:9".to_string();
        config.signer.public_key = "Wallet111".to_string();
        let container = EngineContainer::from_config(&config).unwrap();
        assert!(container.paper.is_none());
        assert!(container.mode.is_live());
    }

    #[tokio::test]
    async fn paper_engine_fills_an_order() {
        use crate::domain::order_execution::{OrderRequest, OrderStatus};
        use crate::domain::shared::{OrderId, Side, Urgency};
        use rust_decimal_macros::dec;

        let container = EngineContainer::paper_default();
        let result = container
            .engine
            .submit_order(OrderRequest {
                id: OrderId::new("paper-1"),
                token: Token::new("BONK", 5),
                side: Side::Buy,
                size: dec!(50),
                max_slippage_bps: 100,
                urgency: Urgency::Medium,
                algorithm_hint: None,
                expected_price: None,
                position_id: None,
                exit_plan: None,
            })
            .await;
        assert_eq!(result.status, OrderStatus::Filled);
        assert_eq!(container.paper.unwrap().signer.signed(), 1);
    }
}
