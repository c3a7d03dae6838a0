// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! DEX Execution Engine - Rust Core Library
//!
//! Execution and risk engine for a DEX aggregator: routes swaps through a
//! health-ranked pool of redundant RPC nodes and quote aggregators, works
//! parent orders as Immediate/TWAP/VWAP/Iceberg child slices, gates new
//! exposure through a risk manager and enforces exits from a supervised
//! position monitor.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic (aggregates, value objects)
//!   - `order_execution`: Order request/result, fills, idempotency store
//!   - `execution_tactics`: Algorithm selection and slice planning
//!   - `position`: Position aggregate, exit plans and triggers
//!   - `risk_management`: Limits and the pre-trade risk gate
//!   - `provider_health`: Rolling health windows and ranking
//!   - `fees`: Congestion-aware priority fee tiers
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: Interfaces for RPC, quote, signer and event adapters
//!   - `services`: Health monitor, provider pool, fee service, position monitor
//!   - `use_cases`: Submit (with slice execution) and cancel
//!   - `engine`: The wired [`ExecutionEngine`]
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `rpc`, `quote`, `signer`: HTTP adapters for Solana, Jupiter and a
//!     remote signer
//!   - `persistence`: In-memory position and idempotency stores
//!   - `http`: Axum REST surface
//!   - `config`: Dependency injection container
//!
//! Cross-cutting: `config` (YAML loading), `resilience` (circuit breakers,
//! retry), `observability` (tracing and Prometheus metrics), `error`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting Modules
// =============================================================================

pub mod config;
pub mod error;
pub mod observability;
pub mod resilience;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::execution_tactics::AlgorithmKind;
pub use domain::order_execution::{OrderRequest, OrderResult, OrderStatus};
pub use domain::position::{ExitPlan, Position, PositionStatus};
pub use domain::provider_health::{HealthStatus, ProviderRole, ProviderStatus};
pub use domain::shared::{OrderId, PositionId, ProviderId, Side, Token, Urgency};

// Application re-exports
pub use application::ports::{
    EngineEvent, EventPublisherPort, HealthProbe, NoOpEventPublisher, OrderSubmitPort,
    ProviderError, QuotePort, RpcPort, SignerPort,
};
pub use application::{EngineParts, EngineSettings, ExecutionEngine};

// Infrastructure re-exports
pub use infrastructure::config::EngineContainer;
pub use infrastructure::http::{AppState, create_router};
pub use infrastructure::persistence::{InMemoryIdempotencyStore, InMemoryPositionRepository};

pub use error::{ErrorCode, ExecutionError};
