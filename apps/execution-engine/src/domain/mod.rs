//! Domain Layer
//!
//! The innermost layer containing business logic with zero infrastructure dependencies.
//! This layer defines:
//!
//! - **Aggregates**: Consistency boundaries with invariants
//! - **Value Objects**: Immutable domain types with equality by value
//! - **Domain Services**: Stateless business logic
//! - **Repository Traits**: Persistence abstractions (implemented in adapters)
//!
//! # Bounded Contexts
//!
//! - [`provider_health`]: Rolling health windows and ranking of upstream providers
//! - [`fees`]: Congestion and urgency to priority-fee tier
//! - [`execution_tactics`]: Slicing algorithms (Immediate, TWAP, VWAP, Iceberg)
//! - [`order_execution`]: Order requests, fills and aggregate results
//! - [`position`]: Position lifecycle, exit plans and exit triggers
//! - [`risk_management`]: Pre-trade risk gate

pub mod execution_tactics;
pub mod fees;
pub mod order_execution;
pub mod position;
pub mod provider_health;
pub mod risk_management;
pub mod shared;
