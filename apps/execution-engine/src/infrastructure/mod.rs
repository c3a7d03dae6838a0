//! Infrastructure Layer
//!
//! Adapters (implementations) for the ports defined in the application
//! layer. Following hexagonal architecture:
//!
//! - **Driven Adapters (Outbound)**: Implement ports for external systems
//!   - `rpc/`: Solana JSON-RPC nodes
//!   - `quote/`: Jupiter quote/swap aggregator
//!   - `signer/`: Remote wallet signer
//!   - `persistence/`: Position and idempotency stores
//!   - `events`: Broadcast event publisher
//!   - `mock`: Scripted providers for PAPER mode and tests
//!
//! - **Driver Adapters (Inbound)**: Expose application to external world
//!   - `http/`: REST API controllers
//!
//! - **Wiring**: `config/` builds the engine from configuration

pub mod config;
pub mod events;
pub mod http;
pub mod mock;
pub mod persistence;
pub mod quote;
pub mod rpc;
pub mod signer;
pub mod transport;
