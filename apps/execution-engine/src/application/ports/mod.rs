//! Application Ports (Driver and Driven)
//!
//! Ports define interfaces for interacting with external systems.
//! - **Driver Ports** (Primary/Inbound): How the world uses our application
//! - **Driven Ports** (Secondary/Outbound): How our application uses external systems

mod event_publisher_port;
mod health_probe;
mod order_submit_port;
mod provider_error;
mod quote_port;
mod rpc_port;
mod signer_port;

pub use event_publisher_port::{
    EngineEvent, EventPublishError, EventPublisherPort, NoOpEventPublisher,
};
pub use health_probe::HealthProbe;
pub use order_submit_port::OrderSubmitPort;
pub use provider_error::ProviderError;
pub use quote_port::{
    Quote, QuotePort, QuoteRequest, SignedTransaction, SwapParams, UnsignedTransaction,
};
pub use rpc_port::{RpcPort, SimulationResult};
pub use signer_port::SignerPort;
