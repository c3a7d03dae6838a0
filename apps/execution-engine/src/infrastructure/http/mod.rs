//! HTTP Adapter
//!
//! Axum REST surface over the execution engine.

mod controller;
mod request;
mod response;

pub use controller::{AppState, create_router};
pub use request::SubmitOrderRequest;
pub use response::{
    CancelOrderResponse, ErrorResponse, HealthResponse, HttpAdapterError, ProviderHealthResponse,
};
