//! Application Use Cases
//!
//! Use cases orchestrate domain logic to fulfill application requirements.

mod cancel_order;
mod slice_executor;
mod submit_order;

pub use cancel_order::CancelOrderUseCase;
pub use slice_executor::{SliceExecutor, SliceJob};
pub use submit_order::{ActiveOrders, ExecutionSettings, SubmitOrderUseCase};
