//! Order Execution Value Objects

mod fill;
mod order_request;
mod order_status;

pub use fill::Fill;
pub use order_request::OrderRequest;
pub use order_status::OrderStatus;
