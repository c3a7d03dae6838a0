//! Risk Management Bounded Context
//!
//! Stateless pre-trade gate. Denial is an expected outcome carried as a
//! [`RiskDecision`], never an error.
//!
//! Buys are checked against, in order: daily realized loss, order rate,
//! concurrent open positions, single-position notional and aggregate
//! exposure. Sells only reduce risk and are always allowed.

pub mod services;
pub mod value_objects;

pub use services::RiskManager;
pub use value_objects::{DenyReason, RiskContext, RiskDecision, RiskDenial, RiskLimits};
