//! Risk Management Value Objects

mod risk_context;
mod risk_decision;
mod risk_limits;

pub use risk_context::RiskContext;
pub use risk_decision::{DenyReason, RiskDecision, RiskDenial};
pub use risk_limits::RiskLimits;
