//! Risk Management Domain Services

mod risk_manager;

pub use risk_manager::RiskManager;
