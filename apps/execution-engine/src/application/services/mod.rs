//! Application Services
//!
//! Application services coordinate domain logic and infrastructure adapters.
//! They differ from use cases in that they typically run as background tasks
//! or provide long-running functionality.

mod fee_service;
mod health_monitor;
mod position_monitor;
mod provider_pool;

pub use fee_service::FeeService;
pub use health_monitor::{HealthMonitor, HealthMonitorConfig};
pub use position_monitor::{
    PassReport, PositionMonitorConfig, PositionMonitorError, PositionMonitorService,
};
pub use provider_pool::{PoolError, ProviderAttempt, ProviderPool};
