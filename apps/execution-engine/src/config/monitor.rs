//! Exit monitor configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::services::PositionMonitorConfig;
use crate::domain::position::ExitPlan;
use crate::domain::shared::Urgency;

use super::execution::default_true;

/// Position monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Run the exit loop.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Evaluation pass interval (milliseconds).
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Exit plan for buys that carry none.
    #[serde(default = "ExitPlan::default_spot")]
    pub default_exit_plan: ExitPlan,
    /// Max hold applied to the default plan (seconds).
    #[serde(default)]
    pub max_hold_secs: Option<u64>,
    /// Slippage tolerance for exit orders.
    #[serde(default = "default_exit_slippage")]
    pub exit_slippage_bps: u32,
    /// Urgency (fee tier) for exit orders.
    #[serde(default = "default_exit_urgency")]
    pub exit_urgency: Urgency,
    /// Consecutive failing passes before an alert.
    #[serde(default = "default_alert_threshold")]
    pub alert_after_failed_passes: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_ms: default_tick_interval(),
            default_exit_plan: ExitPlan::default_spot(),
            max_hold_secs: None,
            exit_slippage_bps: default_exit_slippage(),
            exit_urgency: default_exit_urgency(),
            alert_after_failed_passes: default_alert_threshold(),
        }
    }
}

impl MonitorConfig {
    /// Monitor service settings.
    #[must_use]
    pub const fn to_service_config(&self) -> PositionMonitorConfig {
        PositionMonitorConfig {
            enabled: self.enabled,
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            exit_slippage_bps: self.exit_slippage_bps,
            exit_urgency: self.exit_urgency,
            alert_after_failed_passes: self.alert_after_failed_passes,
        }
    }

    /// Default exit plan with the configured max hold, unless the plan sets
    /// its own.
    #[must_use]
    pub fn exit_plan(&self) -> ExitPlan {
        let mut plan = self.default_exit_plan.clone();
        if plan.max_hold_secs.is_none() {
            plan.max_hold_secs = self.max_hold_secs;
        }
        plan
    }
}

const fn default_tick_interval() -> u64 {
    1_000
}

const fn default_exit_slippage() -> u32 {
    300
}

const fn default_exit_urgency() -> Urgency {
    Urgency::High
}

const fn default_alert_threshold() -> u32 {
    5
}
