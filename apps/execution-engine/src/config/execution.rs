//! Algorithm selection, slicing and slice retry configuration.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::use_cases::ExecutionSettings;
use crate::domain::execution_tactics::{SelectionPolicy, TwapParams, VwapParams};
use crate::domain::position::ExitPlan;
use crate::domain::shared::Token;
use crate::resilience::RetryPolicy;

/// Token every trade settles against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteTokenConfig {
    /// Mint address.
    pub mint: String,
    /// Mint decimals.
    pub decimals: u8,
}

impl Default for QuoteTokenConfig {
    fn default() -> Self {
        Self {
            mint: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
            decimals: 6,
        }
    }
}

impl QuoteTokenConfig {
    /// Domain token.
    #[must_use]
    pub fn to_token(&self) -> Token {
        Token::new(&self.mint, self.decimals)
    }
}

/// Execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Orders below this fraction of visible liquidity execute immediately.
    #[serde(default = "default_immediate_fraction")]
    pub immediate_fraction: Decimal,
    /// Orders at or above this fraction are worked as icebergs.
    #[serde(default = "default_iceberg_fraction")]
    pub iceberg_fraction: Decimal,
    /// TWAP slice count.
    #[serde(default = "default_schedule_slices")]
    pub twap_slices: usize,
    /// TWAP window (seconds).
    #[serde(default = "default_twap_window")]
    pub twap_window_secs: u64,
    /// VWAP slice count.
    #[serde(default = "default_schedule_slices")]
    pub vwap_slices: usize,
    /// VWAP window (seconds).
    #[serde(default = "default_vwap_window")]
    pub vwap_window_secs: u64,
    /// Relative volume per VWAP bucket; empty uses a mid-window hump.
    #[serde(default)]
    pub vwap_profile: Vec<f64>,
    /// Send-time jitter as a fraction of each interval.
    #[serde(default = "default_timing_jitter")]
    pub timing_jitter: f64,
    /// Minimum iceberg slice count.
    #[serde(default = "default_iceberg_min_slices")]
    pub iceberg_min_slices: usize,
    /// Maximum iceberg slice count.
    #[serde(default = "default_iceberg_max_slices")]
    pub iceberg_max_slices: usize,
    /// Nominal spacing between iceberg slices (milliseconds).
    #[serde(default = "default_iceberg_interval")]
    pub iceberg_interval_ms: u64,
    /// Iceberg quotes above this impact are re-quoted.
    #[serde(default = "default_iceberg_max_price_impact")]
    pub iceberg_max_price_impact_bps: u32,
    /// Attempts per slice, including the first.
    #[serde(default = "default_max_slice_attempts")]
    pub max_slice_attempts: u32,
    /// Slices of one order in flight at once.
    #[serde(default = "default_slice_concurrency")]
    pub slice_concurrency: usize,
    /// First retry delay (milliseconds).
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
    /// Retry delay ceiling (milliseconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
    /// Simulate every transaction before sending it.
    #[serde(default = "default_true")]
    pub simulate_before_send: bool,
    /// Settlement token.
    #[serde(default)]
    pub quote_token: QuoteTokenConfig,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            immediate_fraction: default_immediate_fraction(),
            iceberg_fraction: default_iceberg_fraction(),
            twap_slices: default_schedule_slices(),
            twap_window_secs: default_twap_window(),
            vwap_slices: default_schedule_slices(),
            vwap_window_secs: default_vwap_window(),
            vwap_profile: Vec::new(),
            timing_jitter: default_timing_jitter(),
            iceberg_min_slices: default_iceberg_min_slices(),
            iceberg_max_slices: default_iceberg_max_slices(),
            iceberg_interval_ms: default_iceberg_interval(),
            iceberg_max_price_impact_bps: default_iceberg_max_price_impact(),
            max_slice_attempts: default_max_slice_attempts(),
            slice_concurrency: default_slice_concurrency(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            simulate_before_send: true,
            quote_token: QuoteTokenConfig::default(),
        }
    }
}

impl ExecutionConfig {
    /// Algorithm selection thresholds.
    #[must_use]
    pub fn to_selection_policy(&self) -> SelectionPolicy {
        SelectionPolicy {
            immediate_fraction: self.immediate_fraction,
            iceberg_fraction: self.iceberg_fraction,
            twap: TwapParams {
                slices: self.twap_slices,
                window: Duration::from_secs(self.twap_window_secs),
                jitter: self.timing_jitter,
            },
            vwap: VwapParams {
                slices: self.vwap_slices,
                window: Duration::from_secs(self.vwap_window_secs),
                profile: self.vwap_profile.clone(),
                jitter: self.timing_jitter,
            },
            iceberg_min_slices: self.iceberg_min_slices,
            iceberg_max_slices: self.iceberg_max_slices,
            iceberg_interval: Duration::from_millis(self.iceberg_interval_ms),
            iceberg_max_price_impact_bps: self.iceberg_max_price_impact_bps,
            iceberg_jitter: self.timing_jitter,
        }
    }

    /// Slice retry policy. `max_attempts` counts retries after the first.
    #[must_use]
    pub fn to_retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_slice_attempts.saturating_sub(1),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            ..RetryPolicy::default()
        }
    }

    /// Execution settings with the monitor's default exit plan.
    #[must_use]
    pub fn to_settings(&self, default_exit_plan: ExitPlan) -> ExecutionSettings {
        ExecutionSettings {
            retry: self.to_retry_policy(),
            slice_concurrency: self.slice_concurrency,
            default_exit_plan,
        }
    }
}

fn default_immediate_fraction() -> Decimal {
    Decimal::new(1, 2)
}

fn default_iceberg_fraction() -> Decimal {
    Decimal::new(5, 2)
}

const fn default_schedule_slices() -> usize {
    10
}

const fn default_twap_window() -> u64 {
    300
}

const fn default_vwap_window() -> u64 {
    600
}

const fn default_timing_jitter() -> f64 {
    0.4
}

const fn default_iceberg_min_slices() -> usize {
    20
}

const fn default_iceberg_max_slices() -> usize {
    200
}

const fn default_iceberg_interval() -> u64 {
    3_000
}

const fn default_iceberg_max_price_impact() -> u32 {
    100
}

const fn default_max_slice_attempts() -> u32 {
    4
}

const fn default_slice_concurrency() -> usize {
    3
}

const fn default_initial_backoff() -> u64 {
    200
}

const fn default_max_backoff() -> u64 {
    5_000
}

pub(crate) const fn default_true() -> bool {
    true
}
