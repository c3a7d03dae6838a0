//! Fee Estimation Service
//!
//! Samples recent prioritization fees through the RPC pool and turns them
//! into a [`FeeEstimate`] for the caller's urgency. Samples are cached per
//! mint for a short TTL so concurrent slices of one order share one lookup.
//! Sampling failures never block an order: the urgency's base tier is used.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use super::provider_pool::ProviderPool;
use crate::application::ports::RpcPort;
use crate::domain::fees::{FeeCalculator, FeeEstimate};
use crate::domain::shared::Urgency;

/// Fee estimator backed by live RPC samples.
#[derive(Debug)]
pub struct FeeService {
    calculator: FeeCalculator,
    rpc: Arc<ProviderPool<dyn RpcPort>>,
    cache_ttl: Duration,
    cache: Mutex<HashMap<String, (Instant, Vec<u64>)>>,
}

impl FeeService {
    /// Create a fee service.
    #[must_use]
    pub fn new(calculator: FeeCalculator, rpc: Arc<ProviderPool<dyn RpcPort>>, cache_ttl: Duration) -> Self {
        Self {
            calculator,
            rpc,
            cache_ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Estimate the priority fee for a swap touching `mint`.
    pub async fn estimate(&self, urgency: Urgency, mint: &str) -> FeeEstimate {
        match self.samples(mint).await {
            Some(samples) => self.calculator.estimate(&samples, urgency),
            None => self.calculator.fallback(urgency),
        }
    }

    async fn samples(&self, mint: &str) -> Option<Vec<u64>> {
        if let Some((at, samples)) = self.cache.lock().get(mint)
            && at.elapsed() < self.cache_ttl
        {
            return Some(samples.clone());
        }

        let accounts = vec![mint.to_string()];
        let result = self
            .rpc
            .call("getRecentPrioritizationFees", |rpc| {
                let accounts = accounts.clone();
                async move { rpc.recent_prioritization_fees(&accounts).await }
            })
            .await;

        match result {
            Ok((samples, _)) => {
                self.cache
                    .lock()
                    .insert(mint.to_string(), (Instant::now(), samples.clone()));
                Some(samples)
            }
            Err(e) => {
                tracing::warn!(mint, error = %e, "Fee sampling failed, using urgency base tier");
                None
            }
        }
    }
}
