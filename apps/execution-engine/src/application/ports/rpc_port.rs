//! Blockchain RPC Port (Driven Port)
//!
//! Fee sampling, simulation and submission of signed transactions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ProviderError, SignedTransaction};

/// Outcome of a transaction simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Error reported by the runtime, `None` on success.
    pub error: Option<String>,
    /// Compute units consumed.
    pub units_consumed: Option<u64>,
    /// Program logs.
    #[serde(default)]
    pub logs: Vec<String>,
}

impl SimulationResult {
    /// Whether the simulation succeeded.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Port for a blockchain JSON-RPC endpoint.
#[async_trait]
pub trait RpcPort: Send + Sync {
    /// Recent prioritization fees in micro-lamports per compute unit.
    async fn recent_prioritization_fees(
        &self,
        accounts: &[String],
    ) -> Result<Vec<u64>, ProviderError>;

    /// Simulate without submitting.
    async fn simulate_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> Result<SimulationResult, ProviderError>;

    /// Submit a signed transaction; returns its signature.
    async fn send_transaction(&self, transaction: &SignedTransaction)
    -> Result<String, ProviderError>;
}
