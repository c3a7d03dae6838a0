//! Health Probe Port (Driven Port)

use async_trait::async_trait;

use super::ProviderError;

/// Lightweight liveness check against one provider.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Issue one probe. Latency is measured by the caller.
    async fn probe(&self) -> Result<(), ProviderError>;
}
