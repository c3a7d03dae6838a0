//! Upstream RPC node and quote aggregator endpoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::provider_health::{Provider, ProviderRole};
use crate::domain::shared::ProviderId;

/// One configured provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Unique id, used in logs, metrics and breaker keys.
    pub id: String,
    /// Role served.
    pub role: ProviderRole,
    /// Endpoint URL.
    pub endpoint: String,
    /// Per-request timeout (milliseconds).
    #[serde(default = "default_request_timeout_ms")]
    pub timeout_ms: u64,
}

impl ProviderConfig {
    /// Domain view of this provider.
    #[must_use]
    pub fn to_provider(&self) -> Provider {
        Provider::new(ProviderId::new(&self.id), &self.endpoint, self.role)
    }

    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

pub(crate) const fn default_request_timeout_ms() -> u64 {
    10_000
}

/// Default providers: public mainnet RPC and the Jupiter lite API.
pub(crate) fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig {
            id: "solana-mainnet".to_string(),
            role: ProviderRole::Rpc,
            endpoint: "https://api.mainnet-beta.solana.com".to_string(),
            timeout_ms: default_request_timeout_ms(),
        },
        ProviderConfig {
            id: "jupiter".to_string(),
            role: ProviderRole::Quote,
            endpoint: "https://lite-api.jup.ag/swap/v1".to_string(),
            timeout_ms: default_request_timeout_ms(),
        },
    ]
}
