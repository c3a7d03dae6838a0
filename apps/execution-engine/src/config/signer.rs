//! Remote signer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Signing service settings. Private keys never enter this process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Signing service base URL.
    #[serde(default)]
    pub endpoint: String,
    /// Wallet public key (base58).
    #[serde(default)]
    pub public_key: String,
    /// Bearer token for the signing service.
    #[serde(default)]
    pub auth_token: String,
    /// Request timeout (milliseconds).
    #[serde(default = "super::providers::default_request_timeout_ms")]
    pub timeout_ms: u64,
}

impl SignerConfig {
    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
