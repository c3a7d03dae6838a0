//! Provider descriptor.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::ProviderId;

/// What a provider is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderRole {
    /// Blockchain JSON-RPC (fees, simulate, send).
    Rpc,
    /// Quote/swap aggregator.
    Quote,
}

impl fmt::Display for ProviderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rpc => write!(f, "rpc"),
            Self::Quote => write!(f, "quote"),
        }
    }
}

/// A configured upstream endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// Stable identifier.
    pub id: ProviderId,
    /// Base URL.
    pub endpoint: String,
    /// Role served.
    pub role: ProviderRole,
}

impl Provider {
    /// Create a provider descriptor.
    #[must_use]
    pub fn new(id: impl Into<ProviderId>, endpoint: impl Into<String>, role: ProviderRole) -> Self {
        Self {
            id: id.into(),
            endpoint: endpoint.into(),
            role,
        }
    }
}
