//! Environment configuration for trading mode.

use serde::{Deserialize, Serialize};

/// Where orders go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradingMode {
    /// Scripted in-process providers; nothing leaves the host.
    #[default]
    Paper,
    /// Real RPC nodes, aggregators and signer.
    Live,
}

impl TradingMode {
    /// Whether real transactions are sent.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }

    /// Upper-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paper => "PAPER",
            Self::Live => "LIVE",
        }
    }
}

/// Environment configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Trading mode.
    #[serde(default)]
    pub mode: TradingMode,
}
