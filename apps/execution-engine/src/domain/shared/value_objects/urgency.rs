//! Caller urgency.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How quickly the caller needs the order done.
///
/// Drives both algorithm selection and the priority-fee tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    /// Cost matters more than speed.
    Low,
    /// Balanced.
    #[default]
    Medium,
    /// Speed matters more than cost.
    High,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}
