//! Errors returned by provider adapters.
//!
//! Adapters classify every failure before it leaves the port, so nothing
//! above this boundary ever inspects a raw transport error.

use std::time::Duration;

use thiserror::Error;

use crate::error::PermanentErrorKind;
use crate::resilience::{ErrorCategory, categorize_message, categorize_status};

/// Classified provider failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Request exceeded its deadline.
    #[error("timeout: {message}")]
    Timeout {
        /// Detail.
        message: String,
    },

    /// Connection-level failure.
    #[error("transport error: {message}")]
    Transport {
        /// Detail.
        message: String,
    },

    /// Provider asked us to slow down.
    #[error("rate limited")]
    RateLimited {
        /// Server hint, if provided.
        retry_after: Option<Duration>,
    },

    /// 5xx or other retryable server failure.
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP status.
        status: u16,
        /// Detail.
        message: String,
    },

    /// Response could not be decoded.
    #[error("invalid response: {message}")]
    InvalidResponse {
        /// Detail.
        message: String,
    },

    /// The request can never succeed as sent.
    #[error("{kind}: {message}")]
    Permanent {
        /// Classification.
        kind: PermanentErrorKind,
        /// Detail.
        message: String,
    },
}

impl ProviderError {
    /// Classify a non-success HTTP response.
    #[must_use]
    pub fn from_status(status: u16, body: &str, retry_after: Option<Duration>) -> Self {
        match categorize_status(status) {
            ErrorCategory::RateLimited => Self::RateLimited { retry_after },
            ErrorCategory::Retryable => Self::Server {
                status,
                message: truncate(body),
            },
            ErrorCategory::NonRetryable => {
                let message = truncate(&format!("HTTP {status}: {body}"));
                Self::Permanent {
                    kind: permanent_kind(&message),
                    message,
                }
            }
        }
    }

    /// Classify an error message returned inside a successful response.
    #[must_use]
    pub fn from_message(message: &str) -> Self {
        match categorize_message(message) {
            ErrorCategory::RateLimited => Self::RateLimited { retry_after: None },
            ErrorCategory::NonRetryable => Self::Permanent {
                kind: permanent_kind(message),
                message: truncate(message),
            },
            ErrorCategory::Retryable => Self::Server {
                status: 200,
                message: truncate(message),
            },
        }
    }

    /// Whether retrying may help.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        !self.is_permanent()
    }

    /// Whether the request can never succeed.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent { .. })
    }

    /// Server-provided backoff hint.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

fn permanent_kind(message: &str) -> PermanentErrorKind {
    let lower = message.to_lowercase();
    if lower.contains("insufficient funds") || lower.contains("insufficient lamports") {
        PermanentErrorKind::InsufficientFunds
    } else if lower.contains("insufficient liquidity") || lower.contains("could not find any route")
    {
        PermanentErrorKind::InsufficientLiquidity
    } else if lower.contains("invalid mint") || lower.contains("token not tradable") {
        PermanentErrorKind::InvalidToken
    } else if lower.contains("signature") {
        PermanentErrorKind::SignatureRejected
    } else if lower.contains("insufficient") {
        PermanentErrorKind::InsufficientFunds
    } else {
        PermanentErrorKind::Rejected
    }
}

fn truncate(body: &str) -> String {
    const MAX: usize = 256;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
