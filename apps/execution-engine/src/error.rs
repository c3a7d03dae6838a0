//! Error taxonomy for the execution engine.
//!
//! Every failure that can reach a caller is expressed as an [`ExecutionError`]
//! and carries a stable [`ErrorCode`]. Failures local to one slice or one
//! provider attempt are absorbed internally (retry or failover); only
//! exhaustion surfaces here.
//!
//! | Code | Retried | Meaning |
//! |------|---------|---------|
//! | `TRANSIENT_PROVIDER` | yes | timeout, 5xx, rate limit |
//! | `PROVIDERS_EXHAUSTED` | yes | every candidate provider failed this attempt |
//! | `CIRCUIT_OPEN` | failover | breaker fast-fail |
//! | `SLIPPAGE_EXCEEDED` | yes, fresh quote | quote moved beyond tolerance |
//! | `PRICE_IMPACT_EXCEEDED` | yes, fresh quote | iceberg spread check failed |
//! | `PERMANENT_ORDER` | never | insufficient funds/liquidity, invalid token, signature rejected |
//! | `NO_PROVIDER_AVAILABLE` | never | all providers unhealthy, order fails fast |
//!
//! Risk denials are not errors; see `RiskDecision`.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::provider_health::ProviderRole;

/// Stable error codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed order request.
    InvalidRequest,
    /// Timeout, 5xx or rate limit from a provider.
    TransientProvider,
    /// Order can never succeed as submitted.
    PermanentOrder,
    /// Quote moved beyond the caller's slippage tolerance.
    SlippageExceeded,
    /// Quote price impact above the iceberg ceiling.
    PriceImpactExceeded,
    /// Circuit breaker rejected the call.
    CircuitOpen,
    /// No healthy or degraded provider for the role.
    NoProviderAvailable,
    /// Every candidate provider failed.
    ProvidersExhausted,
    /// Remaining slices were cancelled by the caller.
    Cancelled,
    /// Unexpected engine failure.
    InternalError,
}

impl ErrorCode {
    /// Get the error reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::TransientProvider => "TRANSIENT_PROVIDER",
            Self::PermanentOrder => "PERMANENT_ORDER",
            Self::SlippageExceeded => "SLIPPAGE_EXCEEDED",
            Self::PriceImpactExceeded => "PRICE_IMPACT_EXCEEDED",
            Self::CircuitOpen => "CIRCUIT_OPEN",
            Self::NoProviderAvailable => "NO_PROVIDER_AVAILABLE",
            Self::ProvidersExhausted => "PROVIDERS_EXHAUSTED",
            Self::Cancelled => "CANCELLED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// HTTP status used when the code is the primary outcome of a request.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest => 400,
            Self::PermanentOrder | Self::SlippageExceeded | Self::PriceImpactExceeded => 422,
            Self::Cancelled => 409,
            Self::TransientProvider
            | Self::CircuitOpen
            | Self::NoProviderAvailable
            | Self::ProvidersExhausted => 503,
            Self::InternalError => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Reason an order can never succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermanentErrorKind {
    /// Wallet lacks funds for the swap.
    InsufficientFunds,
    /// Route cannot absorb the requested size.
    InsufficientLiquidity,
    /// Mint unknown to the provider.
    InvalidToken,
    /// Signer refused or produced an invalid signature.
    SignatureRejected,
    /// Transaction rejected for another non-retryable reason.
    Rejected,
}

impl fmt::Display for PermanentErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InsufficientFunds => "insufficient funds",
            Self::InsufficientLiquidity => "insufficient liquidity",
            Self::InvalidToken => "invalid token",
            Self::SignatureRejected => "signature rejected",
            Self::Rejected => "rejected",
        };
        write!(f, "{s}")
    }
}

/// Engine-level failure taxonomy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// Request failed validation.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// What was wrong.
        message: String,
    },

    /// A provider failed transiently.
    #[error("transient provider error: {message}")]
    TransientProvider {
        /// Provider detail.
        message: String,
    },

    /// Non-retryable order failure.
    #[error("permanent order error ({kind}): {message}")]
    PermanentOrder {
        /// Classification.
        kind: PermanentErrorKind,
        /// Provider detail.
        message: String,
    },

    /// Quote outside tolerance.
    #[error("slippage exceeded: expected {expected}, quoted {quoted}, max {max_slippage_bps}bps")]
    SlippageExceeded {
        /// Reference price.
        expected: Decimal,
        /// Quoted price.
        quoted: Decimal,
        /// Caller tolerance.
        max_slippage_bps: u32,
    },

    /// Quote price impact above the iceberg ceiling.
    #[error("price impact {impact_bps}bps above ceiling {max_bps}bps")]
    PriceImpactExceeded {
        /// Observed impact.
        impact_bps: Decimal,
        /// Ceiling.
        max_bps: u32,
    },

    /// Breaker fast-fail.
    #[error("circuit open for {key}")]
    CircuitOpen {
        /// Breaker key.
        key: String,
    },

    /// No provider qualifies for the role.
    #[error("no {role} provider available")]
    NoProviderAvailable {
        /// Requested role.
        role: ProviderRole,
    },

    /// All candidates were tried and failed.
    #[error("all {role} providers failed: {summary}")]
    ProvidersExhausted {
        /// Requested role.
        role: ProviderRole,
        /// `provider: reason` list.
        summary: String,
    },

    /// Slice cancelled before it was scheduled.
    #[error("cancelled before submission")]
    Cancelled,

    /// Unexpected failure inside the engine.
    #[error("internal error: {message}")]
    Internal {
        /// Detail.
        message: String,
    },
}

impl ExecutionError {
    /// Stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            Self::TransientProvider { .. } => ErrorCode::TransientProvider,
            Self::PermanentOrder { .. } => ErrorCode::PermanentOrder,
            Self::SlippageExceeded { .. } => ErrorCode::SlippageExceeded,
            Self::PriceImpactExceeded { .. } => ErrorCode::PriceImpactExceeded,
            Self::CircuitOpen { .. } => ErrorCode::CircuitOpen,
            Self::NoProviderAvailable { .. } => ErrorCode::NoProviderAvailable,
            Self::ProvidersExhausted { .. } => ErrorCode::ProvidersExhausted,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Whether a slice may be retried with a fresh quote after this error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransientProvider { .. }
                | Self::SlippageExceeded { .. }
                | Self::PriceImpactExceeded { .. }
                | Self::CircuitOpen { .. }
                | Self::ProvidersExhausted { .. }
        )
    }

    /// Whether the whole order should stop scheduling new slices.
    #[must_use]
    pub const fn aborts_order(&self) -> bool {
        matches!(self, Self::NoProviderAvailable { .. })
    }

    /// Convert into the serializable form carried by results.
    #[must_use]
    pub fn to_info(&self) -> ErrorInfo {
        ErrorInfo {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Serializable error summary attached to results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable code.
    pub code: ErrorCode,
    /// Human-readable detail.
    pub message: String,
}
