//! Order execution errors.

use thiserror::Error;

use crate::error::ExecutionError;

/// Errors raised while validating an order request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderError {
    /// Invalid order parameters.
    #[error("Invalid parameter '{field}': {message}")]
    InvalidParameters {
        /// Field with invalid value.
        field: String,
        /// Error message.
        message: String,
    },
}

impl OrderError {
    /// Shorthand for [`OrderError::InvalidParameters`].
    #[must_use]
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<OrderError> for ExecutionError {
    fn from(err: OrderError) -> Self {
        Self::InvalidRequest {
            message: err.to_string(),
        }
    }
}
