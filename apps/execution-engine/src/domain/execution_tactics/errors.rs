//! Execution Tactics Errors

use thiserror::Error;

/// Errors raised while planning an order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TacticError {
    /// Algorithm parameters are unusable.
    #[error("Invalid tactic configuration: {message}")]
    InvalidConfiguration {
        /// Error details.
        message: String,
    },

    /// Size is zero or negative after rounding to token precision.
    #[error("Invalid order size: {size}")]
    InvalidSize {
        /// The offending size.
        size: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TacticError::InvalidConfiguration {
            message: "zero slices".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid tactic configuration: zero slices");

        let err = TacticError::InvalidSize {
            size: "0".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid order size: 0");
    }
}
