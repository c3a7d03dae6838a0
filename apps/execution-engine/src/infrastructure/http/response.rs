//! HTTP response DTOs.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::{OrderResult, OrderStatus};
use crate::domain::provider_health::ProviderStatus;
use crate::error::ErrorCode;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` when at least one provider per role is usable.
    pub status: String,
    /// Application version.
    pub version: String,
}

/// Body of `GET /api/v1/providers/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHealthResponse {
    /// Every configured provider.
    pub providers: Vec<ProviderStatus>,
}

/// Body of `DELETE /api/v1/orders/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOrderResponse {
    /// Order id.
    pub order_id: String,
    /// Whether an in-flight order was signalled.
    pub cancelled: bool,
}

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable error code.
    pub code: String,
    /// Detail.
    pub message: String,
}

/// Errors raised by handlers before reaching the engine.
#[derive(Debug, thiserror::Error)]
pub enum HttpAdapterError {
    /// Malformed request.
    #[error("{0}")]
    BadRequest(String),
    /// Unknown resource.
    #[error("{0}")]
    NotFound(String),
    /// Engine-side failure.
    #[error("{message}")]
    Engine {
        /// Error code.
        code: ErrorCode,
        /// Detail.
        message: String,
    },
}

impl IntoResponse for HttpAdapterError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidRequest.reason()),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Engine { code, .. } => (status_for(*code), code.reason()),
        };
        let body = ErrorResponse {
            code: code.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Status code for a finished order.
///
/// Fills of any size are a success; a partial fill carries its shortfall in
/// the body.
pub(super) fn order_status_code(result: &OrderResult) -> StatusCode {
    match result.status {
        OrderStatus::Filled | OrderStatus::PartiallyFilled => StatusCode::OK,
        OrderStatus::Denied => StatusCode::UNPROCESSABLE_ENTITY,
        OrderStatus::Cancelled => StatusCode::CONFLICT,
        OrderStatus::Failed => result
            .error
            .as_ref()
            .map_or(StatusCode::INTERNAL_SERVER_ERROR, |e| status_for(e.code)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_code_status() {
        let err = HttpAdapterError::Engine {
            code: ErrorCode::CircuitOpen,
            message: "breaker open".to_string(),
        };
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn not_found_is_404() {
        let err = HttpAdapterError::NotFound("position p".to_string());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
