//! HTTP Controller (Driver Adapter)
//!
//! Axum-based REST API that delegates to the execution engine.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::application::ExecutionEngine;
use crate::domain::order_execution::OrderRequest;
use crate::domain::position::PositionError;
use crate::domain::provider_health::{HealthStatus, ProviderRole};
use crate::domain::shared::{OrderId, PositionId};
use crate::error::ErrorCode;

use super::request::SubmitOrderRequest;
use super::response::{
    CancelOrderResponse, HealthResponse, HttpAdapterError, ProviderHealthResponse,
    order_status_code,
};

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The engine.
    pub engine: Arc<ExecutionEngine>,
    /// Application version.
    pub version: String,
}

/// Create the HTTP router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/orders", post(submit_order))
        .route("/api/v1/orders/{id}", get(get_order).delete(cancel_order))
        .route("/api/v1/positions/{id}", get(get_position))
        .route("/api/v1/providers/health", get(provider_health))
        .with_state(state)
}

/// Health check endpoint.
///
/// Reports `degraded` when some role has no provider outside `unhealthy`.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let statuses = state.engine.get_provider_health();
    let role_usable = |role: ProviderRole| {
        let mut of_role = statuses.iter().filter(|s| s.role == role).peekable();
        of_role.peek().is_none() || of_role.any(|s| s.status != HealthStatus::Unhealthy)
    };
    let status = if role_usable(ProviderRole::Rpc) && role_usable(ProviderRole::Quote) {
        "healthy"
    } else {
        "degraded"
    };
    Json(HealthResponse {
        status: status.to_string(),
        version: state.version.clone(),
    })
}

/// Submit an order and wait for its final result.
async fn submit_order(
    State(state): State<AppState>,
    body: Result<Json<SubmitOrderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpAdapterError> {
    let Json(body) = body.map_err(|e| HttpAdapterError::BadRequest(e.body_text()))?;
    let request = OrderRequest::from(body);
    tracing::info!(order_id = %request.id, mint = %request.token.mint, side = %request.side, "HTTP order received");

    let result = state.engine.submit_order(request).await;
    Ok((order_status_code(&result), Json(result)))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAdapterError> {
    let id = OrderId::new(id);
    state
        .engine
        .get_order(&id)
        .await
        .map(Json)
        .ok_or_else(|| HttpAdapterError::NotFound(format!("order not found: {id}")))
}

async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id = OrderId::new(id);
    let cancelled = state.engine.cancel_order(&id);
    let status = if cancelled {
        StatusCode::ACCEPTED
    } else {
        StatusCode::NOT_FOUND
    };
    (
        status,
        Json(CancelOrderResponse {
            order_id: id.to_string(),
            cancelled,
        }),
    )
}

async fn get_position(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAdapterError> {
    match state.engine.get_position(&PositionId::new(id)).await {
        Ok(position) => Ok(Json(position)),
        Err(e @ PositionError::NotFound { .. }) => Err(HttpAdapterError::NotFound(e.to_string())),
        Err(e) => Err(HttpAdapterError::Engine {
            code: ErrorCode::InternalError,
            message: e.to_string(),
        }),
    }
}

async fn provider_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(ProviderHealthResponse {
        providers: state.engine.get_provider_health(),
    })
}
