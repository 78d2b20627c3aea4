//! System endpoints: health check and realtime status.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::SystemStatus;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /api/realtime/status` — Hub status and open connection count.
#[utoipa::path(
    get,
    path = "/api/realtime/status",
    tag = "System",
    summary = "Realtime hub status",
    description = "Reports whether the hub is accepting subscribers and how many are connected.",
    responses(
        (status = 200, description = "Hub status", body = SystemStatus),
    )
)]
pub async fn realtime_status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.hub.system_status().await)
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/realtime/status", get(realtime_status_handler))
}
