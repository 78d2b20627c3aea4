//! Ingress endpoints: collaborators post a freshly persisted record and
//! the hub broadcasts it.
//!
//! Each endpoint validates the body as the matching record type and calls
//! one hook. The response is always `202 Accepted` once the body decoded,
//! whatever the number of recipients.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::NotifyResponse;
use crate::app_state::AppState;
use crate::domain::{AiInsight, Alert, EventKind, LabResult, Patient, SystemStatus, VitalSigns};
use crate::error::{ErrorResponse, HubError};

fn accepted(kind: EventKind, recipients: usize) -> impl IntoResponse {
    (StatusCode::ACCEPTED, Json(NotifyResponse::new(kind, recipients)))
}

/// `POST /notify/vitals` — Broadcast a recorded vital-signs reading.
///
/// # Errors
///
/// Returns [`HubError::InvalidRequest`] if the body is not a vital-signs record.
#[utoipa::path(
    post,
    path = "/api/v1/notify/vitals",
    tag = "Notify",
    summary = "Broadcast vital signs",
    request_body = VitalSigns,
    responses(
        (status = 202, description = "Envelope broadcast", body = NotifyResponse),
        (status = 400, description = "Malformed record", body = ErrorResponse),
    )
)]
pub async fn notify_vitals(
    State(state): State<AppState>,
    payload: Result<Json<VitalSigns>, JsonRejection>,
) -> Result<impl IntoResponse, HubError> {
    let Json(record) = payload?;
    let recipients = state.hub.notify_vitals(record).await;
    Ok(accepted(EventKind::VitalsUpdate, recipients))
}

/// `POST /notify/labs` — Broadcast a completed lab result.
///
/// # Errors
///
/// Returns [`HubError::InvalidRequest`] if the body is not a lab result.
#[utoipa::path(
    post,
    path = "/api/v1/notify/labs",
    tag = "Notify",
    summary = "Broadcast a lab result",
    request_body = LabResult,
    responses(
        (status = 202, description = "Envelope broadcast", body = NotifyResponse),
        (status = 400, description = "Malformed record", body = ErrorResponse),
    )
)]
pub async fn notify_lab_result(
    State(state): State<AppState>,
    payload: Result<Json<LabResult>, JsonRejection>,
) -> Result<impl IntoResponse, HubError> {
    let Json(record) = payload?;
    let recipients = state.hub.notify_lab_result(record).await;
    Ok(accepted(EventKind::LabResult, recipients))
}

/// `POST /notify/alerts` — Broadcast a raised or acknowledged alert.
///
/// # Errors
///
/// Returns [`HubError::InvalidRequest`] if the body is not an alert.
#[utoipa::path(
    post,
    path = "/api/v1/notify/alerts",
    tag = "Notify",
    summary = "Broadcast an alert",
    request_body = Alert,
    responses(
        (status = 202, description = "Envelope broadcast", body = NotifyResponse),
        (status = 400, description = "Malformed record", body = ErrorResponse),
    )
)]
pub async fn notify_alert(
    State(state): State<AppState>,
    payload: Result<Json<Alert>, JsonRejection>,
) -> Result<impl IntoResponse, HubError> {
    let Json(record) = payload?;
    let recipients = state.hub.notify_alert(record).await;
    Ok(accepted(EventKind::Alert, recipients))
}

/// `POST /notify/insights` — Broadcast a generated AI insight.
///
/// # Errors
///
/// Returns [`HubError::InvalidRequest`] if the body is not an insight.
#[utoipa::path(
    post,
    path = "/api/v1/notify/insights",
    tag = "Notify",
    summary = "Broadcast an AI insight",
    request_body = AiInsight,
    responses(
        (status = 202, description = "Envelope broadcast", body = NotifyResponse),
        (status = 400, description = "Malformed record", body = ErrorResponse),
    )
)]
pub async fn notify_insight(
    State(state): State<AppState>,
    payload: Result<Json<AiInsight>, JsonRejection>,
) -> Result<impl IntoResponse, HubError> {
    let Json(record) = payload?;
    let recipients = state.hub.notify_insight(record).await;
    Ok(accepted(EventKind::AiInsight, recipients))
}

/// `POST /notify/patients` — Broadcast a created, updated or discharged patient.
///
/// # Errors
///
/// Returns [`HubError::InvalidRequest`] if the body is not a patient record.
#[utoipa::path(
    post,
    path = "/api/v1/notify/patients",
    tag = "Notify",
    summary = "Broadcast a patient change",
    request_body = Patient,
    responses(
        (status = 202, description = "Envelope broadcast", body = NotifyResponse),
        (status = 400, description = "Malformed record", body = ErrorResponse),
    )
)]
pub async fn notify_patient_change(
    State(state): State<AppState>,
    payload: Result<Json<Patient>, JsonRejection>,
) -> Result<impl IntoResponse, HubError> {
    let Json(record) = payload?;
    let recipients = state.hub.notify_patient_change(record).await;
    Ok(accepted(EventKind::PatientUpdate, recipients))
}

/// `POST /notify/system-status` — Broadcast a status report.
///
/// # Errors
///
/// Returns [`HubError::InvalidRequest`] if the body is not a status payload.
#[utoipa::path(
    post,
    path = "/api/v1/notify/system-status",
    tag = "Notify",
    summary = "Broadcast a system status",
    request_body = SystemStatus,
    responses(
        (status = 202, description = "Envelope broadcast", body = NotifyResponse),
        (status = 400, description = "Malformed record", body = ErrorResponse),
    )
)]
pub async fn notify_system_status(
    State(state): State<AppState>,
    payload: Result<Json<SystemStatus>, JsonRejection>,
) -> Result<impl IntoResponse, HubError> {
    let Json(status) = payload?;
    let recipients = state.hub.notify_system_status(status).await;
    Ok(accepted(EventKind::SystemStatus, recipients))
}

/// Ingress routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notify/vitals", post(notify_vitals))
        .route("/notify/labs", post(notify_lab_result))
        .route("/notify/alerts", post(notify_alert))
        .route("/notify/insights", post(notify_insight))
        .route("/notify/patients", post(notify_patient_change))
        .route("/notify/system-status", post(notify_system_status))
}
