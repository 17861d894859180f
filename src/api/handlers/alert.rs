//! Emergency alert handlers and the emergency queue.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{AlertListParams, AlertListResponse, RaiseAlertRequest};
use crate::app_state::AppState;
use crate::domain::{AlertId, EmergencyAlert, EmergencyEntry};
use crate::error::{ErrorResponse, OpsError};

/// `POST /alerts`: Raise an emergency alert.
///
/// # Errors
///
/// Returns [`OpsError::InvalidRequest`] for a priority outside 1..=5 or a
/// blank location or message.
#[utoipa::path(
    post,
    path = "/api/v1/alerts",
    tag = "Alerts",
    summary = "Raise alert",
    description = "Records an active alert and pushes it to WebSocket subscribers holding one of the target roles (everyone when no roles are given).",
    request_body = RaiseAlertRequest,
    responses(
        (status = 201, description = "Alert raised", body = EmergencyAlert),
        (status = 400, description = "Invalid alert", body = ErrorResponse),
    )
)]
pub async fn raise_alert(
    State(state): State<AppState>,
    Json(req): Json<RaiseAlertRequest>,
) -> Result<impl IntoResponse, OpsError> {
    let alert = state.alert_service.raise(req.into(), Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(alert)))
}

/// `GET /alerts`: List alerts.
///
/// # Errors
///
/// Returns [`OpsError`] on storage failures.
#[utoipa::path(
    get,
    path = "/api/v1/alerts",
    tag = "Alerts",
    summary = "List alerts",
    description = "Returns a paginated list of alerts, most urgent first, optionally filtered by status.",
    params(AlertListParams),
    responses(
        (status = 200, description = "Paginated alert list", body = AlertListResponse),
    )
)]
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(params): Query<AlertListParams>,
) -> Result<impl IntoResponse, OpsError> {
    let alerts = state.alert_service.list(params.status).await?;
    let (data, pagination) = params.pagination().paginate(alerts, |a| a);
    Ok(Json(AlertListResponse { data, pagination }))
}

/// `GET /alerts/{id}`: Get an alert.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`] if the alert does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/alerts/{id}",
    tag = "Alerts",
    summary = "Get alert",
    params(
        ("id" = uuid::Uuid, Path, description = "Alert UUID"),
    ),
    responses(
        (status = 200, description = "Alert", body = EmergencyAlert),
        (status = 404, description = "Alert not found", body = ErrorResponse),
    )
)]
pub async fn get_alert(
    State(state): State<AppState>,
    Path(id): Path<AlertId>,
) -> Result<impl IntoResponse, OpsError> {
    Ok(Json(state.alert_service.get(id).await?))
}

/// `POST /alerts/{id}/resolve`: Resolve an active alert.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`], or [`OpsError::InvalidTransition`] if
/// the alert is already resolved.
#[utoipa::path(
    post,
    path = "/api/v1/alerts/{id}/resolve",
    tag = "Alerts",
    summary = "Resolve alert",
    params(
        ("id" = uuid::Uuid, Path, description = "Alert UUID"),
    ),
    responses(
        (status = 200, description = "Resolved alert", body = EmergencyAlert),
        (status = 404, description = "Alert not found", body = ErrorResponse),
        (status = 409, description = "Alert already resolved", body = ErrorResponse),
    )
)]
pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(id): Path<AlertId>,
) -> Result<impl IntoResponse, OpsError> {
    Ok(Json(state.alert_service.resolve(id, Utc::now()).await?))
}

/// `GET /emergency-queue`: Assembled emergency board.
///
/// # Errors
///
/// Returns [`OpsError`] on storage failures.
#[utoipa::path(
    get,
    path = "/api/v1/emergency-queue",
    tag = "Alerts",
    summary = "Emergency queue",
    description = "Active alerts by priority, followed by patients whose condition mentions emergency, critical or urgent. At most five entries.",
    responses(
        (status = 200, description = "Emergency queue", body = Vec<EmergencyEntry>),
    )
)]
pub async fn emergency_queue(State(state): State<AppState>) -> Result<impl IntoResponse, OpsError> {
    Ok(Json(state.alert_service.emergency_queue().await?))
}

/// Alert routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/alerts", post(raise_alert).get(list_alerts))
        .route("/alerts/{id}", get(get_alert))
        .route("/alerts/{id}/resolve", post(resolve_alert))
        .route("/emergency-queue", get(emergency_queue))
}
