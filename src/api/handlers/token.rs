//! Department token queue handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    IssueTokenRequest, TokenQueueParams, TokenQueueResponse, UpdateTokenStatusRequest,
};
use crate::app_state::AppState;
use crate::domain::{DepartmentId, Token, TokenId};
use crate::error::{ErrorResponse, OpsError};

/// `POST /departments/{id}/tokens`: Issue a token.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`] for an unknown department or patient.
#[utoipa::path(
    post,
    path = "/api/v1/departments/{id}/tokens",
    tag = "Tokens",
    summary = "Issue token",
    description = "Issues the department's next sequential number. The wait estimate counts the waiting tokens served before this one.",
    params(
        ("id" = uuid::Uuid, Path, description = "Department UUID"),
    ),
    request_body = IssueTokenRequest,
    responses(
        (status = 201, description = "Token issued", body = Token),
        (status = 404, description = "Department or patient not found", body = ErrorResponse),
    )
)]
pub async fn issue_token(
    State(state): State<AppState>,
    Path(department_id): Path<DepartmentId>,
    Json(req): Json<IssueTokenRequest>,
) -> Result<impl IntoResponse, OpsError> {
    let token = state
        .queue_service
        .issue(department_id, req.patient_id, req.priority, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(token)))
}

/// `GET /departments/{id}/tokens`: Department queue in serving order.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`] for an unknown department.
#[utoipa::path(
    get,
    path = "/api/v1/departments/{id}/tokens",
    tag = "Tokens",
    summary = "Department queue",
    description = "Tokens ordered by priority (emergency, urgent, normal) then issue time. Only waiting, called and in-progress tokens unless a status is given.",
    params(
        ("id" = uuid::Uuid, Path, description = "Department UUID"),
        TokenQueueParams,
    ),
    responses(
        (status = 200, description = "Ordered queue", body = TokenQueueResponse),
        (status = 404, description = "Department not found", body = ErrorResponse),
    )
)]
pub async fn department_queue(
    State(state): State<AppState>,
    Path(department_id): Path<DepartmentId>,
    Query(params): Query<TokenQueueParams>,
) -> Result<impl IntoResponse, OpsError> {
    let tokens = state
        .queue_service
        .queue(department_id, params.status)
        .await?;
    Ok(Json(TokenQueueResponse::new(department_id, tokens)))
}

/// `POST /departments/{id}/tokens/call-next`: Call the head of the queue.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`] for an unknown department or an empty
/// queue.
#[utoipa::path(
    post,
    path = "/api/v1/departments/{id}/tokens/call-next",
    tag = "Tokens",
    summary = "Call next token",
    params(
        ("id" = uuid::Uuid, Path, description = "Department UUID"),
    ),
    responses(
        (status = 200, description = "Called token", body = Token),
        (status = 404, description = "Department not found or nobody waiting", body = ErrorResponse),
    )
)]
pub async fn call_next(
    State(state): State<AppState>,
    Path(department_id): Path<DepartmentId>,
) -> Result<impl IntoResponse, OpsError> {
    Ok(Json(
        state
            .queue_service
            .call_next(department_id, Utc::now())
            .await?,
    ))
}

/// `GET /tokens/{id}`: Get a token.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`] if the token does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/tokens/{id}",
    tag = "Tokens",
    summary = "Get token",
    params(
        ("id" = uuid::Uuid, Path, description = "Token UUID"),
    ),
    responses(
        (status = 200, description = "Token", body = Token),
        (status = 404, description = "Token not found", body = ErrorResponse),
    )
)]
pub async fn get_token(
    State(state): State<AppState>,
    Path(id): Path<TokenId>,
) -> Result<impl IntoResponse, OpsError> {
    Ok(Json(state.queue_service.get(id).await?))
}

/// `PATCH /tokens/{id}/status`: Move a token through its lifecycle.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`], or [`OpsError::InvalidTransition`] when
/// the move is not allowed.
#[utoipa::path(
    patch,
    path = "/api/v1/tokens/{id}/status",
    tag = "Tokens",
    summary = "Update token status",
    description = "Allowed moves: waiting → called → in_progress → completed, and any open status → cancelled.",
    params(
        ("id" = uuid::Uuid, Path, description = "Token UUID"),
    ),
    request_body = UpdateTokenStatusRequest,
    responses(
        (status = 200, description = "Updated token", body = Token),
        (status = 404, description = "Token not found", body = ErrorResponse),
        (status = 409, description = "Transition not allowed", body = ErrorResponse),
    )
)]
pub async fn update_token_status(
    State(state): State<AppState>,
    Path(id): Path<TokenId>,
    Json(req): Json<UpdateTokenStatusRequest>,
) -> Result<impl IntoResponse, OpsError> {
    Ok(Json(
        state
            .queue_service
            .update_status(id, req.status, Utc::now())
            .await?,
    ))
}

/// `POST /tokens/{id}/cancel`: Cancel an open token.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`], or [`OpsError::InvalidTransition`] for a
/// completed or cancelled token.
#[utoipa::path(
    post,
    path = "/api/v1/tokens/{id}/cancel",
    tag = "Tokens",
    summary = "Cancel token",
    params(
        ("id" = uuid::Uuid, Path, description = "Token UUID"),
    ),
    responses(
        (status = 200, description = "Cancelled token", body = Token),
        (status = 404, description = "Token not found", body = ErrorResponse),
        (status = 409, description = "Token already closed", body = ErrorResponse),
    )
)]
pub async fn cancel_token(
    State(state): State<AppState>,
    Path(id): Path<TokenId>,
) -> Result<impl IntoResponse, OpsError> {
    Ok(Json(state.queue_service.cancel(id, Utc::now()).await?))
}

/// Token routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/departments/{id}/tokens",
            post(issue_token).get(department_queue),
        )
        .route("/departments/{id}/tokens/call-next", post(call_next))
        .route("/tokens/{id}", get(get_token))
        .route("/tokens/{id}/status", patch(update_token_status))
        .route("/tokens/{id}/cancel", post(cancel_token))
}
