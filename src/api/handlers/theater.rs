//! Theater handlers: registry, derived status, conflict checks, and
//! surgery scheduling.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    BookingListParams, BookingResponse, ConflictCheckRequest, ConflictCheckResponse,
    CreateTheaterRequest, ScheduleSurgeryRequest, TheaterResponse, UpdateTheaterRequest,
};
use crate::app_state::AppState;
use crate::domain::TheaterId;
use crate::error::{ErrorResponse, OpsError};

/// `POST /theaters`: Register an operating theater.
///
/// # Errors
///
/// Returns [`OpsError`] on a blank field or a duplicate code.
#[utoipa::path(
    post,
    path = "/api/v1/theaters",
    tag = "Theaters",
    summary = "Register a theater",
    description = "Creates an available theater. Codes such as `OT-002` must be unique.",
    request_body = CreateTheaterRequest,
    responses(
        (status = 201, description = "Theater created", body = TheaterResponse),
        (status = 400, description = "Blank code or name", body = ErrorResponse),
        (status = 409, description = "Code already in use", body = ErrorResponse),
    )
)]
pub async fn create_theater(
    State(state): State<AppState>,
    Json(req): Json<CreateTheaterRequest>,
) -> Result<impl IntoResponse, OpsError> {
    let view = state
        .theater_service
        .create_theater(&req.code, &req.name, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(TheaterResponse::from(view))))
}

/// `GET /theaters`: List theaters with their live status.
///
/// # Errors
///
/// Returns [`OpsError`] on storage failures.
#[utoipa::path(
    get,
    path = "/api/v1/theaters",
    tag = "Theaters",
    summary = "List theaters",
    description = "Returns every theater with the status derived at request time: available, occupied, booked, maintenance or cleaning, plus occupant and progress when a surgery is running.",
    responses(
        (status = 200, description = "Theaters ordered by code", body = Vec<TheaterResponse>),
    )
)]
pub async fn list_theaters(State(state): State<AppState>) -> Result<impl IntoResponse, OpsError> {
    let views = state.theater_service.list_theaters(Utc::now()).await?;
    let data: Vec<TheaterResponse> = views.into_iter().map(TheaterResponse::from).collect();
    Ok(Json(data))
}

/// `GET /theaters/{id}`: Get one theater with its live status.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`] if the theater does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/theaters/{id}",
    tag = "Theaters",
    summary = "Get theater",
    params(
        ("id" = uuid::Uuid, Path, description = "Theater UUID"),
    ),
    responses(
        (status = 200, description = "Theater with derived status", body = TheaterResponse),
        (status = 404, description = "Theater not found", body = ErrorResponse),
    )
)]
pub async fn get_theater(
    State(state): State<AppState>,
    Path(id): Path<TheaterId>,
) -> Result<impl IntoResponse, OpsError> {
    let view = state.theater_service.get_theater(id, Utc::now()).await?;
    Ok(Json(TheaterResponse::from(view)))
}

/// `PATCH /theaters/{id}`: Rename or relabel a theater.
///
/// # Errors
///
/// Returns [`OpsError`] if the theater does not exist or the name is blank.
#[utoipa::path(
    patch,
    path = "/api/v1/theaters/{id}",
    tag = "Theaters",
    summary = "Update theater",
    description = "Changes the display name or the lifecycle label. Setting `maintenance` or `cleaning` with `status_until` closes the theater until that time.",
    params(
        ("id" = uuid::Uuid, Path, description = "Theater UUID"),
    ),
    request_body = UpdateTheaterRequest,
    responses(
        (status = 200, description = "Updated theater", body = TheaterResponse),
        (status = 400, description = "Invalid update", body = ErrorResponse),
        (status = 404, description = "Theater not found", body = ErrorResponse),
    )
)]
pub async fn update_theater(
    State(state): State<AppState>,
    Path(id): Path<TheaterId>,
    Json(req): Json<UpdateTheaterRequest>,
) -> Result<impl IntoResponse, OpsError> {
    let view = state
        .theater_service
        .update_theater(id, req.into(), Utc::now())
        .await?;
    Ok(Json(TheaterResponse::from(view)))
}

/// `DELETE /theaters/{id}`: Remove a theater and its bookings.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`] if the theater does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/theaters/{id}",
    tag = "Theaters",
    summary = "Delete theater",
    params(
        ("id" = uuid::Uuid, Path, description = "Theater UUID"),
    ),
    responses(
        (status = 204, description = "Theater deleted"),
        (status = 404, description = "Theater not found", body = ErrorResponse),
    )
)]
pub async fn delete_theater(
    State(state): State<AppState>,
    Path(id): Path<TheaterId>,
) -> Result<impl IntoResponse, OpsError> {
    state.theater_service.delete_theater(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /theaters/{id}/conflicts`: Check a proposed interval.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`] if the theater does not exist.
#[utoipa::path(
    post,
    path = "/api/v1/theaters/{id}/conflicts",
    tag = "Theaters",
    summary = "Check booking conflict",
    description = "Computes `[start_time, start_time + duration)` and reports whether it overlaps an active booking. Durations are read as hours from their leading number; unreadable durations count as 2 hours.",
    params(
        ("id" = uuid::Uuid, Path, description = "Theater UUID"),
    ),
    request_body = ConflictCheckRequest,
    responses(
        (status = 200, description = "Conflict check result", body = ConflictCheckResponse),
        (status = 404, description = "Theater not found", body = ErrorResponse),
    )
)]
pub async fn check_conflict(
    State(state): State<AppState>,
    Path(id): Path<TheaterId>,
    Json(req): Json<ConflictCheckRequest>,
) -> Result<impl IntoResponse, OpsError> {
    let check = state
        .theater_service
        .check_conflict(id, req.start_time, &req.duration)
        .await?;
    Ok(Json(ConflictCheckResponse::from(check)))
}

/// `POST /theaters/{id}/bookings`: Schedule a surgery.
///
/// # Errors
///
/// Returns [`OpsError`] on validation failure, an unknown theater or
/// patient, a closed theater, or an overlapping booking.
#[utoipa::path(
    post,
    path = "/api/v1/theaters/{id}/bookings",
    tag = "Bookings",
    summary = "Schedule surgery",
    description = "Books a surgery atomically: the overlap check, surgeon resolution, insert and theater label update commit together. Without a known surgeon id the name is matched or registered; without a name the on-call surgeon is used.",
    params(
        ("id" = uuid::Uuid, Path, description = "Theater UUID"),
    ),
    request_body = ScheduleSurgeryRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingResponse),
        (status = 400, description = "Missing patient, procedure or start", body = ErrorResponse),
        (status = 404, description = "Theater or patient not found", body = ErrorResponse),
        (status = 409, description = "Overlap or theater closed", body = ErrorResponse),
    )
)]
pub async fn schedule_surgery(
    State(state): State<AppState>,
    Path(id): Path<TheaterId>,
    Json(req): Json<ScheduleSurgeryRequest>,
) -> Result<impl IntoResponse, OpsError> {
    let booking = state
        .theater_service
        .schedule_surgery(id, req.into(), Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}

/// `GET /theaters/{id}/bookings`: List a theater's bookings.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`] if the theater does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/theaters/{id}/bookings",
    tag = "Bookings",
    summary = "List bookings",
    params(
        ("id" = uuid::Uuid, Path, description = "Theater UUID"),
        BookingListParams,
    ),
    responses(
        (status = 200, description = "Bookings by start time", body = Vec<BookingResponse>),
        (status = 404, description = "Theater not found", body = ErrorResponse),
    )
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    Path(id): Path<TheaterId>,
    Query(params): Query<BookingListParams>,
) -> Result<impl IntoResponse, OpsError> {
    let bookings = state
        .theater_service
        .list_bookings(id, params.active)
        .await?;
    let data: Vec<BookingResponse> = bookings.into_iter().map(BookingResponse::from).collect();
    Ok(Json(data))
}

/// Theater routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/theaters", post(create_theater).get(list_theaters))
        .route(
            "/theaters/{id}",
            get(get_theater).patch(update_theater).delete(delete_theater),
        )
        .route("/theaters/{id}/conflicts", post(check_conflict))
        .route(
            "/theaters/{id}/bookings",
            post(schedule_surgery).get(list_bookings),
        )
}
