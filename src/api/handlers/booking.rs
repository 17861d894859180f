//! Booking lifecycle handlers: cancel and complete.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::BookingResponse;
use crate::app_state::AppState;
use crate::domain::BookingId;
use crate::error::{ErrorResponse, OpsError};

/// `POST /bookings/{id}/cancel`: Cancel an active booking.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`] or [`OpsError::InvalidTransition`].
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/cancel",
    tag = "Bookings",
    summary = "Cancel booking",
    description = "Frees the booked interval. The theater label is refreshed from its remaining bookings.",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    responses(
        (status = 200, description = "Cancelled booking", body = BookingResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
        (status = 409, description = "Booking already closed", body = ErrorResponse),
    )
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
) -> Result<impl IntoResponse, OpsError> {
    let booking = state.theater_service.cancel_booking(id, Utc::now()).await?;
    Ok(Json(BookingResponse::from(booking)))
}

/// `POST /bookings/{id}/complete`: Complete a booking early.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`] or [`OpsError::InvalidTransition`].
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/complete",
    tag = "Bookings",
    summary = "Complete booking",
    description = "Marks the surgery finished and puts the theater into cleaning.",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    responses(
        (status = 200, description = "Completed booking", body = BookingResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
        (status = 409, description = "Booking already closed", body = ErrorResponse),
    )
)]
pub async fn complete_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
) -> Result<impl IntoResponse, OpsError> {
    let booking = state
        .theater_service
        .complete_booking(id, Utc::now())
        .await?;
    Ok(Json(BookingResponse::from(booking)))
}

/// Booking routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings/{id}/cancel", post(cancel_booking))
        .route("/bookings/{id}/complete", post(complete_booking))
}
