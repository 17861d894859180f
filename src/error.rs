//! Service error types with HTTP status code mapping.
//!
//! [`OpsError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2002,
///     "message": "booking conflict: overlaps booking 5f0c…",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`OpsError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category             | HTTP Status                  |
/// |-----------|----------------------|------------------------------|
/// | 1000–1999 | Validation           | 400 Bad Request              |
/// | 2000–2999 | Not Found / Conflict | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server               | 500 Internal Server Error    |
#[derive(Debug, thiserror::Error)]
pub enum OpsError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A record with the given kind and identifier does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Record kind (e.g. `"theater"`).
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The proposed booking overlaps an active booking of the theater.
    #[error("booking conflict: {0}")]
    BookingConflict(String),

    /// The theater is closed for maintenance or cleaning over the
    /// requested interval.
    #[error("theater unavailable: {0}")]
    TheaterUnavailable(String),

    /// A status change that the lifecycle rules do not permit.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// A unique key already exists.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OpsError {
    /// Shorthand for [`OpsError::NotFound`].
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`OpsError::InvalidTransition`].
    #[must_use]
    pub fn transition(from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::NotFound { .. } => 2001,
            Self::BookingConflict(_) => 2002,
            Self::TheaterUnavailable(_) => 2003,
            Self::InvalidTransition { .. } => 2004,
            Self::Duplicate(_) => 2005,
            Self::PersistenceError(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BookingConflict(_)
            | Self::TheaterUnavailable(_)
            | Self::InvalidTransition { .. }
            | Self::Duplicate(_) => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for OpsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn conflict_family_maps_to_409() {
        for err in [
            OpsError::BookingConflict("x".to_string()),
            OpsError::TheaterUnavailable("x".to_string()),
            OpsError::transition("completed", "cancelled"),
            OpsError::Duplicate("x".to_string()),
        ] {
            assert_eq!(err.status_code(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn not_found_message_names_entity() {
        let err = OpsError::not_found("theater", "OT-404");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), 2001);
        assert_eq!(err.to_string(), "theater not found: OT-404");
    }

    #[test]
    fn server_errors_are_500() {
        assert_eq!(
            OpsError::PersistenceError("down".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(OpsError::Internal("x".to_string()).error_code(), 3000);
    }
}
