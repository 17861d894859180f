//! System endpoints: health check and the staff roles catalog.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::StaffRole;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` or `degraded`.
    pub status: String,
    /// Store backend name.
    pub store: String,
    /// Whether the store answered.
    pub store_ok: bool,
    /// Server time.
    pub timestamp: String,
    /// Crate version.
    pub version: String,
    /// Live WebSocket subscribers.
    pub subscribers: usize,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health, store reachability, version, and current timestamp. Answers 503 when the store is unreachable.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let store_ok = match state.store.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "store health check failed");
            false
        }
    };
    let (code, status) = if store_ok {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            store: state.store.backend().to_string(),
            store_ok,
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            subscribers: state.event_bus.receiver_count(),
        }),
    )
}

/// Staff role info.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoleInfo {
    /// Role identifier used in alerts and WebSocket subscriptions.
    pub role: StaffRole,
    /// What the role's dashboard covers.
    pub description: String,
}

/// `GET /config/roles`: List staff roles.
#[utoipa::path(
    get,
    path = "/config/roles",
    tag = "System",
    summary = "List staff roles",
    description = "Returns every dashboard role that alerts can target and WebSocket clients can declare.",
    responses(
        (status = 200, description = "Role catalog", body = Vec<RoleInfo>),
    )
)]
pub async fn roles_handler() -> impl IntoResponse {
    let roles: Vec<RoleInfo> = StaffRole::ALL
        .into_iter()
        .map(|role| RoleInfo {
            role,
            description: role.description().to_string(),
        })
        .collect();
    (StatusCode::OK, Json(roles))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/roles", get(roles_handler))
}
