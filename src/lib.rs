//! # hospital-ops
//!
//! REST API and WebSocket service for hospital operations: operating
//! theater scheduling and live status, department token queues, and
//! emergency alerts.
//!
//! Theater status is derived from the current time and the booking on
//! each theater's board; a background reconciler persists what the
//! derivation observes. Every mutation is broadcast on an event bus that
//! feeds role-filtered WebSocket subscriptions.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── Theater / Queue / Alert / Directory services (service/)
//!     ├── Status reconciler (service/)
//!     ├── EventBus (domain/)
//!     │
//!     └── HospitalStore (persistence/): PostgreSQL or in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Upper bound on the time spent producing a REST response.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the full application router: REST API, WebSocket feed, and
/// (with the `swagger-ui` feature) the interactive API docs.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws::handler::ws_handler))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
