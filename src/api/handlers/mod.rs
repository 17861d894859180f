//! REST endpoint handlers organized by resource.

pub mod alert;
pub mod booking;
pub mod directory;
pub mod system;
pub mod theater;
pub mod token;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(theater::routes())
        .merge(booking::routes())
        .merge(alert::routes())
        .merge(token::routes())
        .merge(directory::routes())
}
