//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The endpoint at `/ws` streams [`crate::domain::HospitalEvent`]s to
//! dashboards. Clients pick topics and declare their staff roles; alert
//! events only reach clients holding a targeted role.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
