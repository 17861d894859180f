//! Data Transfer Objects for REST request/response serialization.
//!
//! Records the domain already exposes in wire form (alerts, tokens,
//! directory rows) are returned as-is; theaters and bookings get views
//! that flatten the derived status next to the stored row.

pub mod alert_dto;
pub mod common_dto;
pub mod directory_dto;
pub mod theater_dto;
pub mod token_dto;

pub use alert_dto::*;
pub use common_dto::*;
pub use directory_dto::*;
pub use theater_dto::*;
pub use token_dto::*;
