//! Emergency alert DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::{PaginationMeta, PaginationParams};
use crate::domain::{AlertCode, AlertStatus, EmergencyAlert, StaffRole};
use crate::service::NewAlert;

/// Request body for `POST /alerts`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RaiseAlertRequest {
    /// Incident code.
    pub code: AlertCode,
    /// Where it happened.
    pub location: String,
    /// What happened.
    pub message: String,
    /// 1 (most urgent) to 5. Defaults to 1.
    #[serde(default = "default_priority")]
    pub priority: u8,
    /// Roles to notify; empty or omitted notifies everyone.
    #[serde(default)]
    pub target_roles: Vec<StaffRole>,
}

fn default_priority() -> u8 {
    1
}

impl From<RaiseAlertRequest> for NewAlert {
    fn from(req: RaiseAlertRequest) -> Self {
        Self {
            code: req.code,
            location: req.location,
            message: req.message,
            priority: req.priority,
            target_roles: req.target_roles,
        }
    }
}

/// Query parameters for `GET /alerts`.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AlertListParams {
    /// Only alerts in this status.
    #[serde(default)]
    pub status: Option<AlertStatus>,
    /// Page number (1-indexed).
    #[serde(default)]
    pub page: Option<u32>,
    /// Items per page (max 100).
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl AlertListParams {
    /// Page selection, with defaults for omitted values.
    #[must_use]
    pub fn pagination(&self) -> PaginationParams {
        let defaults = PaginationParams::default();
        PaginationParams {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// Paginated list response for `GET /alerts`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AlertListResponse {
    /// Alerts on this page, most urgent first.
    pub data: Vec<EmergencyAlert>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
