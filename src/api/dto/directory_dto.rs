//! Department, doctor and patient DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::{DepartmentId, Patient};
use crate::service::{NewPatient, PatientUpdate};

/// Request body for `POST /departments`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDepartmentRequest {
    /// Unique department name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for `POST /doctors`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDoctorRequest {
    /// Full name.
    pub name: String,
    /// Medical specialization.
    pub specialization: String,
}

/// Request body for `POST /patients`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePatientRequest {
    /// Full name.
    pub name: String,
    /// Age in years.
    #[serde(default)]
    pub age: Option<i32>,
    /// Clinical condition; "emergency", "critical" or "urgent" flags the
    /// patient for the emergency queue.
    #[serde(default)]
    pub condition: String,
    /// Responsible department.
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
}

impl From<CreatePatientRequest> for NewPatient {
    fn from(req: CreatePatientRequest) -> Self {
        Self {
            name: req.name,
            age: req.age,
            condition: req.condition,
            department_id: req.department_id,
        }
    }
}

/// Request body for `PATCH /patients/{id}`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePatientRequest {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New age.
    #[serde(default)]
    pub age: Option<i32>,
    /// New condition.
    #[serde(default)]
    pub condition: Option<String>,
    /// New department.
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
}

impl From<UpdatePatientRequest> for PatientUpdate {
    fn from(req: UpdatePatientRequest) -> Self {
        Self {
            name: req.name,
            age: req.age,
            condition: req.condition,
            department_id: req.department_id,
        }
    }
}

/// Paginated list response for `GET /patients`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PatientListResponse {
    /// Patients on this page, newest first.
    pub data: Vec<Patient>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
