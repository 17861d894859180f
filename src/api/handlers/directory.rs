//! Directory handlers: departments, doctors, and patients.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    CreateDepartmentRequest, CreateDoctorRequest, CreatePatientRequest, PaginationParams,
    PatientListResponse, UpdatePatientRequest,
};
use crate::app_state::AppState;
use crate::domain::{Department, DepartmentId, Doctor, DoctorId, Patient, PatientId};
use crate::error::{ErrorResponse, OpsError};

/// `POST /departments`: Create a department.
///
/// # Errors
///
/// Returns [`OpsError`] on a blank or duplicate name.
#[utoipa::path(
    post,
    path = "/api/v1/departments",
    tag = "Directory",
    summary = "Create department",
    request_body = CreateDepartmentRequest,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 400, description = "Blank name", body = ErrorResponse),
        (status = 409, description = "Name already in use", body = ErrorResponse),
    )
)]
pub async fn create_department(
    State(state): State<AppState>,
    Json(req): Json<CreateDepartmentRequest>,
) -> Result<impl IntoResponse, OpsError> {
    let department = state
        .directory_service
        .create_department(&req.name, req.description, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(department)))
}

/// `GET /departments`: List departments.
///
/// # Errors
///
/// Returns [`OpsError`] on storage failures.
#[utoipa::path(
    get,
    path = "/api/v1/departments",
    tag = "Directory",
    summary = "List departments",
    responses(
        (status = 200, description = "Departments by name", body = Vec<Department>),
    )
)]
pub async fn list_departments(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, OpsError> {
    Ok(Json(state.directory_service.list_departments().await?))
}

/// `GET /departments/{id}`: Get a department.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`] if the department does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/departments/{id}",
    tag = "Directory",
    summary = "Get department",
    params(
        ("id" = uuid::Uuid, Path, description = "Department UUID"),
    ),
    responses(
        (status = 200, description = "Department", body = Department),
        (status = 404, description = "Department not found", body = ErrorResponse),
    )
)]
pub async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<DepartmentId>,
) -> Result<impl IntoResponse, OpsError> {
    Ok(Json(state.directory_service.get_department(id).await?))
}

/// `DELETE /departments/{id}`: Delete a department and its tokens.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`] if the department does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/departments/{id}",
    tag = "Directory",
    summary = "Delete department",
    params(
        ("id" = uuid::Uuid, Path, description = "Department UUID"),
    ),
    responses(
        (status = 204, description = "Department deleted"),
        (status = 404, description = "Department not found", body = ErrorResponse),
    )
)]
pub async fn delete_department(
    State(state): State<AppState>,
    Path(id): Path<DepartmentId>,
) -> Result<impl IntoResponse, OpsError> {
    state.directory_service.delete_department(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /doctors`: Register a doctor.
///
/// # Errors
///
/// Returns [`OpsError::InvalidRequest`] on a blank field.
#[utoipa::path(
    post,
    path = "/api/v1/doctors",
    tag = "Directory",
    summary = "Register doctor",
    request_body = CreateDoctorRequest,
    responses(
        (status = 201, description = "Doctor registered", body = Doctor),
        (status = 400, description = "Blank name or specialization", body = ErrorResponse),
    )
)]
pub async fn create_doctor(
    State(state): State<AppState>,
    Json(req): Json<CreateDoctorRequest>,
) -> Result<impl IntoResponse, OpsError> {
    let doctor = state
        .directory_service
        .create_doctor(&req.name, &req.specialization, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(doctor)))
}

/// `GET /doctors`: List doctors.
///
/// # Errors
///
/// Returns [`OpsError`] on storage failures.
#[utoipa::path(
    get,
    path = "/api/v1/doctors",
    tag = "Directory",
    summary = "List doctors",
    responses(
        (status = 200, description = "Doctors by name", body = Vec<Doctor>),
    )
)]
pub async fn list_doctors(State(state): State<AppState>) -> Result<impl IntoResponse, OpsError> {
    Ok(Json(state.directory_service.list_doctors().await?))
}

/// `GET /doctors/{id}`: Get a doctor.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`] if the doctor does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/doctors/{id}",
    tag = "Directory",
    summary = "Get doctor",
    params(
        ("id" = uuid::Uuid, Path, description = "Doctor UUID"),
    ),
    responses(
        (status = 200, description = "Doctor", body = Doctor),
        (status = 404, description = "Doctor not found", body = ErrorResponse),
    )
)]
pub async fn get_doctor(
    State(state): State<AppState>,
    Path(id): Path<DoctorId>,
) -> Result<impl IntoResponse, OpsError> {
    Ok(Json(state.directory_service.get_doctor(id).await?))
}

/// `DELETE /doctors/{id}`: Delete a doctor with no bookings.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`], or [`OpsError::InvalidRequest`] while
/// bookings name the doctor as surgeon.
#[utoipa::path(
    delete,
    path = "/api/v1/doctors/{id}",
    tag = "Directory",
    summary = "Delete doctor",
    params(
        ("id" = uuid::Uuid, Path, description = "Doctor UUID"),
    ),
    responses(
        (status = 204, description = "Doctor deleted"),
        (status = 400, description = "Doctor is referenced by bookings", body = ErrorResponse),
        (status = 404, description = "Doctor not found", body = ErrorResponse),
    )
)]
pub async fn delete_doctor(
    State(state): State<AppState>,
    Path(id): Path<DoctorId>,
) -> Result<impl IntoResponse, OpsError> {
    state.directory_service.delete_doctor(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /patients`: Register a patient.
///
/// # Errors
///
/// Returns [`OpsError`] on validation failure or an unknown department.
#[utoipa::path(
    post,
    path = "/api/v1/patients",
    tag = "Directory",
    summary = "Register patient",
    request_body = CreatePatientRequest,
    responses(
        (status = 201, description = "Patient registered", body = Patient),
        (status = 400, description = "Blank name or implausible age", body = ErrorResponse),
        (status = 404, description = "Department not found", body = ErrorResponse),
    )
)]
pub async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<CreatePatientRequest>,
) -> Result<impl IntoResponse, OpsError> {
    let patient = state
        .directory_service
        .create_patient(req.into(), Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `GET /patients`: List patients.
///
/// # Errors
///
/// Returns [`OpsError`] on storage failures.
#[utoipa::path(
    get,
    path = "/api/v1/patients",
    tag = "Directory",
    summary = "List patients",
    description = "Returns a paginated list of patients, newest first.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated patient list", body = PatientListResponse),
    )
)]
pub async fn list_patients(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, OpsError> {
    let patients = state.directory_service.list_patients().await?;
    let (data, pagination) = params.paginate(patients, |p| p);
    Ok(Json(PatientListResponse { data, pagination }))
}

/// `GET /patients/{id}`: Get a patient.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`] if the patient does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/patients/{id}",
    tag = "Directory",
    summary = "Get patient",
    params(
        ("id" = uuid::Uuid, Path, description = "Patient UUID"),
    ),
    responses(
        (status = 200, description = "Patient", body = Patient),
        (status = 404, description = "Patient not found", body = ErrorResponse),
    )
)]
pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<PatientId>,
) -> Result<impl IntoResponse, OpsError> {
    Ok(Json(state.directory_service.get_patient(id).await?))
}

/// `PATCH /patients/{id}`: Update a patient.
///
/// # Errors
///
/// Returns [`OpsError`] on validation failure or an unknown patient or
/// department.
#[utoipa::path(
    patch,
    path = "/api/v1/patients/{id}",
    tag = "Directory",
    summary = "Update patient",
    description = "Updates name, age, condition or department. A condition mentioning emergency, critical or urgent puts the patient on the emergency queue.",
    params(
        ("id" = uuid::Uuid, Path, description = "Patient UUID"),
    ),
    request_body = UpdatePatientRequest,
    responses(
        (status = 200, description = "Updated patient", body = Patient),
        (status = 400, description = "Invalid update", body = ErrorResponse),
        (status = 404, description = "Patient or department not found", body = ErrorResponse),
    )
)]
pub async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<PatientId>,
    Json(req): Json<UpdatePatientRequest>,
) -> Result<impl IntoResponse, OpsError> {
    Ok(Json(
        state
            .directory_service
            .update_patient(id, req.into(), Utc::now())
            .await?,
    ))
}

/// `DELETE /patients/{id}`: Delete a patient and their tokens.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`] if the patient does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/patients/{id}",
    tag = "Directory",
    summary = "Delete patient",
    params(
        ("id" = uuid::Uuid, Path, description = "Patient UUID"),
    ),
    responses(
        (status = 204, description = "Patient deleted"),
        (status = 404, description = "Patient not found", body = ErrorResponse),
    )
)]
pub async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<PatientId>,
) -> Result<impl IntoResponse, OpsError> {
    state.directory_service.delete_patient(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Directory routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/departments", post(create_department).get(list_departments))
        .route(
            "/departments/{id}",
            get(get_department).delete(delete_department),
        )
        .route("/doctors", post(create_doctor).get(list_doctors))
        .route("/doctors/{id}", get(get_doctor).delete(delete_doctor))
        .route("/patients", post(create_patient).get(list_patients))
        .route(
            "/patients/{id}",
            get(get_patient).patch(update_patient).delete(delete_patient),
        )
}
