//! Persistence layer: the [`HospitalStore`] seam and its two backends.
//!
//! [`postgres::PostgresStore`] is the production store (`sqlx::PgPool`,
//! migrations under `migrations/`). [`memory::MemoryStore`] keeps every
//! table behind one `tokio::sync::RwLock` and is selected with
//! `PERSISTENCE_ENABLED=false` and by the integration tests.
//!
//! Operations that check and then write (booking admission, token
//! numbering, status compare-and-set) are atomic inside each store so
//! concurrent requests cannot both pass the check.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    AlertId, AlertStatus, Booking, BookingId, BookingStatus, Department, DepartmentId, Doctor,
    DoctorId, EmergencyAlert, Patient, PatientId, Theater, TheaterId, TheaterStatus, TimeRange,
    Token, TokenId, TokenPriority, TokenStatus,
};
use crate::error::OpsError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Store handle shared by the services.
pub type SharedStore = Arc<dyn HospitalStore>;

/// Surgeon requested for a booking.
#[derive(Debug, Clone, Default)]
pub struct SurgeonRequest {
    /// Existing doctor, if the caller knows one.
    pub id: Option<DoctorId>,
    /// Name to find or register when `id` is absent or unknown.
    pub name: Option<String>,
}

/// Input for [`TheaterStore::create_booking`].
#[derive(Debug, Clone)]
pub struct NewBooking {
    /// Target theater.
    pub theater_id: TheaterId,
    /// Linked patient record.
    pub patient_id: Option<PatientId>,
    /// Patient name for the board.
    pub patient_name: String,
    /// Procedure description.
    pub procedure: String,
    /// Surgeon selection.
    pub surgeon: SurgeonRequest,
    /// Requested interval.
    pub range: TimeRange,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for [`TokenStore::issue_token`].
#[derive(Debug, Clone, Copy)]
pub struct NewToken {
    /// Ticket holder.
    pub patient_id: PatientId,
    /// Issuing department.
    pub department_id: DepartmentId,
    /// Requested priority.
    pub priority: TokenPriority,
    /// Minutes budgeted per waiting token for the estimate.
    pub minutes_per_token: u32,
    /// Issue timestamp.
    pub created_at: DateTime<Utc>,
}

/// Theaters and surgery bookings.
#[async_trait]
pub trait TheaterStore: Send + Sync {
    /// Inserts a theater.
    ///
    /// # Errors
    ///
    /// [`OpsError::Duplicate`] if the code is taken.
    async fn insert_theater(&self, theater: Theater) -> Result<Theater, OpsError>;

    /// Fetches a theater.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    async fn get_theater(&self, id: TheaterId) -> Result<Theater, OpsError>;

    /// Lists theaters ordered by code.
    ///
    /// # Errors
    ///
    /// Storage failures.
    async fn list_theaters(&self) -> Result<Vec<Theater>, OpsError>;

    /// Persists name, status and `status_until` of an existing theater.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    async fn update_theater(&self, theater: Theater) -> Result<Theater, OpsError>;

    /// Sets the lifecycle label.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if the theater does not exist.
    async fn set_theater_status(
        &self,
        id: TheaterId,
        status: TheaterStatus,
        until: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    ) -> Result<Theater, OpsError>;

    /// Deletes a theater and its bookings.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    async fn delete_theater(&self, id: TheaterId) -> Result<(), OpsError>;

    /// Admits and inserts a booking atomically: locks the theater, runs
    /// [`crate::domain::schedule::admit_booking`] against its active
    /// bookings, resolves the surgeon, inserts, and moves an available
    /// theater to `Scheduled`.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`], [`OpsError::TheaterUnavailable`] or
    /// [`OpsError::BookingConflict`].
    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, OpsError>;

    /// Fetches a booking.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    async fn get_booking(&self, id: BookingId) -> Result<Booking, OpsError>;

    /// Lists a theater's bookings by start time.
    ///
    /// # Errors
    ///
    /// Storage failures.
    async fn list_bookings(
        &self,
        theater_id: TheaterId,
        active_only: bool,
    ) -> Result<Vec<Booking>, OpsError>;

    /// Lists active bookings across all theaters.
    ///
    /// # Errors
    ///
    /// Storage failures.
    async fn list_active_bookings(&self) -> Result<Vec<Booking>, OpsError>;

    /// Moves a booking from `expected` to `next`; fails if it moved first.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] or [`OpsError::InvalidTransition`].
    async fn transition_booking(
        &self,
        id: BookingId,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Booking, OpsError>;
}

/// Departments, doctors and patients.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Inserts a department.
    ///
    /// # Errors
    ///
    /// [`OpsError::Duplicate`] if the name is taken.
    async fn insert_department(&self, department: Department) -> Result<Department, OpsError>;

    /// Fetches a department.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    async fn get_department(&self, id: DepartmentId) -> Result<Department, OpsError>;

    /// Lists departments by name.
    ///
    /// # Errors
    ///
    /// Storage failures.
    async fn list_departments(&self) -> Result<Vec<Department>, OpsError>;

    /// Deletes a department and its tokens.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    async fn delete_department(&self, id: DepartmentId) -> Result<(), OpsError>;

    /// Inserts a doctor.
    ///
    /// # Errors
    ///
    /// Storage failures.
    async fn insert_doctor(&self, doctor: Doctor) -> Result<Doctor, OpsError>;

    /// Fetches a doctor.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    async fn get_doctor(&self, id: DoctorId) -> Result<Doctor, OpsError>;

    /// Lists doctors by name.
    ///
    /// # Errors
    ///
    /// Storage failures.
    async fn list_doctors(&self) -> Result<Vec<Doctor>, OpsError>;

    /// Deletes a doctor.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist, or
    /// [`OpsError::InvalidRequest`] while bookings reference the doctor.
    async fn delete_doctor(&self, id: DoctorId) -> Result<(), OpsError>;

    /// Inserts a patient.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if the department does not exist.
    async fn insert_patient(&self, patient: Patient) -> Result<Patient, OpsError>;

    /// Fetches a patient.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    async fn get_patient(&self, id: PatientId) -> Result<Patient, OpsError>;

    /// Lists patients, newest first.
    ///
    /// # Errors
    ///
    /// Storage failures.
    async fn list_patients(&self) -> Result<Vec<Patient>, OpsError>;

    /// Lists patients whose condition carries an emergency keyword, most
    /// recently updated first.
    ///
    /// # Errors
    ///
    /// Storage failures.
    async fn list_flagged_patients(&self) -> Result<Vec<Patient>, OpsError>;

    /// Persists name, age, condition and department of a patient.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if the patient or department does not exist.
    async fn update_patient(&self, patient: Patient) -> Result<Patient, OpsError>;

    /// Deletes a patient and their tokens.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    async fn delete_patient(&self, id: PatientId) -> Result<(), OpsError>;
}

/// Emergency alerts.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Inserts an alert.
    ///
    /// # Errors
    ///
    /// Storage failures.
    async fn insert_alert(&self, alert: EmergencyAlert) -> Result<EmergencyAlert, OpsError>;

    /// Fetches an alert.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    async fn get_alert(&self, id: AlertId) -> Result<EmergencyAlert, OpsError>;

    /// Lists alerts by priority then age, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Storage failures.
    async fn list_alerts(&self, status: Option<AlertStatus>)
    -> Result<Vec<EmergencyAlert>, OpsError>;

    /// Marks an active alert resolved.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`], or [`OpsError::InvalidTransition`] if it was
    /// already resolved.
    async fn resolve_alert(
        &self,
        id: AlertId,
        at: DateTime<Utc>,
    ) -> Result<EmergencyAlert, OpsError>;
}

/// Department token queues.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Issues the department's next number atomically and stores the
    /// token with its wait estimate.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if the patient or department does not exist.
    async fn issue_token(&self, token: NewToken) -> Result<Token, OpsError>;

    /// Fetches a token.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    async fn get_token(&self, id: TokenId) -> Result<Token, OpsError>;

    /// Lists a department's tokens whose status is in `statuses`, unordered.
    ///
    /// # Errors
    ///
    /// Storage failures.
    async fn list_tokens(
        &self,
        department_id: DepartmentId,
        statuses: &[TokenStatus],
    ) -> Result<Vec<Token>, OpsError>;

    /// Moves a token from `expected` to `next`; fails if it moved first.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] or [`OpsError::InvalidTransition`].
    async fn transition_token(
        &self,
        id: TokenId,
        expected: TokenStatus,
        next: TokenStatus,
        at: DateTime<Utc>,
    ) -> Result<Token, OpsError>;
}

/// Everything the services need from storage.
#[async_trait]
pub trait HospitalStore: TheaterStore + DirectoryStore + AlertStore + TokenStore + Debug {
    /// Short backend name for the health endpoint.
    fn backend(&self) -> &'static str;

    /// Verifies the store is reachable.
    ///
    /// # Errors
    ///
    /// [`OpsError::PersistenceError`] when it is not.
    async fn health_check(&self) -> Result<(), OpsError>;
}
