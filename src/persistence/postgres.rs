//! PostgreSQL implementation of the persistence layer.
//!
//! Booking admission and token issue run inside a transaction. The
//! theater row is locked with `SELECT … FOR UPDATE` while the calendar is
//! checked, and the `bookings_no_overlap` exclusion constraint rejects any
//! overlap that slips past it. Status updates are compare-and-set on the
//! expected prior status.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::models::{
    AlertRow, BookingRow, DepartmentRow, DoctorRow, PatientRow, TheaterRow, TokenRow,
};
use super::{
    AlertStore, DirectoryStore, HospitalStore, NewBooking, NewToken, SurgeonRequest,
    TheaterStore, TokenStore,
};
use crate::domain::directory::EMERGENCY_KEYWORDS;
use crate::domain::schedule::{self, FALLBACK_SURGEON_SPECIALIZATION};
use crate::domain::token::{estimate_wait_minutes, waiting_ahead};
use crate::domain::{
    AlertId, AlertStatus, Booking, BookingId, BookingStatus, Department, DepartmentId, Doctor,
    DoctorId, EmergencyAlert, Patient, PatientId, Theater, TheaterId, TheaterStatus, Token,
    TokenId, TokenStatus,
};
use crate::error::OpsError;

const THEATER_COLUMNS: &str = "id, code, name, status, status_until, created_at, updated_at";

const BOOKING_COLUMNS: &str = "id, theater_id, patient_id, patient_name, procedure, \
    surgeon_id, surgeon_name, start_time, end_time, status, notes, created_at";

const DEPARTMENT_COLUMNS: &str = "id, name, description, created_at";

const DOCTOR_COLUMNS: &str = "id, name, specialization, created_at";

const PATIENT_COLUMNS: &str = "id, name, age, condition, department_id, created_at, updated_at";

const ALERT_COLUMNS: &str = "id, code, location, message, priority, status, target_roles, \
    created_at, resolved_at";

const TOKEN_COLUMNS: &str = "id, number, patient_id, department_id, priority, status, \
    estimated_wait_minutes, created_at, updated_at";

/// Maps a sqlx error onto the service error, translating the constraint
/// violations callers can act on.
fn map_db_err(err: sqlx::Error) -> OpsError {
    if let sqlx::Error::Database(db) = &err {
        let message = db.message().to_string();
        match db.code().as_deref() {
            Some("23505") => return OpsError::Duplicate(message),
            Some("23P01") => return OpsError::BookingConflict(message),
            Some("23503") => return OpsError::InvalidRequest(message),
            _ => {}
        }
    }
    OpsError::PersistenceError(err.to_string())
}

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), OpsError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| OpsError::PersistenceError(e.to_string()))
    }

    /// Reads the current status text of a row, for compare-and-set misses.
    async fn current_status(&self, table: &str, id: Uuid) -> Result<Option<String>, OpsError> {
        let query = format!("SELECT status FROM {table} WHERE id = $1");
        sqlx::query_scalar::<_, String>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)
    }
}

async fn patient_exists(conn: &mut PgConnection, id: PatientId) -> Result<bool, OpsError> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM patients WHERE id = $1)")
        .bind(*id.as_uuid())
        .fetch_one(conn)
        .await
        .map_err(map_db_err)
}

async fn resolve_surgeon(
    conn: &mut PgConnection,
    request: &SurgeonRequest,
    now: DateTime<Utc>,
) -> Result<Doctor, OpsError> {
    if let Some(id) = request.id {
        let query = format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = $1");
        let row = sqlx::query_as::<_, DoctorRow>(&query)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *conn)
            .await
            .map_err(map_db_err)?;
        if let Some(row) = row {
            return Ok(row.into());
        }
    }

    let name = schedule::surgeon_lookup_name(request.name.as_deref());
    let query = format!(
        "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE lower(name) = lower($1) \
         ORDER BY created_at LIMIT 1"
    );
    let row = sqlx::query_as::<_, DoctorRow>(&query)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_db_err)?;
    if let Some(row) = row {
        return Ok(row.into());
    }

    let query = format!(
        "INSERT INTO doctors (id, name, specialization, created_at) VALUES ($1, $2, $3, $4) \
         RETURNING {DOCTOR_COLUMNS}"
    );
    let row = sqlx::query_as::<_, DoctorRow>(&query)
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(FALLBACK_SURGEON_SPECIALIZATION)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
        .map_err(map_db_err)?;
    tracing::info!(doctor_id = %row.id, name = %row.name, "registered surgeon");
    Ok(row.into())
}

#[async_trait]
impl TheaterStore for PostgresStore {
    async fn insert_theater(&self, theater: Theater) -> Result<Theater, OpsError> {
        let query = format!(
            "INSERT INTO theaters (id, code, name, status, status_until, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {THEATER_COLUMNS}"
        );
        sqlx::query_as::<_, TheaterRow>(&query)
            .bind(*theater.id.as_uuid())
            .bind(&theater.code)
            .bind(&theater.name)
            .bind(theater.status.as_str())
            .bind(theater.status_until)
            .bind(theater.created_at)
            .bind(theater.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?
            .try_into()
    }

    async fn get_theater(&self, id: TheaterId) -> Result<Theater, OpsError> {
        let query = format!("SELECT {THEATER_COLUMNS} FROM theaters WHERE id = $1");
        sqlx::query_as::<_, TheaterRow>(&query)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| OpsError::not_found("theater", id))?
            .try_into()
    }

    async fn list_theaters(&self) -> Result<Vec<Theater>, OpsError> {
        let query = format!("SELECT {THEATER_COLUMNS} FROM theaters ORDER BY code");
        sqlx::query_as::<_, TheaterRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(Theater::try_from)
            .collect()
    }

    async fn update_theater(&self, theater: Theater) -> Result<Theater, OpsError> {
        let query = format!(
            "UPDATE theaters SET name = $2, status = $3, status_until = $4, updated_at = $5 \
             WHERE id = $1 RETURNING {THEATER_COLUMNS}"
        );
        sqlx::query_as::<_, TheaterRow>(&query)
            .bind(*theater.id.as_uuid())
            .bind(&theater.name)
            .bind(theater.status.as_str())
            .bind(theater.status_until)
            .bind(theater.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| OpsError::not_found("theater", theater.id))?
            .try_into()
    }

    async fn set_theater_status(
        &self,
        id: TheaterId,
        status: TheaterStatus,
        until: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    ) -> Result<Theater, OpsError> {
        let query = format!(
            "UPDATE theaters SET status = $2, status_until = $3, updated_at = $4 \
             WHERE id = $1 RETURNING {THEATER_COLUMNS}"
        );
        sqlx::query_as::<_, TheaterRow>(&query)
            .bind(*id.as_uuid())
            .bind(status.as_str())
            .bind(until)
            .bind(at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| OpsError::not_found("theater", id))?
            .try_into()
    }

    async fn delete_theater(&self, id: TheaterId) -> Result<(), OpsError> {
        let result = sqlx::query("DELETE FROM theaters WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(OpsError::not_found("theater", id));
        }
        Ok(())
    }

    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, OpsError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let query = format!("SELECT {THEATER_COLUMNS} FROM theaters WHERE id = $1 FOR UPDATE");
        let theater: Theater = sqlx::query_as::<_, TheaterRow>(&query)
            .bind(*booking.theater_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| OpsError::not_found("theater", booking.theater_id))?
            .try_into()?;

        let query = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE theater_id = $1 AND status IN ('scheduled', 'in_progress')"
        );
        let active = sqlx::query_as::<_, BookingRow>(&query)
            .bind(*theater.id.as_uuid())
            .fetch_all(&mut *tx)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(Booking::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        schedule::admit_booking(&theater, &active, &booking.range)?;

        if let Some(patient_id) = booking.patient_id
            && !patient_exists(&mut tx, patient_id).await?
        {
            return Err(OpsError::not_found("patient", patient_id));
        }

        let surgeon = resolve_surgeon(&mut tx, &booking.surgeon, booking.created_at).await?;

        let query = format!(
            "INSERT INTO bookings (id, theater_id, patient_id, patient_name, procedure, \
             surgeon_id, surgeon_name, start_time, end_time, status, notes, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {BOOKING_COLUMNS}"
        );
        let stored: Booking = sqlx::query_as::<_, BookingRow>(&query)
            .bind(Uuid::new_v4())
            .bind(*theater.id.as_uuid())
            .bind(booking.patient_id.map(Uuid::from))
            .bind(&booking.patient_name)
            .bind(&booking.procedure)
            .bind(*surgeon.id.as_uuid())
            .bind(&surgeon.name)
            .bind(booking.range.start)
            .bind(booking.range.end)
            .bind(BookingStatus::Scheduled.as_str())
            .bind(&booking.notes)
            .bind(booking.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_err)?
            .try_into()?;

        sqlx::query(
            "UPDATE theaters SET status = 'scheduled', updated_at = $2 \
             WHERE id = $1 AND status = 'available'",
        )
        .bind(*theater.id.as_uuid())
        .bind(booking.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;
        Ok(stored)
    }

    async fn get_booking(&self, id: BookingId) -> Result<Booking, OpsError> {
        let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        sqlx::query_as::<_, BookingRow>(&query)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| OpsError::not_found("booking", id))?
            .try_into()
    }

    async fn list_bookings(
        &self,
        theater_id: TheaterId,
        active_only: bool,
    ) -> Result<Vec<Booking>, OpsError> {
        let query = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE theater_id = $1 \
             AND (NOT $2 OR status IN ('scheduled', 'in_progress')) ORDER BY start_time"
        );
        sqlx::query_as::<_, BookingRow>(&query)
            .bind(*theater_id.as_uuid())
            .bind(active_only)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }

    async fn list_active_bookings(&self) -> Result<Vec<Booking>, OpsError> {
        let query = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE status IN ('scheduled', 'in_progress') ORDER BY start_time"
        );
        sqlx::query_as::<_, BookingRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }

    async fn transition_booking(
        &self,
        id: BookingId,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Booking, OpsError> {
        let query = format!(
            "UPDATE bookings SET status = $3 WHERE id = $1 AND status = $2 \
             RETURNING {BOOKING_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookingRow>(&query)
            .bind(*id.as_uuid())
            .bind(expected.as_str())
            .bind(next.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        match row {
            Some(row) => row.try_into(),
            None => match self.current_status("bookings", *id.as_uuid()).await? {
                Some(current) => Err(OpsError::transition(current, next)),
                None => Err(OpsError::not_found("booking", id)),
            },
        }
    }
}

#[async_trait]
impl DirectoryStore for PostgresStore {
    async fn insert_department(&self, department: Department) -> Result<Department, OpsError> {
        let query = format!(
            "INSERT INTO departments (id, name, description, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING {DEPARTMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DepartmentRow>(&query)
            .bind(*department.id.as_uuid())
            .bind(&department.name)
            .bind(&department.description)
            .bind(department.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(row.into())
    }

    async fn get_department(&self, id: DepartmentId) -> Result<Department, OpsError> {
        let query = format!("SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE id = $1");
        sqlx::query_as::<_, DepartmentRow>(&query)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .map(Department::from)
            .ok_or_else(|| OpsError::not_found("department", id))
    }

    async fn list_departments(&self) -> Result<Vec<Department>, OpsError> {
        let query = format!("SELECT {DEPARTMENT_COLUMNS} FROM departments ORDER BY name");
        let rows = sqlx::query_as::<_, DepartmentRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Department::from).collect())
    }

    async fn delete_department(&self, id: DepartmentId) -> Result<(), OpsError> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(OpsError::not_found("department", id));
        }
        Ok(())
    }

    async fn insert_doctor(&self, doctor: Doctor) -> Result<Doctor, OpsError> {
        let query = format!(
            "INSERT INTO doctors (id, name, specialization, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING {DOCTOR_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DoctorRow>(&query)
            .bind(*doctor.id.as_uuid())
            .bind(&doctor.name)
            .bind(&doctor.specialization)
            .bind(doctor.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(row.into())
    }

    async fn get_doctor(&self, id: DoctorId) -> Result<Doctor, OpsError> {
        let query = format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = $1");
        sqlx::query_as::<_, DoctorRow>(&query)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .map(Doctor::from)
            .ok_or_else(|| OpsError::not_found("doctor", id))
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, OpsError> {
        let query = format!("SELECT {DOCTOR_COLUMNS} FROM doctors ORDER BY name");
        let rows = sqlx::query_as::<_, DoctorRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Doctor::from).collect())
    }

    async fn delete_doctor(&self, id: DoctorId) -> Result<(), OpsError> {
        let result = sqlx::query("DELETE FROM doctors WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(OpsError::not_found("doctor", id));
        }
        Ok(())
    }

    async fn insert_patient(&self, patient: Patient) -> Result<Patient, OpsError> {
        let query = format!(
            "INSERT INTO patients (id, name, age, condition, department_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {PATIENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PatientRow>(&query)
            .bind(*patient.id.as_uuid())
            .bind(&patient.name)
            .bind(patient.age)
            .bind(&patient.condition)
            .bind(patient.department_id.map(Uuid::from))
            .bind(patient.created_at)
            .bind(patient.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(row.into())
    }

    async fn get_patient(&self, id: PatientId) -> Result<Patient, OpsError> {
        let query = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1");
        sqlx::query_as::<_, PatientRow>(&query)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .map(Patient::from)
            .ok_or_else(|| OpsError::not_found("patient", id))
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, OpsError> {
        let query = format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, PatientRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Patient::from).collect())
    }

    async fn list_flagged_patients(&self) -> Result<Vec<Patient>, OpsError> {
        let patterns: Vec<String> = EMERGENCY_KEYWORDS
            .iter()
            .map(|keyword| format!("%{keyword}%"))
            .collect();
        let query = format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE condition ILIKE ANY($1) \
             ORDER BY updated_at DESC"
        );
        let rows = sqlx::query_as::<_, PatientRow>(&query)
            .bind(patterns)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Patient::from).collect())
    }

    async fn update_patient(&self, patient: Patient) -> Result<Patient, OpsError> {
        let query = format!(
            "UPDATE patients SET name = $2, age = $3, condition = $4, department_id = $5, \
             updated_at = $6 WHERE id = $1 RETURNING {PATIENT_COLUMNS}"
        );
        sqlx::query_as::<_, PatientRow>(&query)
            .bind(*patient.id.as_uuid())
            .bind(&patient.name)
            .bind(patient.age)
            .bind(&patient.condition)
            .bind(patient.department_id.map(Uuid::from))
            .bind(patient.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .map(Patient::from)
            .ok_or_else(|| OpsError::not_found("patient", patient.id))
    }

    async fn delete_patient(&self, id: PatientId) -> Result<(), OpsError> {
        let result = sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(OpsError::not_found("patient", id));
        }
        Ok(())
    }
}

#[async_trait]
impl AlertStore for PostgresStore {
    async fn insert_alert(&self, alert: EmergencyAlert) -> Result<EmergencyAlert, OpsError> {
        let roles: Vec<String> = alert
            .target_roles
            .iter()
            .map(|role| role.as_str().to_string())
            .collect();
        let query = format!(
            "INSERT INTO emergency_alerts (id, code, location, message, priority, status, \
             target_roles, created_at, resolved_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {ALERT_COLUMNS}"
        );
        sqlx::query_as::<_, AlertRow>(&query)
            .bind(*alert.id.as_uuid())
            .bind(alert.code.as_str())
            .bind(&alert.location)
            .bind(&alert.message)
            .bind(i16::from(alert.priority))
            .bind(alert.status.as_str())
            .bind(roles)
            .bind(alert.created_at)
            .bind(alert.resolved_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?
            .try_into()
    }

    async fn get_alert(&self, id: AlertId) -> Result<EmergencyAlert, OpsError> {
        let query = format!("SELECT {ALERT_COLUMNS} FROM emergency_alerts WHERE id = $1");
        sqlx::query_as::<_, AlertRow>(&query)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| OpsError::not_found("alert", id))?
            .try_into()
    }

    async fn list_alerts(
        &self,
        status: Option<AlertStatus>,
    ) -> Result<Vec<EmergencyAlert>, OpsError> {
        let query = format!(
            "SELECT {ALERT_COLUMNS} FROM emergency_alerts \
             WHERE ($1::text IS NULL OR status = $1) ORDER BY priority, created_at"
        );
        sqlx::query_as::<_, AlertRow>(&query)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(EmergencyAlert::try_from)
            .collect()
    }

    async fn resolve_alert(
        &self,
        id: AlertId,
        at: DateTime<Utc>,
    ) -> Result<EmergencyAlert, OpsError> {
        let query = format!(
            "UPDATE emergency_alerts SET status = 'resolved', resolved_at = $2 \
             WHERE id = $1 AND status = 'active' RETURNING {ALERT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AlertRow>(&query)
            .bind(*id.as_uuid())
            .bind(at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        match row {
            Some(row) => row.try_into(),
            None => match self.current_status("emergency_alerts", *id.as_uuid()).await? {
                Some(current) => Err(OpsError::transition(current, AlertStatus::Resolved)),
                None => Err(OpsError::not_found("alert", id)),
            },
        }
    }
}

#[async_trait]
impl TokenStore for PostgresStore {
    async fn issue_token(&self, token: NewToken) -> Result<Token, OpsError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        if !patient_exists(&mut tx, token.patient_id).await? {
            return Err(OpsError::not_found("patient", token.patient_id));
        }

        let number = sqlx::query_scalar::<_, i32>(
            "UPDATE departments SET token_counter = token_counter + 1 \
             WHERE id = $1 RETURNING token_counter",
        )
        .bind(*token.department_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| OpsError::not_found("department", token.department_id))?;

        let query = format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens WHERE department_id = $1 AND status = 'waiting'"
        );
        let waiting = sqlx::query_as::<_, TokenRow>(&query)
            .bind(*token.department_id.as_uuid())
            .fetch_all(&mut *tx)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(Token::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let ahead = waiting_ahead(&waiting, token.priority);

        let query = format!(
            "INSERT INTO tokens (id, number, patient_id, department_id, priority, status, \
             estimated_wait_minutes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) RETURNING {TOKEN_COLUMNS}"
        );
        let stored: Token = sqlx::query_as::<_, TokenRow>(&query)
            .bind(Uuid::new_v4())
            .bind(number)
            .bind(*token.patient_id.as_uuid())
            .bind(*token.department_id.as_uuid())
            .bind(token.priority.as_str())
            .bind(TokenStatus::Waiting.as_str())
            .bind(estimate_wait_minutes(ahead, token.minutes_per_token))
            .bind(token.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_err)?
            .try_into()?;

        tx.commit().await.map_err(map_db_err)?;
        Ok(stored)
    }

    async fn get_token(&self, id: TokenId) -> Result<Token, OpsError> {
        let query = format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE id = $1");
        sqlx::query_as::<_, TokenRow>(&query)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| OpsError::not_found("token", id))?
            .try_into()
    }

    async fn list_tokens(
        &self,
        department_id: DepartmentId,
        statuses: &[TokenStatus],
    ) -> Result<Vec<Token>, OpsError> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        let query = format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens WHERE department_id = $1 AND status = ANY($2)"
        );
        sqlx::query_as::<_, TokenRow>(&query)
            .bind(*department_id.as_uuid())
            .bind(statuses)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(Token::try_from)
            .collect()
    }

    async fn transition_token(
        &self,
        id: TokenId,
        expected: TokenStatus,
        next: TokenStatus,
        at: DateTime<Utc>,
    ) -> Result<Token, OpsError> {
        let query = format!(
            "UPDATE tokens SET status = $3, updated_at = $4 WHERE id = $1 AND status = $2 \
             RETURNING {TOKEN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TokenRow>(&query)
            .bind(*id.as_uuid())
            .bind(expected.as_str())
            .bind(next.as_str())
            .bind(at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        match row {
            Some(row) => row.try_into(),
            None => match self.current_status("tokens", *id.as_uuid()).await? {
                Some(current) => Err(OpsError::transition(current, next)),
                None => Err(OpsError::not_found("token", id)),
            },
        }
    }
}

#[async_trait]
impl HospitalStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> Result<(), OpsError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
            .map_err(map_db_err)
    }
}
