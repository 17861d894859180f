//! In-memory store.
//!
//! [`MemoryStore`] keeps every table in a `HashMap` behind a single
//! [`tokio::sync::RwLock`]. Holding the write lock for the whole of an
//! operation makes check-and-insert (booking admission, token numbering)
//! and compare-and-set updates atomic without per-row locks.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{
    AlertStore, DirectoryStore, HospitalStore, NewBooking, NewToken, SurgeonRequest,
    TheaterStore, TokenStore,
};
use crate::domain::schedule::{self, FALLBACK_SURGEON_SPECIALIZATION};
use crate::domain::token::{estimate_wait_minutes, waiting_ahead};
use crate::domain::{
    AlertId, AlertStatus, Booking, BookingId, BookingStatus, Department, DepartmentId, Doctor,
    DoctorId, EmergencyAlert, Patient, PatientId, Theater, TheaterId, TheaterStatus, Token,
    TokenId, TokenStatus,
};
use crate::error::OpsError;

#[derive(Debug, Default)]
struct Tables {
    theaters: HashMap<TheaterId, Theater>,
    bookings: HashMap<BookingId, Booking>,
    departments: HashMap<DepartmentId, Department>,
    token_counters: HashMap<DepartmentId, i32>,
    doctors: HashMap<DoctorId, Doctor>,
    patients: HashMap<PatientId, Patient>,
    alerts: HashMap<AlertId, EmergencyAlert>,
    tokens: HashMap<TokenId, Token>,
}

impl Tables {
    fn theater(&self, id: TheaterId) -> Result<&Theater, OpsError> {
        self.theaters
            .get(&id)
            .ok_or_else(|| OpsError::not_found("theater", id))
    }

    fn active_bookings_of(&self, theater_id: TheaterId) -> Vec<Booking> {
        self.bookings
            .values()
            .filter(|b| b.theater_id == theater_id && b.is_active())
            .cloned()
            .collect()
    }

    fn check_department(&self, id: Option<DepartmentId>) -> Result<(), OpsError> {
        match id {
            Some(id) if !self.departments.contains_key(&id) => {
                Err(OpsError::not_found("department", id))
            }
            _ => Ok(()),
        }
    }

    fn resolve_surgeon(&mut self, request: &SurgeonRequest, now: DateTime<Utc>) -> Doctor {
        if let Some(id) = request.id
            && let Some(doctor) = self.doctors.get(&id)
        {
            return doctor.clone();
        }
        let name = schedule::surgeon_lookup_name(request.name.as_deref());
        if let Some(doctor) = self
            .doctors
            .values()
            .find(|d| d.name.to_lowercase() == name.to_lowercase())
        {
            return doctor.clone();
        }
        let doctor = Doctor {
            id: DoctorId::new(),
            name: name.to_string(),
            specialization: FALLBACK_SURGEON_SPECIALIZATION.to_string(),
            created_at: now,
        };
        tracing::info!(doctor_id = %doctor.id, name = %doctor.name, "registered surgeon");
        self.doctors.insert(doctor.id, doctor.clone());
        doctor
    }
}

/// Store backed by process memory; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TheaterStore for MemoryStore {
    async fn insert_theater(&self, theater: Theater) -> Result<Theater, OpsError> {
        let mut tables = self.tables.write().await;
        if tables.theaters.values().any(|t| t.code == theater.code) {
            return Err(OpsError::Duplicate(format!(
                "theater code {} already exists",
                theater.code
            )));
        }
        tables.theaters.insert(theater.id, theater.clone());
        Ok(theater)
    }

    async fn get_theater(&self, id: TheaterId) -> Result<Theater, OpsError> {
        self.tables.read().await.theater(id).cloned()
    }

    async fn list_theaters(&self) -> Result<Vec<Theater>, OpsError> {
        let tables = self.tables.read().await;
        let mut theaters: Vec<Theater> = tables.theaters.values().cloned().collect();
        theaters.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(theaters)
    }

    async fn update_theater(&self, theater: Theater) -> Result<Theater, OpsError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .theaters
            .get_mut(&theater.id)
            .ok_or_else(|| OpsError::not_found("theater", theater.id))?;
        stored.name.clone_from(&theater.name);
        stored.status = theater.status;
        stored.status_until = theater.status_until;
        stored.updated_at = theater.updated_at;
        Ok(stored.clone())
    }

    async fn set_theater_status(
        &self,
        id: TheaterId,
        status: TheaterStatus,
        until: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    ) -> Result<Theater, OpsError> {
        let mut tables = self.tables.write().await;
        let theater = tables
            .theaters
            .get_mut(&id)
            .ok_or_else(|| OpsError::not_found("theater", id))?;
        theater.status = status;
        theater.status_until = until;
        theater.updated_at = at;
        Ok(theater.clone())
    }

    async fn delete_theater(&self, id: TheaterId) -> Result<(), OpsError> {
        let mut tables = self.tables.write().await;
        tables
            .theaters
            .remove(&id)
            .ok_or_else(|| OpsError::not_found("theater", id))?;
        tables.bookings.retain(|_, b| b.theater_id != id);
        Ok(())
    }

    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, OpsError> {
        let mut tables = self.tables.write().await;
        let theater = tables.theater(booking.theater_id)?.clone();
        let active = tables.active_bookings_of(theater.id);
        schedule::admit_booking(&theater, &active, &booking.range)?;

        if let Some(patient_id) = booking.patient_id
            && !tables.patients.contains_key(&patient_id)
        {
            return Err(OpsError::not_found("patient", patient_id));
        }

        let surgeon = tables.resolve_surgeon(&booking.surgeon, booking.created_at);
        let stored = Booking {
            id: BookingId::new(),
            theater_id: theater.id,
            patient_id: booking.patient_id,
            patient_name: booking.patient_name,
            procedure: booking.procedure,
            surgeon_id: surgeon.id,
            surgeon_name: surgeon.name,
            start_time: booking.range.start,
            end_time: booking.range.end,
            status: BookingStatus::Scheduled,
            notes: booking.notes,
            created_at: booking.created_at,
        };
        tables.bookings.insert(stored.id, stored.clone());

        if let Some(theater) = tables.theaters.get_mut(&stored.theater_id)
            && theater.status == TheaterStatus::Available
        {
            theater.status = TheaterStatus::Scheduled;
            theater.updated_at = stored.created_at;
        }
        Ok(stored)
    }

    async fn get_booking(&self, id: BookingId) -> Result<Booking, OpsError> {
        self.tables
            .read()
            .await
            .bookings
            .get(&id)
            .cloned()
            .ok_or_else(|| OpsError::not_found("booking", id))
    }

    async fn list_bookings(
        &self,
        theater_id: TheaterId,
        active_only: bool,
    ) -> Result<Vec<Booking>, OpsError> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| b.theater_id == theater_id && (!active_only || b.is_active()))
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.start_time);
        Ok(bookings)
    }

    async fn list_active_bookings(&self) -> Result<Vec<Booking>, OpsError> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| b.is_active())
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.start_time);
        Ok(bookings)
    }

    async fn transition_booking(
        &self,
        id: BookingId,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Booking, OpsError> {
        let mut tables = self.tables.write().await;
        let booking = tables
            .bookings
            .get_mut(&id)
            .ok_or_else(|| OpsError::not_found("booking", id))?;
        if booking.status != expected {
            return Err(OpsError::transition(booking.status, next));
        }
        booking.status = next;
        Ok(booking.clone())
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn insert_department(&self, department: Department) -> Result<Department, OpsError> {
        let mut tables = self.tables.write().await;
        if tables.departments.values().any(|d| d.name == department.name) {
            return Err(OpsError::Duplicate(format!(
                "department {} already exists",
                department.name
            )));
        }
        tables.token_counters.insert(department.id, 0);
        tables.departments.insert(department.id, department.clone());
        Ok(department)
    }

    async fn get_department(&self, id: DepartmentId) -> Result<Department, OpsError> {
        self.tables
            .read()
            .await
            .departments
            .get(&id)
            .cloned()
            .ok_or_else(|| OpsError::not_found("department", id))
    }

    async fn list_departments(&self) -> Result<Vec<Department>, OpsError> {
        let tables = self.tables.read().await;
        let mut departments: Vec<Department> = tables.departments.values().cloned().collect();
        departments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(departments)
    }

    async fn delete_department(&self, id: DepartmentId) -> Result<(), OpsError> {
        let mut tables = self.tables.write().await;
        tables
            .departments
            .remove(&id)
            .ok_or_else(|| OpsError::not_found("department", id))?;
        tables.token_counters.remove(&id);
        tables.tokens.retain(|_, t| t.department_id != id);
        for patient in tables.patients.values_mut() {
            if patient.department_id == Some(id) {
                patient.department_id = None;
            }
        }
        Ok(())
    }

    async fn insert_doctor(&self, doctor: Doctor) -> Result<Doctor, OpsError> {
        let mut tables = self.tables.write().await;
        tables.doctors.insert(doctor.id, doctor.clone());
        Ok(doctor)
    }

    async fn get_doctor(&self, id: DoctorId) -> Result<Doctor, OpsError> {
        self.tables
            .read()
            .await
            .doctors
            .get(&id)
            .cloned()
            .ok_or_else(|| OpsError::not_found("doctor", id))
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, OpsError> {
        let tables = self.tables.read().await;
        let mut doctors: Vec<Doctor> = tables.doctors.values().cloned().collect();
        doctors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(doctors)
    }

    async fn delete_doctor(&self, id: DoctorId) -> Result<(), OpsError> {
        let mut tables = self.tables.write().await;
        if !tables.doctors.contains_key(&id) {
            return Err(OpsError::not_found("doctor", id));
        }
        if tables.bookings.values().any(|b| b.surgeon_id == id) {
            return Err(OpsError::InvalidRequest(format!(
                "doctor {id} is the surgeon on existing bookings"
            )));
        }
        tables.doctors.remove(&id);
        Ok(())
    }

    async fn insert_patient(&self, patient: Patient) -> Result<Patient, OpsError> {
        let mut tables = self.tables.write().await;
        tables.check_department(patient.department_id)?;
        tables.patients.insert(patient.id, patient.clone());
        Ok(patient)
    }

    async fn get_patient(&self, id: PatientId) -> Result<Patient, OpsError> {
        self.tables
            .read()
            .await
            .patients
            .get(&id)
            .cloned()
            .ok_or_else(|| OpsError::not_found("patient", id))
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, OpsError> {
        let tables = self.tables.read().await;
        let mut patients: Vec<Patient> = tables.patients.values().cloned().collect();
        patients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(patients)
    }

    async fn list_flagged_patients(&self) -> Result<Vec<Patient>, OpsError> {
        let tables = self.tables.read().await;
        let mut patients: Vec<Patient> = tables
            .patients
            .values()
            .filter(|p| p.is_emergency_flagged())
            .cloned()
            .collect();
        patients.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(patients)
    }

    async fn update_patient(&self, patient: Patient) -> Result<Patient, OpsError> {
        let mut tables = self.tables.write().await;
        tables.check_department(patient.department_id)?;
        let stored = tables
            .patients
            .get_mut(&patient.id)
            .ok_or_else(|| OpsError::not_found("patient", patient.id))?;
        stored.name.clone_from(&patient.name);
        stored.age = patient.age;
        stored.condition.clone_from(&patient.condition);
        stored.department_id = patient.department_id;
        stored.updated_at = patient.updated_at;
        Ok(stored.clone())
    }

    async fn delete_patient(&self, id: PatientId) -> Result<(), OpsError> {
        let mut tables = self.tables.write().await;
        tables
            .patients
            .remove(&id)
            .ok_or_else(|| OpsError::not_found("patient", id))?;
        tables.tokens.retain(|_, t| t.patient_id != id);
        for booking in tables.bookings.values_mut() {
            if booking.patient_id == Some(id) {
                booking.patient_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn insert_alert(&self, alert: EmergencyAlert) -> Result<EmergencyAlert, OpsError> {
        let mut tables = self.tables.write().await;
        tables.alerts.insert(alert.id, alert.clone());
        Ok(alert)
    }

    async fn get_alert(&self, id: AlertId) -> Result<EmergencyAlert, OpsError> {
        self.tables
            .read()
            .await
            .alerts
            .get(&id)
            .cloned()
            .ok_or_else(|| OpsError::not_found("alert", id))
    }

    async fn list_alerts(
        &self,
        status: Option<AlertStatus>,
    ) -> Result<Vec<EmergencyAlert>, OpsError> {
        let tables = self.tables.read().await;
        let mut alerts: Vec<EmergencyAlert> = tables
            .alerts
            .values()
            .filter(|a| status.is_none_or(|s| a.status == s))
            .cloned()
            .collect();
        alerts.sort_by_key(|a| (a.priority, a.created_at));
        Ok(alerts)
    }

    async fn resolve_alert(
        &self,
        id: AlertId,
        at: DateTime<Utc>,
    ) -> Result<EmergencyAlert, OpsError> {
        let mut tables = self.tables.write().await;
        let alert = tables
            .alerts
            .get_mut(&id)
            .ok_or_else(|| OpsError::not_found("alert", id))?;
        if alert.status != AlertStatus::Active {
            return Err(OpsError::transition(alert.status, AlertStatus::Resolved));
        }
        alert.status = AlertStatus::Resolved;
        alert.resolved_at = Some(at);
        Ok(alert.clone())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn issue_token(&self, token: NewToken) -> Result<Token, OpsError> {
        let mut tables = self.tables.write().await;
        if !tables.patients.contains_key(&token.patient_id) {
            return Err(OpsError::not_found("patient", token.patient_id));
        }
        let counter = tables
            .token_counters
            .get_mut(&token.department_id)
            .ok_or_else(|| OpsError::not_found("department", token.department_id))?;
        *counter = counter.saturating_add(1);
        let number = *counter;

        let queue: Vec<Token> = tables
            .tokens
            .values()
            .filter(|t| t.department_id == token.department_id)
            .cloned()
            .collect();
        let ahead = waiting_ahead(&queue, token.priority);

        let stored = Token {
            id: TokenId::new(),
            number,
            patient_id: token.patient_id,
            department_id: token.department_id,
            priority: token.priority,
            status: TokenStatus::Waiting,
            estimated_wait_minutes: estimate_wait_minutes(ahead, token.minutes_per_token),
            created_at: token.created_at,
            updated_at: token.created_at,
        };
        tables.tokens.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_token(&self, id: TokenId) -> Result<Token, OpsError> {
        self.tables
            .read()
            .await
            .tokens
            .get(&id)
            .cloned()
            .ok_or_else(|| OpsError::not_found("token", id))
    }

    async fn list_tokens(
        &self,
        department_id: DepartmentId,
        statuses: &[TokenStatus],
    ) -> Result<Vec<Token>, OpsError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tokens
            .values()
            .filter(|t| t.department_id == department_id && statuses.contains(&t.status))
            .cloned()
            .collect())
    }

    async fn transition_token(
        &self,
        id: TokenId,
        expected: TokenStatus,
        next: TokenStatus,
        at: DateTime<Utc>,
    ) -> Result<Token, OpsError> {
        let mut tables = self.tables.write().await;
        let token = tables
            .tokens
            .get_mut(&id)
            .ok_or_else(|| OpsError::not_found("token", id))?;
        if token.status != expected {
            return Err(OpsError::transition(token.status, next));
        }
        token.status = next;
        token.updated_at = at;
        Ok(token.clone())
    }
}

#[async_trait]
impl HospitalStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> Result<(), OpsError> {
        Ok(())
    }
}
