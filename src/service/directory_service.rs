//! Directory service: departments, doctors and patients.

use chrono::{DateTime, Utc};

use crate::domain::{Department, DepartmentId, Doctor, DoctorId, Patient, PatientId};
use crate::error::OpsError;
use crate::persistence::{DirectoryStore, SharedStore};

/// Oldest age accepted on a patient record.
const MAX_PATIENT_AGE: i32 = 150;

/// Fields of a new patient record.
#[derive(Debug, Clone, Default)]
pub struct NewPatient {
    /// Full name.
    pub name: String,
    /// Age in years.
    pub age: Option<i32>,
    /// Clinical condition.
    pub condition: String,
    /// Responsible department.
    pub department_id: Option<DepartmentId>,
}

/// Partial update of a patient record; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct PatientUpdate {
    /// New name.
    pub name: Option<String>,
    /// New age.
    pub age: Option<i32>,
    /// New condition.
    pub condition: Option<String>,
    /// New department.
    pub department_id: Option<DepartmentId>,
}

/// CRUD over the records the theater, queue and alert services rely on.
#[derive(Debug, Clone)]
pub struct DirectoryService {
    store: SharedStore,
}

impl DirectoryService {
    /// Creates a new `DirectoryService`.
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Creates a department.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidRequest`] for a blank name,
    /// [`OpsError::Duplicate`] if the name is taken.
    pub async fn create_department(
        &self,
        name: &str,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Department, OpsError> {
        let department = self
            .store
            .insert_department(Department {
                id: DepartmentId::new(),
                name: required("name", name)?,
                description: description.filter(|d| !d.trim().is_empty()),
                created_at: now,
            })
            .await?;
        tracing::info!(department_id = %department.id, name = %department.name, "department created");
        Ok(department)
    }

    /// Lists departments by name.
    ///
    /// # Errors
    ///
    /// Storage failures.
    pub async fn list_departments(&self) -> Result<Vec<Department>, OpsError> {
        self.store.list_departments().await
    }

    /// Fetches a department.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    pub async fn get_department(&self, id: DepartmentId) -> Result<Department, OpsError> {
        self.store.get_department(id).await
    }

    /// Deletes a department and its tokens.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    pub async fn delete_department(&self, id: DepartmentId) -> Result<(), OpsError> {
        self.store.delete_department(id).await?;
        tracing::info!(department_id = %id, "department deleted");
        Ok(())
    }

    /// Registers a doctor.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidRequest`] for a blank name or specialization.
    pub async fn create_doctor(
        &self,
        name: &str,
        specialization: &str,
        now: DateTime<Utc>,
    ) -> Result<Doctor, OpsError> {
        let doctor = self
            .store
            .insert_doctor(Doctor {
                id: DoctorId::new(),
                name: required("name", name)?,
                specialization: required("specialization", specialization)?,
                created_at: now,
            })
            .await?;
        tracing::info!(doctor_id = %doctor.id, name = %doctor.name, "doctor registered");
        Ok(doctor)
    }

    /// Lists doctors by name.
    ///
    /// # Errors
    ///
    /// Storage failures.
    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, OpsError> {
        self.store.list_doctors().await
    }

    /// Fetches a doctor.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    pub async fn get_doctor(&self, id: DoctorId) -> Result<Doctor, OpsError> {
        self.store.get_doctor(id).await
    }

    /// Deletes a doctor who is not the surgeon on any booking.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`], or [`OpsError::InvalidRequest`] while
    /// bookings reference the doctor.
    pub async fn delete_doctor(&self, id: DoctorId) -> Result<(), OpsError> {
        self.store.delete_doctor(id).await?;
        tracing::info!(doctor_id = %id, "doctor deleted");
        Ok(())
    }

    /// Registers a patient.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidRequest`] for a blank name or implausible age,
    /// [`OpsError::NotFound`] for an unknown department.
    pub async fn create_patient(
        &self,
        request: NewPatient,
        now: DateTime<Utc>,
    ) -> Result<Patient, OpsError> {
        if let Some(department_id) = request.department_id {
            let _ = self.store.get_department(department_id).await?;
        }
        let patient = self
            .store
            .insert_patient(Patient {
                id: PatientId::new(),
                name: required("name", &request.name)?,
                age: validate_age(request.age)?,
                condition: request.condition.trim().to_string(),
                department_id: request.department_id,
                created_at: now,
                updated_at: now,
            })
            .await?;
        tracing::info!(
            patient_id = %patient.id,
            flagged = patient.is_emergency_flagged(),
            "patient registered"
        );
        Ok(patient)
    }

    /// Lists patients, newest first.
    ///
    /// # Errors
    ///
    /// Storage failures.
    pub async fn list_patients(&self) -> Result<Vec<Patient>, OpsError> {
        self.store.list_patients().await
    }

    /// Fetches a patient.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    pub async fn get_patient(&self, id: PatientId) -> Result<Patient, OpsError> {
        self.store.get_patient(id).await
    }

    /// Updates a patient's details, typically condition or department.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] for an unknown patient or department,
    /// [`OpsError::InvalidRequest`] for a blank name or implausible age.
    pub async fn update_patient(
        &self,
        id: PatientId,
        update: PatientUpdate,
        now: DateTime<Utc>,
    ) -> Result<Patient, OpsError> {
        let mut patient = self.store.get_patient(id).await?;
        if let Some(name) = update.name {
            patient.name = required("name", &name)?;
        }
        if update.age.is_some() {
            patient.age = validate_age(update.age)?;
        }
        if let Some(condition) = update.condition {
            patient.condition = condition.trim().to_string();
        }
        if let Some(department_id) = update.department_id {
            let _ = self.store.get_department(department_id).await?;
            patient.department_id = Some(department_id);
        }
        patient.updated_at = now;

        let patient = self.store.update_patient(patient).await?;
        tracing::info!(
            patient_id = %id,
            flagged = patient.is_emergency_flagged(),
            "patient updated"
        );
        Ok(patient)
    }

    /// Deletes a patient and their tokens.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    pub async fn delete_patient(&self, id: PatientId) -> Result<(), OpsError> {
        self.store.delete_patient(id).await?;
        tracing::info!(patient_id = %id, "patient deleted");
        Ok(())
    }
}

fn required(field: &str, value: &str) -> Result<String, OpsError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OpsError::InvalidRequest(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn validate_age(age: Option<i32>) -> Result<Option<i32>, OpsError> {
    match age {
        Some(years) if !(0..=MAX_PATIENT_AGE).contains(&years) => Err(OpsError::InvalidRequest(
            format!("age must be between 0 and {MAX_PATIENT_AGE}, got {years}"),
        )),
        other => Ok(other),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::service::memory_store;

    fn make_service() -> DirectoryService {
        DirectoryService::new(memory_store())
    }

    #[tokio::test]
    async fn duplicate_department_is_rejected() {
        let service = make_service();
        let now = Utc::now();
        tokio_test::assert_ok!(service.create_department("Radiology", None, now).await);
        let again = service.create_department("Radiology", None, now).await;
        assert!(matches!(again, Err(OpsError::Duplicate(_))));
    }

    #[tokio::test]
    async fn patient_with_unknown_department_is_not_found() {
        let service = make_service();
        let request = NewPatient {
            name: "Omar".into(),
            department_id: Some(DepartmentId::new()),
            ..NewPatient::default()
        };
        let result = service.create_patient(request, Utc::now()).await;
        assert!(matches!(result, Err(OpsError::NotFound { entity: "department", .. })));
    }

    #[tokio::test]
    async fn update_condition_flags_patient() {
        let service = make_service();
        let now = Utc::now();
        let Ok(patient) = service
            .create_patient(
                NewPatient {
                    name: "Omar".into(),
                    age: Some(40),
                    condition: "stable".into(),
                    department_id: None,
                },
                now,
            )
            .await
        else {
            panic!("create failed");
        };
        assert!(!patient.is_emergency_flagged());

        let update = PatientUpdate {
            condition: Some("URGENT review".into()),
            ..PatientUpdate::default()
        };
        let Ok(updated) = service.update_patient(patient.id, update, now).await else {
            panic!("update failed");
        };
        assert!(updated.is_emergency_flagged());
        assert_eq!(updated.age, Some(40));
    }

    #[tokio::test]
    async fn implausible_age_is_rejected() {
        let service = make_service();
        let request = NewPatient {
            name: "Omar".into(),
            age: Some(-2),
            ..NewPatient::default()
        };
        let result = service.create_patient(request, Utc::now()).await;
        assert!(matches!(result, Err(OpsError::InvalidRequest(_))));
    }
}
