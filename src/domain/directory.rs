//! Departments, doctors and patients.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{DepartmentId, DoctorId, PatientId};

/// Condition keywords that put a patient on the emergency queue.
pub const EMERGENCY_KEYWORDS: [&str; 3] = ["emergency", "critical", "urgent"];

/// A hospital department issuing queue tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Department {
    /// Unique identifier.
    pub id: DepartmentId,
    /// Unique display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A doctor; surgeons on bookings are doctors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Doctor {
    /// Unique identifier.
    pub id: DoctorId,
    /// Full name.
    pub name: String,
    /// Specialization, e.g. "Cardiothoracic Surgery".
    pub specialization: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A registered patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Patient {
    /// Unique identifier.
    pub id: PatientId,
    /// Full name.
    pub name: String,
    /// Age in years, if recorded.
    pub age: Option<i32>,
    /// Free-text clinical condition.
    pub condition: String,
    /// Department currently responsible.
    pub department_id: Option<DepartmentId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    /// Returns `true` when the condition mentions an emergency keyword
    /// (case-insensitive).
    #[must_use]
    pub fn is_emergency_flagged(&self) -> bool {
        let condition = self.condition.to_lowercase();
        EMERGENCY_KEYWORDS.iter().any(|k| condition.contains(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(condition: &str) -> Patient {
        let now = Utc::now();
        Patient {
            id: PatientId::new(),
            name: "Meera".into(),
            age: Some(54),
            condition: condition.into(),
            department_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn keywords_flag_case_insensitively() {
        assert!(patient("CRITICAL - post-op bleed").is_emergency_flagged());
        assert!(patient("Urgent review").is_emergency_flagged());
        assert!(patient("admitted via emergency").is_emergency_flagged());
    }

    #[test]
    fn stable_patient_is_not_flagged() {
        assert!(!patient("stable, awaiting discharge").is_emergency_flagged());
    }
}
