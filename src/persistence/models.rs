//! Database row types and their conversion into domain records.
//!
//! Enum columns are stored as text; a row whose label no longer parses is
//! reported as a [`OpsError::PersistenceError`] rather than skipped.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AlertId, Booking, BookingId, Department, DepartmentId, Doctor, DoctorId, EmergencyAlert,
    Patient, PatientId, StaffRole, Theater, TheaterId, Token, TokenId,
};
use crate::error::OpsError;

fn parse_column<T>(column: &str, text: &str) -> Result<T, OpsError>
where
    T: FromStr<Err = OpsError>,
{
    text.parse()
        .map_err(|e| OpsError::PersistenceError(format!("column {column}: {e}")))
}

/// A row of the `theaters` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TheaterRow {
    /// Primary key.
    pub id: Uuid,
    /// Unique code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Lifecycle label text.
    pub status: String,
    /// End of a maintenance or cleaning window.
    pub status_until: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TheaterRow> for Theater {
    type Error = OpsError;

    fn try_from(row: TheaterRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TheaterId::from_uuid(row.id),
            code: row.code,
            name: row.name,
            status: parse_column("theaters.status", &row.status)?,
            status_until: row.status_until,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A row of the `bookings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    /// Primary key.
    pub id: Uuid,
    /// Owning theater.
    pub theater_id: Uuid,
    /// Linked patient.
    pub patient_id: Option<Uuid>,
    /// Patient name.
    pub patient_name: String,
    /// Procedure description.
    pub procedure: String,
    /// Surgeon (doctor) id.
    pub surgeon_id: Uuid,
    /// Surgeon name.
    pub surgeon_name: String,
    /// Scheduled start.
    pub start_time: DateTime<Utc>,
    /// Estimated end.
    pub end_time: DateTime<Utc>,
    /// Booking status text.
    pub status: String,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = OpsError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: BookingId::from_uuid(row.id),
            theater_id: TheaterId::from_uuid(row.theater_id),
            patient_id: row.patient_id.map(PatientId::from_uuid),
            patient_name: row.patient_name,
            procedure: row.procedure,
            surgeon_id: DoctorId::from_uuid(row.surgeon_id),
            surgeon_name: row.surgeon_name,
            start_time: row.start_time,
            end_time: row.end_time,
            status: parse_column("bookings.status", &row.status)?,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

/// A row of the `departments` table (without the token counter).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DepartmentRow {
    /// Primary key.
    pub id: Uuid,
    /// Unique name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<DepartmentRow> for Department {
    fn from(row: DepartmentRow) -> Self {
        Self {
            id: DepartmentId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

/// A row of the `doctors` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DoctorRow {
    /// Primary key.
    pub id: Uuid,
    /// Full name.
    pub name: String,
    /// Specialization.
    pub specialization: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<DoctorRow> for Doctor {
    fn from(row: DoctorRow) -> Self {
        Self {
            id: DoctorId::from_uuid(row.id),
            name: row.name,
            specialization: row.specialization,
            created_at: row.created_at,
        }
    }
}

/// A row of the `patients` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PatientRow {
    /// Primary key.
    pub id: Uuid,
    /// Full name.
    pub name: String,
    /// Age in years.
    pub age: Option<i32>,
    /// Clinical condition.
    pub condition: String,
    /// Responsible department.
    pub department_id: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<PatientRow> for Patient {
    fn from(row: PatientRow) -> Self {
        Self {
            id: PatientId::from_uuid(row.id),
            name: row.name,
            age: row.age,
            condition: row.condition,
            department_id: row.department_id.map(DepartmentId::from_uuid),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row of the `emergency_alerts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AlertRow {
    /// Primary key.
    pub id: Uuid,
    /// Incident code text.
    pub code: String,
    /// Location.
    pub location: String,
    /// Message.
    pub message: String,
    /// Priority 1–5.
    pub priority: i16,
    /// Alert status text.
    pub status: String,
    /// Targeted role names.
    pub target_roles: Vec<String>,
    /// Raise timestamp.
    pub created_at: DateTime<Utc>,
    /// Resolution timestamp.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<AlertRow> for EmergencyAlert {
    type Error = OpsError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        let target_roles = row
            .target_roles
            .iter()
            .map(|role| parse_column::<StaffRole>("emergency_alerts.target_roles", role))
            .collect::<Result<Vec<_>, _>>()?;
        let priority = u8::try_from(row.priority).map_err(|_| {
            OpsError::PersistenceError(format!(
                "column emergency_alerts.priority out of range: {}",
                row.priority
            ))
        })?;
        Ok(Self {
            id: AlertId::from_uuid(row.id),
            code: parse_column("emergency_alerts.code", &row.code)?,
            location: row.location,
            message: row.message,
            priority,
            status: parse_column("emergency_alerts.status", &row.status)?,
            target_roles,
            created_at: row.created_at,
            resolved_at: row.resolved_at,
        })
    }
}

/// A row of the `tokens` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TokenRow {
    /// Primary key.
    pub id: Uuid,
    /// Department-scoped number.
    pub number: i32,
    /// Ticket holder.
    pub patient_id: Uuid,
    /// Issuing department.
    pub department_id: Uuid,
    /// Priority text.
    pub priority: String,
    /// Status text.
    pub status: String,
    /// Wait estimate at issue.
    pub estimated_wait_minutes: i32,
    /// Issue timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TokenRow> for Token {
    type Error = OpsError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TokenId::from_uuid(row.id),
            number: row.number,
            patient_id: PatientId::from_uuid(row.patient_id),
            department_id: DepartmentId::from_uuid(row.department_id),
            priority: parse_column("tokens.priority", &row.priority)?,
            status: parse_column("tokens.status", &row.status)?,
            estimated_wait_minutes: row.estimated_wait_minutes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{AlertStatus, TokenStatus};

    fn alert_row(roles: &[&str], priority: i16) -> AlertRow {
        AlertRow {
            id: Uuid::new_v4(),
            code: "blue".into(),
            location: "ICU".into(),
            message: "Arrest".into(),
            priority,
            status: "active".into(),
            target_roles: roles.iter().map(|r| (*r).to_string()).collect(),
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    #[test]
    fn alert_row_converts() {
        let Ok(alert) = EmergencyAlert::try_from(alert_row(&["doctor", "nurse"], 1)) else {
            panic!("conversion failed");
        };
        assert_eq!(alert.status, AlertStatus::Active);
        assert_eq!(alert.target_roles, vec![StaffRole::Doctor, StaffRole::Nurse]);
    }

    #[test]
    fn unknown_label_is_a_persistence_error() {
        let result = EmergencyAlert::try_from(alert_row(&["janitor"], 1));
        assert!(matches!(result, Err(OpsError::PersistenceError(_))));
        let result = EmergencyAlert::try_from(alert_row(&[], -3));
        assert!(matches!(result, Err(OpsError::PersistenceError(_))));
    }

    #[test]
    fn token_row_converts() {
        let now = Utc::now();
        let row = TokenRow {
            id: Uuid::new_v4(),
            number: 4,
            patient_id: Uuid::new_v4(),
            department_id: Uuid::new_v4(),
            priority: "urgent".into(),
            status: "in_progress".into(),
            estimated_wait_minutes: 20,
            created_at: now,
            updated_at: now,
        };
        let Ok(token) = Token::try_from(row) else {
            panic!("conversion failed");
        };
        assert_eq!(token.status, TokenStatus::InProgress);
    }
}
