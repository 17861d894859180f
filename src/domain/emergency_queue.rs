//! Emergency queue assembly.
//!
//! The queue is a presentation aggregate: active alerts first, ordered by
//! priority then age, followed by patients whose condition is flagged. It
//! is rebuilt from the rows on every request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AlertCode, AlertId, EmergencyAlert, Patient, PatientId};

/// Maximum number of entries shown on the emergency board.
pub const EMERGENCY_QUEUE_LIMIT: usize = 5;

/// How urgently an entry needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Immediate response.
    Critical,
    /// Prompt response.
    High,
    /// Routine escalation.
    Medium,
}

impl Severity {
    /// Maps an alert priority: 1 is critical, 2 high, anything else medium.
    #[must_use]
    pub const fn from_alert_priority(priority: u8) -> Self {
        match priority {
            1 => Self::Critical,
            2 => Self::High,
            _ => Self::Medium,
        }
    }

    /// Maps a patient condition: "critical" is critical, "urgent" high,
    /// anything else medium.
    #[must_use]
    pub fn from_condition(condition: &str) -> Self {
        let condition = condition.to_lowercase();
        if condition.contains("critical") {
            Self::Critical
        } else if condition.contains("urgent") {
            Self::High
        } else {
            Self::Medium
        }
    }
}

/// Where a queue entry came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmergencySource {
    /// An active emergency alert.
    Alert {
        /// Alert identifier.
        alert_id: AlertId,
        /// Incident code.
        code: AlertCode,
    },
    /// A patient with a flagged condition.
    Patient {
        /// Patient identifier.
        patient_id: PatientId,
    },
}

/// One row on the emergency board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EmergencyEntry {
    /// Originating record.
    pub source: EmergencySource,
    /// Urgency.
    pub severity: Severity,
    /// Headline, e.g. "Code Blue" or the patient name.
    pub title: String,
    /// Location for alerts.
    pub location: Option<String>,
    /// Alert message or patient condition.
    pub detail: String,
    /// When the alert was raised or the patient record last changed.
    pub raised_at: DateTime<Utc>,
}

impl From<&EmergencyAlert> for EmergencyEntry {
    fn from(alert: &EmergencyAlert) -> Self {
        Self {
            source: EmergencySource::Alert {
                alert_id: alert.id,
                code: alert.code,
            },
            severity: Severity::from_alert_priority(alert.priority),
            title: alert.code.title(),
            location: Some(alert.location.clone()),
            detail: alert.message.clone(),
            raised_at: alert.created_at,
        }
    }
}

impl From<&Patient> for EmergencyEntry {
    fn from(patient: &Patient) -> Self {
        Self {
            source: EmergencySource::Patient {
                patient_id: patient.id,
            },
            severity: Severity::from_condition(&patient.condition),
            title: patient.name.clone(),
            location: None,
            detail: patient.condition.clone(),
            raised_at: patient.updated_at,
        }
    }
}

/// Builds the emergency queue from alert and patient rows.
///
/// Resolved alerts and unflagged patients are skipped. Alert entries are
/// sorted by priority (1 first) then raise time; patient entries follow in
/// the order given. At most [`EMERGENCY_QUEUE_LIMIT`] entries are returned.
#[must_use]
pub fn assemble(alerts: &[EmergencyAlert], patients: &[Patient]) -> Vec<EmergencyEntry> {
    let mut active: Vec<&EmergencyAlert> = alerts.iter().filter(|a| a.is_active()).collect();
    active.sort_by_key(|a| (a.priority, a.created_at));

    active
        .into_iter()
        .map(EmergencyEntry::from)
        .chain(
            patients
                .iter()
                .filter(|p| p.is_emergency_flagged())
                .map(EmergencyEntry::from),
        )
        .take(EMERGENCY_QUEUE_LIMIT)
        .collect()
}
