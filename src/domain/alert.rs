//! Emergency alerts broadcast to staff.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AlertId, StaffRole};
use crate::error::OpsError;

/// Most urgent alert priority.
pub const PRIORITY_MOST_URGENT: u8 = 1;

/// Least urgent alert priority.
pub const PRIORITY_LEAST_URGENT: u8 = 5;

/// Hospital incident code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlertCode {
    /// Cardiac or respiratory arrest.
    Blue,
    /// Fire.
    Red,
    /// Infant or child abduction.
    Pink,
    /// Hazardous material spill.
    Orange,
    /// Combative person.
    Grey,
    /// Bomb threat.
    Black,
    /// Missing patient.
    Yellow,
}

text_enum!(AlertCode, "alert code" {
    Blue => "blue",
    Red => "red",
    Pink => "pink",
    Orange => "orange",
    Grey => "grey",
    Black => "black",
    Yellow => "yellow",
});

impl AlertCode {
    /// Board title, e.g. "Code Blue".
    #[must_use]
    pub fn title(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        let capitalized: String = chars
            .next()
            .map(|first| first.to_ascii_uppercase())
            .into_iter()
            .chain(chars)
            .collect();
        format!("Code {capitalized}")
    }
}

/// Whether an alert still needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    /// Open incident.
    Active,
    /// Closed incident.
    Resolved,
}

text_enum!(AlertStatus, "alert status" {
    Active => "active",
    Resolved => "resolved",
});

/// An emergency alert row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EmergencyAlert {
    /// Unique identifier.
    pub id: AlertId,
    /// Incident code.
    pub code: AlertCode,
    /// Where it happened, e.g. "Ward 4B".
    pub location: String,
    /// Free-text message.
    pub message: String,
    /// 1 (most urgent) to 5.
    pub priority: u8,
    /// Open or closed.
    pub status: AlertStatus,
    /// Roles the alert is broadcast to; empty means everyone.
    pub target_roles: Vec<StaffRole>,
    /// Raise timestamp.
    pub created_at: DateTime<Utc>,
    /// Resolution timestamp.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl EmergencyAlert {
    /// Returns `true` if the alert is open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }

    /// Returns `true` if a user with `role` should receive the alert.
    #[must_use]
    pub fn targets(&self, role: StaffRole) -> bool {
        self.target_roles.is_empty() || self.target_roles.contains(&role)
    }
}

/// Checks that `priority` lies in 1..=5.
///
/// # Errors
///
/// Returns [`OpsError::InvalidRequest`] otherwise.
pub fn validate_priority(priority: u8) -> Result<u8, OpsError> {
    if (PRIORITY_MOST_URGENT..=PRIORITY_LEAST_URGENT).contains(&priority) {
        Ok(priority)
    } else {
        Err(OpsError::InvalidRequest(format!(
            "alert priority must be between {PRIORITY_MOST_URGENT} and {PRIORITY_LEAST_URGENT}, got {priority}"
        )))
    }
}
