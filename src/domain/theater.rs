//! Operating theaters and their surgery bookings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::schedule::TimeRange;
use super::{BookingId, DoctorId, PatientId, TheaterId};

/// Lifecycle label persisted on the theater row.
///
/// This is storage state, refreshed by the status reconciler. What
/// dashboards display is the [`super::DisplayStatus`] derived from the
/// label, the current booking, and the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TheaterStatus {
    /// Free for use.
    Available,
    /// A booking is waiting to start.
    Scheduled,
    /// A surgery is under way.
    InProgress,
    /// Closed for maintenance until `status_until`.
    Maintenance,
    /// Being cleaned until `status_until`.
    Cleaning,
}

text_enum!(TheaterStatus, "theater status" {
    Available => "available",
    Scheduled => "scheduled",
    InProgress => "in_progress",
    Maintenance => "maintenance",
    Cleaning => "cleaning",
});

impl TheaterStatus {
    /// Returns `true` for the labels that close the theater to bookings.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Maintenance | Self::Cleaning)
    }
}

/// An operating theater row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theater {
    /// Unique identifier.
    pub id: TheaterId,
    /// Human code shown on boards, e.g. `OT-002`. Unique.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Persisted lifecycle label.
    pub status: TheaterStatus,
    /// Estimated end of a maintenance or cleaning window.
    pub status_until: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Theater {
    /// Creates an available theater.
    #[must_use]
    pub fn new(code: String, name: String, now: DateTime<Utc>) -> Self {
        Self {
            id: TheaterId::new(),
            code,
            name,
            status: TheaterStatus::Available,
            status_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` while a maintenance or cleaning window covers `at`.
    ///
    /// A closed label without an end time is open-ended.
    #[must_use]
    pub fn is_closed_at(&self, at: DateTime<Utc>) -> bool {
        self.status.is_closed() && self.status_until.is_none_or(|until| at <= until)
    }
}

/// Lifecycle of a surgery booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Booked, not started.
    Scheduled,
    /// Surgery under way.
    InProgress,
    /// Finished (on time or closed early).
    Completed,
    /// Withdrawn before completion.
    Cancelled,
}

text_enum!(BookingStatus, "booking status" {
    Scheduled => "scheduled",
    InProgress => "in_progress",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl BookingStatus {
    /// Active bookings hold their interval on the theater calendar.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Scheduled | Self::InProgress)
    }
}

/// A surgery booked into a theater for `[start_time, end_time)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Booking {
    /// Unique identifier.
    pub id: BookingId,
    /// Theater holding the booking.
    pub theater_id: TheaterId,
    /// Linked patient record, when the patient is registered.
    pub patient_id: Option<PatientId>,
    /// Patient name as shown on the board.
    pub patient_name: String,
    /// Procedure description.
    pub procedure: String,
    /// Operating surgeon.
    pub surgeon_id: DoctorId,
    /// Surgeon name, denormalized for boards.
    pub surgeon_name: String,
    /// Scheduled start.
    pub start_time: DateTime<Utc>,
    /// Estimated end.
    pub end_time: DateTime<Utc>,
    /// Lifecycle status.
    pub status: BookingStatus,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Returns `true` if the booking still holds its interval.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// The booked interval.
    #[must_use]
    pub const fn range(&self) -> TimeRange {
        TimeRange::new_unchecked(self.start_time, self.end_time)
    }

    /// Occupant fields displayed for the theater.
    #[must_use]
    pub fn occupant(&self) -> Occupant {
        Occupant {
            patient_name: self.patient_name.clone(),
            procedure: self.procedure.clone(),
            surgeon: self.surgeon_name.clone(),
            start_time: self.start_time,
            estimated_end: self.end_time,
        }
    }
}

/// Who is (or will be) in the theater.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Occupant {
    /// Patient name.
    pub patient_name: String,
    /// Procedure description.
    pub procedure: String,
    /// Surgeon name.
    pub surgeon: String,
    /// Scheduled start.
    pub start_time: DateTime<Utc>,
    /// Estimated end.
    pub estimated_end: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0)
            .single()
            .unwrap_or_default()
    }

    #[test]
    fn open_ended_maintenance_is_closed() {
        let mut theater = Theater::new("OT-001".into(), "Main".into(), at(8));
        theater.status = TheaterStatus::Maintenance;
        assert!(theater.is_closed_at(at(8) + Duration::days(30)));
    }

    #[test]
    fn cleaning_window_reopens_after_until() {
        let mut theater = Theater::new("OT-001".into(), "Main".into(), at(8));
        theater.status = TheaterStatus::Cleaning;
        theater.status_until = Some(at(9));
        assert!(theater.is_closed_at(at(9)));
        assert!(!theater.is_closed_at(at(10)));
    }

    #[test]
    fn only_scheduled_and_in_progress_are_active() {
        assert!(BookingStatus::Scheduled.is_active());
        assert!(BookingStatus::InProgress.is_active());
        assert!(!BookingStatus::Completed.is_active());
        assert!(!BookingStatus::Cancelled.is_active());
    }

    #[test]
    fn status_text_matches_serde() {
        let Ok(json) = serde_json::to_string(&TheaterStatus::InProgress) else {
            panic!("serialization failed");
        };
        assert_eq!(json, format!("\"{}\"", TheaterStatus::InProgress.as_str()));
    }
}
