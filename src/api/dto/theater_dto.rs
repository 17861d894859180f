//! Theater and booking DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Booking, BookingId, BookingStatus, DisplayStatus, DoctorId, Occupant, PatientId, TheaterId,
    TheaterStatus,
};
use crate::persistence::SurgeonRequest;
use crate::service::{ConflictCheck, SurgeryRequest, TheaterUpdate, TheaterView};

/// Request body for `POST /theaters`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTheaterRequest {
    /// Board code, e.g. `OT-002`.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// Request body for `PATCH /theaters/{id}`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTheaterRequest {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New lifecycle label.
    #[serde(default)]
    pub status: Option<TheaterStatus>,
    /// End of a maintenance or cleaning window.
    #[serde(default)]
    pub status_until: Option<DateTime<Utc>>,
}

impl From<UpdateTheaterRequest> for TheaterUpdate {
    fn from(req: UpdateTheaterRequest) -> Self {
        Self {
            name: req.name,
            status: req.status,
            status_until: req.status_until,
        }
    }
}

/// A theater as shown on dashboards.
#[derive(Debug, Serialize, ToSchema)]
pub struct TheaterResponse {
    /// Theater identifier.
    pub id: TheaterId,
    /// Board code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Derived display status at request time.
    pub status: DisplayStatus,
    /// Persisted lifecycle label.
    pub stored_status: TheaterStatus,
    /// End of a maintenance or cleaning window.
    pub status_until: Option<DateTime<Utc>>,
    /// Booking on the board.
    pub booking_id: Option<BookingId>,
    /// Current or next occupant.
    pub occupant: Option<Occupant>,
    /// Minutes since the running surgery started.
    pub elapsed_minutes: Option<i64>,
    /// Share of the booked duration elapsed, 0–100.
    pub progress_percent: Option<u8>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<TheaterView> for TheaterResponse {
    fn from(view: TheaterView) -> Self {
        let TheaterView { theater, reading } = view;
        Self {
            id: theater.id,
            code: theater.code,
            name: theater.name,
            status: reading.status,
            stored_status: theater.status,
            status_until: theater.status_until,
            booking_id: reading.booking_id,
            occupant: reading.occupant,
            elapsed_minutes: reading.elapsed_minutes,
            progress_percent: reading.progress_percent,
            created_at: theater.created_at,
            updated_at: theater.updated_at,
        }
    }
}

/// Request body for `POST /theaters/{id}/conflicts`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ConflictCheckRequest {
    /// Proposed start.
    pub start_time: DateTime<Utc>,
    /// Free-text duration in hours, e.g. `"1.5 hours"`. Defaults to 2 hours.
    #[serde(default)]
    pub duration: String,
}

/// Response body for a conflict check.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConflictCheckResponse {
    /// `true` if the interval overlaps an active booking.
    pub has_conflict: bool,
    /// Proposed start.
    pub start_time: DateTime<Utc>,
    /// Computed end.
    pub end_time: DateTime<Utc>,
    /// First overlapping booking.
    pub conflicting_booking_id: Option<BookingId>,
}

impl From<ConflictCheck> for ConflictCheckResponse {
    fn from(check: ConflictCheck) -> Self {
        Self {
            has_conflict: check.has_conflict(),
            start_time: check.range.start,
            end_time: check.range.end,
            conflicting_booking_id: check.conflicting_booking,
        }
    }
}

/// Request body for `POST /theaters/{id}/bookings`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScheduleSurgeryRequest {
    /// Registered patient.
    #[serde(default)]
    pub patient_id: Option<PatientId>,
    /// Patient name; taken from the patient record when omitted.
    #[serde(default)]
    pub patient_name: String,
    /// Procedure description.
    pub procedure: String,
    /// Existing surgeon.
    #[serde(default)]
    pub surgeon_id: Option<DoctorId>,
    /// Surgeon name, matched case-insensitively or registered.
    #[serde(default)]
    pub surgeon_name: Option<String>,
    /// Scheduled start.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Free-text duration in hours. Defaults to 2 hours.
    #[serde(default)]
    pub duration: String,
    /// Free-text notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<ScheduleSurgeryRequest> for SurgeryRequest {
    fn from(req: ScheduleSurgeryRequest) -> Self {
        Self {
            patient_id: req.patient_id,
            patient_name: req.patient_name,
            procedure: req.procedure,
            surgeon: SurgeonRequest {
                id: req.surgeon_id,
                name: req.surgeon_name,
            },
            start_time: req.start_time,
            duration: req.duration,
            notes: req.notes,
        }
    }
}

/// Query parameters for `GET /theaters/{id}/bookings`.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct BookingListParams {
    /// Only scheduled and in-progress bookings.
    #[serde(default)]
    pub active: bool,
}

/// A surgery booking.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingResponse {
    /// Booking identifier.
    pub id: BookingId,
    /// Theater holding the booking.
    pub theater_id: TheaterId,
    /// Linked patient record.
    pub patient_id: Option<PatientId>,
    /// Patient name.
    pub patient_name: String,
    /// Procedure description.
    pub procedure: String,
    /// Operating surgeon.
    pub surgeon_id: DoctorId,
    /// Surgeon name.
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

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            theater_id: b.theater_id,
            patient_id: b.patient_id,
            patient_name: b.patient_name,
            procedure: b.procedure,
            surgeon_id: b.surgeon_id,
            surgeon_name: b.surgeon_name,
            start_time: b.start_time,
            end_time: b.end_time,
            status: b.status,
            notes: b.notes,
            created_at: b.created_at,
        }
    }
}
