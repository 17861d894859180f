//! Theater status derivation.
//!
//! [`derive`] turns a theater row, the booking on its board, and the
//! current time into what dashboards display. It never writes anything:
//! the [`Transition`] it reports is applied by the status reconciler
//! (`service::status_reconciler`), so reads stay side-effect free.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Booking, BookingId, Occupant, Theater, TheaterStatus};

/// Status shown on dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    /// Nothing running or booked.
    Available,
    /// A surgery is running now.
    Occupied,
    /// The next surgery has not started yet.
    Booked,
    /// Closed for maintenance.
    Maintenance,
    /// Being cleaned.
    Cleaning,
}

impl DisplayStatus {
    /// The lifecycle label storage should hold for this display status.
    #[must_use]
    pub const fn storage_label(&self) -> TheaterStatus {
        match self {
            Self::Available => TheaterStatus::Available,
            Self::Occupied => TheaterStatus::InProgress,
            Self::Booked => TheaterStatus::Scheduled,
            Self::Maintenance => TheaterStatus::Maintenance,
            Self::Cleaning => TheaterStatus::Cleaning,
        }
    }
}

/// A state change observed while deriving, for the reconciler to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A scheduled booking's start time has passed.
    BookingStarted(BookingId),
    /// An active booking's estimated end has passed.
    BookingExpired(BookingId),
    /// A maintenance or cleaning window has elapsed.
    WindowElapsed,
}

/// Result of deriving a theater's status at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct TheaterReading {
    /// Status to display.
    pub status: DisplayStatus,
    /// Booking shown on the board, if any.
    pub booking_id: Option<BookingId>,
    /// Occupant fields; cleared once the booking has expired.
    pub occupant: Option<Occupant>,
    /// Whole minutes since the running surgery started.
    pub elapsed_minutes: Option<i64>,
    /// Share of the booked duration already elapsed, 0–100.
    pub progress_percent: Option<u8>,
    /// Transition the reconciler should apply.
    pub transition: Option<Transition>,
}

impl TheaterReading {
    fn idle(status: DisplayStatus, transition: Option<Transition>) -> Self {
        Self {
            status,
            booking_id: None,
            occupant: None,
            elapsed_minutes: None,
            progress_percent: None,
            transition,
        }
    }
}

/// Derives the display status of `theater` at `now`.
///
/// - Maintenance/Cleaning is honored until `now > status_until`; after
///   that the theater is judged on its booking as if available.
/// - A booking with an occupant is `occupied` while
///   `start <= now <= end`, `booked` before start, and `available` with the
///   occupant cleared after end.
/// - Anything else is `available`.
#[must_use]
pub fn derive(theater: &Theater, booking: Option<&Booking>, now: DateTime<Utc>) -> TheaterReading {
    let mut window_elapsed = false;
    if theater.status.is_closed() {
        if theater.is_closed_at(now) {
            let status = if theater.status == TheaterStatus::Cleaning {
                DisplayStatus::Cleaning
            } else {
                DisplayStatus::Maintenance
            };
            return TheaterReading::idle(status, None);
        }
        window_elapsed = true;
    }

    let elapsed_transition = window_elapsed.then_some(Transition::WindowElapsed);

    let Some(booking) = booking.filter(|b| b.is_active() && !b.patient_name.trim().is_empty())
    else {
        return TheaterReading::idle(DisplayStatus::Available, elapsed_transition);
    };

    if now > booking.end_time {
        return TheaterReading::idle(
            DisplayStatus::Available,
            Some(Transition::BookingExpired(booking.id)),
        );
    }

    if now < booking.start_time {
        return TheaterReading {
            status: DisplayStatus::Booked,
            booking_id: Some(booking.id),
            occupant: Some(booking.occupant()),
            elapsed_minutes: None,
            progress_percent: None,
            transition: elapsed_transition,
        };
    }

    let elapsed = (now - booking.start_time).num_minutes();
    let total = booking.range().duration().num_minutes();
    let progress = if total > 0 {
        (elapsed.saturating_mul(100) / total).clamp(0, 100)
    } else {
        100
    };
    let started = (booking.status == super::BookingStatus::Scheduled)
        .then_some(Transition::BookingStarted(booking.id));

    TheaterReading {
        status: DisplayStatus::Occupied,
        booking_id: Some(booking.id),
        occupant: Some(booking.occupant()),
        elapsed_minutes: Some(elapsed),
        progress_percent: u8::try_from(progress).ok(),
        transition: started.or(elapsed_transition),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::{BookingStatus, DoctorId};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        let Some(t) = Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).single() else {
            panic!("valid timestamp");
        };
        t
    }

    fn ot_002() -> Theater {
        let mut theater = Theater::new("OT-002".into(), "Cardiac Theater".into(), at(6, 0));
        theater.status = TheaterStatus::Scheduled;
        theater
    }

    fn booking_9_to_11(theater: &Theater, status: BookingStatus) -> Booking {
        Booking {
            id: BookingId::new(),
            theater_id: theater.id,
            patient_id: None,
            patient_name: "Ravi Kumar".into(),
            procedure: "CABG".into(),
            surgeon_id: DoctorId::new(),
            surgeon_name: "Dr. Iyer".into(),
            start_time: at(9, 0),
            end_time: at(11, 0),
            status,
            notes: None,
            created_at: at(6, 0),
        }
    }

    #[test]
    fn running_surgery_is_occupied_with_progress() {
        let theater = ot_002();
        let booking = booking_9_to_11(&theater, BookingStatus::InProgress);
        let reading = derive(&theater, Some(&booking), at(10, 0));
        assert_eq!(reading.status, DisplayStatus::Occupied);
        assert_eq!(reading.elapsed_minutes, Some(60));
        assert_eq!(reading.progress_percent, Some(50));
        assert_eq!(
            reading.occupant.map(|o| o.patient_name),
            Some("Ravi Kumar".to_string())
        );
        assert_eq!(reading.transition, None);
    }

    #[test]
    fn occupied_bounds_are_inclusive() {
        let theater = ot_002();
        let booking = booking_9_to_11(&theater, BookingStatus::InProgress);
        assert_eq!(
            derive(&theater, Some(&booking), at(9, 0)).status,
            DisplayStatus::Occupied
        );
        let at_end = derive(&theater, Some(&booking), at(11, 0));
        assert_eq!(at_end.status, DisplayStatus::Occupied);
        assert_eq!(at_end.progress_percent, Some(100));
    }

    #[test]
    fn scheduled_booking_reports_start_transition() {
        let theater = ot_002();
        let booking = booking_9_to_11(&theater, BookingStatus::Scheduled);
        let reading = derive(&theater, Some(&booking), at(9, 30));
        assert_eq!(reading.status, DisplayStatus::Occupied);
        assert_eq!(reading.transition, Some(Transition::BookingStarted(booking.id)));
    }

    #[test]
    fn future_booking_is_booked() {
        let theater = ot_002();
        let booking = booking_9_to_11(&theater, BookingStatus::Scheduled);
        let reading = derive(&theater, Some(&booking), at(8, 0));
        assert_eq!(reading.status, DisplayStatus::Booked);
        assert!(reading.occupant.is_some());
        assert_eq!(reading.elapsed_minutes, None);
    }

    #[test]
    fn expired_booking_is_available_and_cleared() {
        let theater = ot_002();
        let booking = booking_9_to_11(&theater, BookingStatus::InProgress);
        let reading = derive(&theater, Some(&booking), at(11, 1));
        assert_eq!(reading.status, DisplayStatus::Available);
        assert!(reading.occupant.is_none());
        assert!(reading.booking_id.is_none());
        assert_eq!(reading.transition, Some(Transition::BookingExpired(booking.id)));
    }

    #[test]
    fn booking_without_occupant_is_ignored() {
        let theater = ot_002();
        let mut booking = booking_9_to_11(&theater, BookingStatus::Scheduled);
        booking.patient_name = "  ".into();
        let reading = derive(&theater, Some(&booking), at(10, 0));
        assert_eq!(reading.status, DisplayStatus::Available);
    }

    #[test]
    fn maintenance_is_honored_until_window_ends() {
        let mut theater = ot_002();
        theater.status = TheaterStatus::Maintenance;
        theater.status_until = Some(at(12, 0));
        assert_eq!(
            derive(&theater, None, at(11, 0)).status,
            DisplayStatus::Maintenance
        );
        let after = derive(&theater, None, at(12, 1));
        assert_eq!(after.status, DisplayStatus::Available);
        assert_eq!(after.transition, Some(Transition::WindowElapsed));
    }

    #[test]
    fn cleaning_label_displays_cleaning() {
        let mut theater = ot_002();
        theater.status = TheaterStatus::Cleaning;
        theater.status_until = Some(at(12, 0));
        assert_eq!(derive(&theater, None, at(11, 30)).status, DisplayStatus::Cleaning);
    }

    #[test]
    fn no_booking_is_available() {
        let theater = ot_002();
        let reading = derive(&theater, None, at(10, 0));
        assert_eq!(reading.status, DisplayStatus::Available);
        assert_eq!(reading.status.storage_label(), TheaterStatus::Available);
    }
}
