//! Surgery calendar rules: intervals, duration parsing, conflict checks.
//!
//! A theater's calendar is the set of its active bookings. A proposed
//! interval conflicts with an existing one when any of the three classic
//! overlap cases holds:
//!
//! 1. the new start falls inside the existing interval,
//! 2. the new end falls inside the existing interval,
//! 3. the new interval fully contains the existing one.
//!
//! Intervals are half-open, so back-to-back bookings do not conflict.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{Booking, BookingId, Theater};
use crate::error::OpsError;

/// Duration assumed when the requested one cannot be read.
pub const DEFAULT_SURGERY_HOURS: i64 = 2;

/// Surgeon assigned when a booking names none that can be resolved.
pub const FALLBACK_SURGEON_NAME: &str = "On-Call Surgeon";

/// Specialization recorded for surgeons created on the fly.
pub const FALLBACK_SURGEON_SPECIALIZATION: &str = "General Surgery";

/// A half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct TimeRange {
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Exclusive end.
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Creates a range, rejecting empty or inverted intervals.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::InvalidRequest`] if `end <= start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, OpsError> {
        if end <= start {
            return Err(OpsError::InvalidRequest(format!(
                "interval end {end} must be after start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Creates a range from stored values already known to be ordered.
    #[must_use]
    pub const fn new_unchecked(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Creates `[start, start + duration)`.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::InvalidRequest`] if the end overflows the
    /// calendar or the duration is not positive.
    pub fn starting_at(start: DateTime<Utc>, duration: Duration) -> Result<Self, OpsError> {
        let end = start
            .checked_add_signed(duration)
            .ok_or_else(|| OpsError::InvalidRequest("duration out of range".to_string()))?;
        Self::new(start, end)
    }

    /// Length of the interval.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Three-case overlap test against an existing interval.
    #[must_use]
    pub fn overlaps(&self, existing: &TimeRange) -> bool {
        let starts_inside = self.start >= existing.start && self.start < existing.end;
        let ends_inside = self.end > existing.start && self.end <= existing.end;
        let contains = self.start <= existing.start && self.end >= existing.end;
        starts_inside || ends_inside || contains
    }
}

/// Reads the leading number of a free-text duration as hours.
///
/// `"1 hours"`, `"1.5h"` and `"3"` are understood. Anything without a
/// positive leading number falls back to [`DEFAULT_SURGERY_HOURS`]
/// without complaint.
#[must_use]
pub fn parse_duration(text: &str) -> Duration {
    let trimmed = text.trim_start();
    let mut seen_dot = false;
    let numeric_len = trimmed
        .char_indices()
        .take_while(|&(_, c)| {
            if c == '.' && !seen_dot {
                seen_dot = true;
                true
            } else {
                c.is_ascii_digit()
            }
        })
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);

    trimmed
        .get(..numeric_len)
        .and_then(|number| number.parse::<f64>().ok())
        .filter(|hours| hours.is_finite() && *hours > 0.0)
        .and_then(|hours| {
            #[allow(clippy::cast_possible_truncation)]
            let minutes = (hours * 60.0).round() as i64;
            Duration::try_minutes(minutes)
        })
        .filter(|duration| *duration > Duration::zero())
        .unwrap_or_else(|| Duration::hours(DEFAULT_SURGERY_HOURS))
}

/// Returns the first active booking whose interval overlaps `proposed`.
#[must_use]
pub fn first_conflict<'a>(bookings: &'a [Booking], proposed: &TimeRange) -> Option<&'a Booking> {
    bookings
        .iter()
        .filter(|b| b.is_active())
        .find(|b| proposed.overlaps(&b.range()))
}

/// Picks the booking a theater board should show at `now`: the active
/// booking covering `now`, otherwise the earliest upcoming one. At a shared
/// boundary the booking that starts at `now` wins over the one ending.
#[must_use]
pub fn current_or_next<'a>(bookings: &'a [Booking], now: DateTime<Utc>) -> Option<&'a Booking> {
    let active = bookings.iter().filter(|b| b.is_active());
    let covering = active
        .clone()
        .filter(|b| b.start_time <= now && now <= b.end_time)
        .max_by_key(|b| b.start_time);
    covering.or_else(|| {
        active
            .filter(|b| b.start_time > now)
            .min_by_key(|b| b.start_time)
    })
}

/// Decides whether `proposed` may be booked into `theater`.
///
/// # Errors
///
/// Returns [`OpsError::TheaterUnavailable`] when a maintenance or cleaning
/// window covers the start, or [`OpsError::BookingConflict`] naming the
/// first overlapping booking.
pub fn admit_booking(
    theater: &Theater,
    active: &[Booking],
    proposed: &TimeRange,
) -> Result<(), OpsError> {
    if theater.is_closed_at(proposed.start) {
        return Err(OpsError::TheaterUnavailable(format!(
            "{} is in {} until {}",
            theater.code,
            theater.status,
            theater
                .status_until
                .map_or_else(|| "further notice".to_string(), |u| u.to_rfc3339()),
        )));
    }
    if let Some(existing) = first_conflict(active, proposed) {
        return Err(conflict_error(existing.id));
    }
    Ok(())
}

/// Doctor name to look up (or register) for a booking: the requested
/// name, or [`FALLBACK_SURGEON_NAME`] when none was given.
#[must_use]
pub fn surgeon_lookup_name(requested: Option<&str>) -> &str {
    requested
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_SURGEON_NAME)
}

/// Builds the conflict error for an overlapping booking.
#[must_use]
pub fn conflict_error(existing: BookingId) -> OpsError {
    OpsError::BookingConflict(format!("overlaps booking {existing}"))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::{BookingStatus, DoctorId, TheaterId, TheaterStatus};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        let Some(t) = Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).single() else {
            panic!("valid timestamp");
        };
        t
    }

    fn range(sh: u32, sm: u32, eh: u32, em: u32) -> TimeRange {
        let Ok(r) = TimeRange::new(at(sh, sm), at(eh, em)) else {
            panic!("valid range");
        };
        r
    }

    fn booking(theater_id: TheaterId, r: TimeRange, status: BookingStatus) -> Booking {
        Booking {
            id: BookingId::new(),
            theater_id,
            patient_id: None,
            patient_name: "Asha Rao".to_string(),
            procedure: "Appendectomy".to_string(),
            surgeon_id: DoctorId::new(),
            surgeon_name: "Dr. Mehta".to_string(),
            start_time: r.start,
            end_time: r.end,
            status,
            notes: None,
            created_at: at(7, 0),
        }
    }

    #[test]
    fn new_start_inside_existing_overlaps() {
        assert!(range(10, 30, 11, 30).overlaps(&range(9, 0, 11, 0)));
    }

    #[test]
    fn new_end_inside_existing_overlaps() {
        assert!(range(8, 0, 9, 30).overlaps(&range(9, 0, 11, 0)));
    }

    #[test]
    fn new_interval_containing_existing_overlaps() {
        assert!(range(8, 0, 12, 0).overlaps(&range(9, 0, 11, 0)));
    }

    #[test]
    fn disjoint_and_adjacent_intervals_do_not_overlap() {
        let existing = range(9, 0, 11, 0);
        assert!(!range(11, 0, 12, 0).overlaps(&existing));
        assert!(!range(7, 0, 9, 0).overlaps(&existing));
        assert!(!range(13, 0, 14, 0).overlaps(&existing));
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(TimeRange::new(at(11, 0), at(9, 0)).is_err());
        assert!(TimeRange::new(at(9, 0), at(9, 0)).is_err());
    }

    #[test]
    fn parses_leading_number_as_hours() {
        assert_eq!(parse_duration("1 hours"), Duration::hours(1));
        assert_eq!(parse_duration("  3"), Duration::hours(3));
        assert_eq!(parse_duration("1.5h"), Duration::minutes(90));
        assert_eq!(parse_duration("4 hrs 30"), Duration::hours(4));
    }

    #[test]
    fn unreadable_duration_defaults_to_two_hours() {
        for text in ["", "about an hour", "-1 hours", "0", ".", "0.001 h"] {
            assert_eq!(parse_duration(text), Duration::hours(2), "input {text:?}");
        }
    }

    #[test]
    fn blank_surgeon_falls_back_to_on_call() {
        assert_eq!(surgeon_lookup_name(None), FALLBACK_SURGEON_NAME);
        assert_eq!(surgeon_lookup_name(Some("   ")), FALLBACK_SURGEON_NAME);
        assert_eq!(surgeon_lookup_name(Some(" Dr. Iyer ")), "Dr. Iyer");
    }

    #[test]
    fn first_conflict_ignores_closed_bookings() {
        let theater = TheaterId::new();
        let bookings = vec![
            booking(theater, range(9, 0, 11, 0), BookingStatus::Cancelled),
            booking(theater, range(9, 0, 11, 0), BookingStatus::Completed),
        ];
        assert!(first_conflict(&bookings, &range(10, 0, 10, 30)).is_none());
    }

    #[test]
    fn first_conflict_reports_overlapping_booking() {
        let theater = TheaterId::new();
        let existing = booking(theater, range(9, 0, 11, 0), BookingStatus::Scheduled);
        let id = existing.id;
        let bookings = vec![existing];
        let proposed = TimeRange::starting_at(at(10, 30), parse_duration("1 hours"));
        let Ok(proposed) = proposed else {
            panic!("valid range");
        };
        assert_eq!(first_conflict(&bookings, &proposed).map(|b| b.id), Some(id));
    }

    #[test]
    fn current_or_next_prefers_covering_booking() {
        let theater = TheaterId::new();
        let later = booking(theater, range(13, 0, 14, 0), BookingStatus::Scheduled);
        let now_running = booking(theater, range(9, 0, 11, 0), BookingStatus::InProgress);
        let running_id = now_running.id;
        let bookings = vec![later, now_running];
        assert_eq!(
            current_or_next(&bookings, at(10, 0)).map(|b| b.id),
            Some(running_id)
        );
    }

    #[test]
    fn current_or_next_hands_over_at_shared_boundary() {
        let theater = TheaterId::new();
        let ending = booking(theater, range(9, 0, 11, 0), BookingStatus::InProgress);
        let starting = booking(theater, range(11, 0, 12, 0), BookingStatus::Scheduled);
        let starting_id = starting.id;
        let bookings = vec![ending, starting];
        assert_eq!(
            current_or_next(&bookings, at(11, 0)).map(|b| b.id),
            Some(starting_id)
        );
    }

    #[test]
    fn current_or_next_falls_back_to_earliest_upcoming() {
        let theater = TheaterId::new();
        let late = booking(theater, range(15, 0, 16, 0), BookingStatus::Scheduled);
        let early = booking(theater, range(12, 0, 13, 0), BookingStatus::Scheduled);
        let expired = booking(theater, range(7, 0, 8, 0), BookingStatus::Scheduled);
        let early_id = early.id;
        let bookings = vec![late, expired, early];
        assert_eq!(
            current_or_next(&bookings, at(10, 0)).map(|b| b.id),
            Some(early_id)
        );
    }

    #[test]
    fn admit_rejects_booking_during_maintenance() {
        let mut theater = Theater::new("OT-003".into(), "East".into(), at(6, 0));
        theater.status = TheaterStatus::Maintenance;
        theater.status_until = Some(at(12, 0));
        let result = admit_booking(&theater, &[], &range(10, 0, 11, 0));
        assert!(matches!(result, Err(OpsError::TheaterUnavailable(_))));
        assert!(admit_booking(&theater, &[], &range(12, 30, 13, 0)).is_ok());
    }

    #[test]
    fn admit_rejects_overlap() {
        let theater = Theater::new("OT-002".into(), "West".into(), at(6, 0));
        let active = vec![booking(theater.id, range(9, 0, 11, 0), BookingStatus::Scheduled)];
        let result = admit_booking(&theater, &active, &range(10, 30, 11, 30));
        assert!(matches!(result, Err(OpsError::BookingConflict(_))));
    }
}
