//! Theater service: theater registry, surgery scheduling, and status
//! reconciliation.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::domain::schedule::{self, TimeRange};
use crate::domain::status_deriver::{self, TheaterReading, Transition};
use crate::domain::{
    Booking, BookingId, BookingStatus, EventBus, HospitalEvent, PatientId, Theater, TheaterId,
    TheaterStatus,
};
use crate::error::OpsError;
use crate::persistence::{DirectoryStore, NewBooking, SharedStore, SurgeonRequest, TheaterStore};

/// A theater together with what its board shows right now.
#[derive(Debug, Clone)]
pub struct TheaterView {
    /// Stored row.
    pub theater: Theater,
    /// Derived display state.
    pub reading: TheaterReading,
}

/// Changes requested for a theater.
#[derive(Debug, Clone, Default)]
pub struct TheaterUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New lifecycle label.
    pub status: Option<TheaterStatus>,
    /// End of a maintenance or cleaning window; ignored for open labels.
    pub status_until: Option<DateTime<Utc>>,
}

/// A surgery to schedule.
#[derive(Debug, Clone, Default)]
pub struct SurgeryRequest {
    /// Registered patient, if any.
    pub patient_id: Option<PatientId>,
    /// Patient name; taken from the patient record when blank.
    pub patient_name: String,
    /// Procedure description.
    pub procedure: String,
    /// Surgeon selection.
    pub surgeon: SurgeonRequest,
    /// Requested start.
    pub start_time: Option<DateTime<Utc>>,
    /// Free-text duration, e.g. `"1.5 hours"`.
    pub duration: String,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// Outcome of a conflict check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictCheck {
    /// Interval that was checked.
    pub range: TimeRange,
    /// First active booking overlapping it.
    pub conflicting_booking: Option<BookingId>,
}

impl ConflictCheck {
    /// Returns `true` if the interval overlaps an active booking.
    #[must_use]
    pub const fn has_conflict(&self) -> bool {
        self.conflicting_booking.is_some()
    }
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Theaters examined.
    pub theaters: usize,
    /// Bookings and theater labels changed.
    pub changes: usize,
}

/// Orchestrates theaters and bookings and emits their events.
#[derive(Debug, Clone)]
pub struct TheaterService {
    store: SharedStore,
    event_bus: EventBus,
    cleaning: Duration,
}

impl TheaterService {
    /// Creates a new `TheaterService`; completed surgeries leave the
    /// theater in cleaning for `cleaning_minutes`.
    #[must_use]
    pub fn new(store: SharedStore, event_bus: EventBus, cleaning_minutes: u32) -> Self {
        Self {
            store,
            event_bus,
            cleaning: Duration::minutes(i64::from(cleaning_minutes)),
        }
    }

    /// Registers a theater.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidRequest`] for a blank code or name,
    /// [`OpsError::Duplicate`] for a code already in use.
    pub async fn create_theater(
        &self,
        code: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<TheaterView, OpsError> {
        let code = required("code", code)?;
        let name = required("name", name)?;
        let theater = self
            .store
            .insert_theater(Theater::new(code, name, now))
            .await?;
        tracing::info!(theater_id = %theater.id, code = %theater.code, "theater created");
        Ok(view(theater, &[], now))
    }

    /// Lists every theater with its derived status at `now`.
    ///
    /// # Errors
    ///
    /// Storage failures.
    pub async fn list_theaters(&self, now: DateTime<Utc>) -> Result<Vec<TheaterView>, OpsError> {
        let theaters = self.store.list_theaters().await?;
        let mut by_theater = group_by_theater(self.store.list_active_bookings().await?);
        Ok(theaters
            .into_iter()
            .map(|theater| {
                let bookings = by_theater.remove(&theater.id).unwrap_or_default();
                view(theater, &bookings, now)
            })
            .collect())
    }

    /// Fetches one theater with its derived status at `now`.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    pub async fn get_theater(
        &self,
        id: TheaterId,
        now: DateTime<Utc>,
    ) -> Result<TheaterView, OpsError> {
        let theater = self.store.get_theater(id).await?;
        let bookings = self.store.list_bookings(id, true).await?;
        Ok(view(theater, &bookings, now))
    }

    /// Renames a theater or sets its lifecycle label, e.g. putting it into
    /// maintenance until a given time.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist, or
    /// [`OpsError::InvalidRequest`] for a blank name.
    pub async fn update_theater(
        &self,
        id: TheaterId,
        update: TheaterUpdate,
        now: DateTime<Utc>,
    ) -> Result<TheaterView, OpsError> {
        let mut theater = self.store.get_theater(id).await?;
        let previous = theater.status;

        if let Some(name) = update.name {
            theater.name = required("name", &name)?;
        }
        if let Some(status) = update.status {
            theater.status = status;
            theater.status_until = update.status_until;
        } else if update.status_until.is_some() {
            theater.status_until = update.status_until;
        }
        if !theater.status.is_closed() {
            theater.status_until = None;
        }
        theater.updated_at = now;

        let theater = self.store.update_theater(theater).await?;
        if theater.status != previous {
            self.publish_status_change(&theater, previous, now);
        }
        tracing::info!(theater_id = %id, status = %theater.status, "theater updated");

        let bookings = self.store.list_bookings(id, true).await?;
        Ok(view(theater, &bookings, now))
    }

    /// Deletes a theater together with its bookings.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    pub async fn delete_theater(&self, id: TheaterId) -> Result<(), OpsError> {
        self.store.delete_theater(id).await?;
        tracing::info!(theater_id = %id, "theater deleted");
        Ok(())
    }

    /// Checks whether `[start, start + duration)` overlaps an active
    /// booking of the theater. The duration text is read by
    /// [`schedule::parse_duration`].
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if the theater does not exist.
    pub async fn check_conflict(
        &self,
        id: TheaterId,
        start: DateTime<Utc>,
        duration: &str,
    ) -> Result<ConflictCheck, OpsError> {
        let _ = self.store.get_theater(id).await?;
        let range = TimeRange::starting_at(start, schedule::parse_duration(duration))?;
        let active = self.store.list_bookings(id, true).await?;
        let conflicting_booking = schedule::first_conflict(&active, &range).map(|b| b.id);
        tracing::debug!(theater_id = %id, conflict = conflicting_booking.is_some(), "conflict check");
        Ok(ConflictCheck {
            range,
            conflicting_booking,
        })
    }

    /// Books a surgery into a theater.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidRequest`] for missing fields,
    /// [`OpsError::NotFound`] for an unknown theater or patient,
    /// [`OpsError::TheaterUnavailable`] inside a maintenance or cleaning
    /// window, [`OpsError::BookingConflict`] on overlap.
    pub async fn schedule_surgery(
        &self,
        theater_id: TheaterId,
        request: SurgeryRequest,
        now: DateTime<Utc>,
    ) -> Result<Booking, OpsError> {
        let before = self.store.get_theater(theater_id).await?;

        let mut patient_name = request.patient_name.trim().to_string();
        if patient_name.is_empty()
            && let Some(patient_id) = request.patient_id
        {
            patient_name = self.store.get_patient(patient_id).await?.name;
        }
        let patient_name = required("patient_name", &patient_name)?;
        let procedure = required("procedure", &request.procedure)?;
        let start = request
            .start_time
            .ok_or_else(|| OpsError::InvalidRequest("start_time is required".to_string()))?;
        let range = TimeRange::starting_at(start, schedule::parse_duration(&request.duration))?;

        let booking = self
            .store
            .create_booking(NewBooking {
                theater_id,
                patient_id: request.patient_id,
                patient_name,
                procedure,
                surgeon: request.surgeon,
                range,
                notes: request.notes.filter(|n| !n.trim().is_empty()),
                created_at: now,
            })
            .await?;

        let _ = self.event_bus.publish(HospitalEvent::BookingCreated {
            booking_id: booking.id,
            theater_id,
            start_time: booking.start_time,
            end_time: booking.end_time,
            surgeon_name: booking.surgeon_name.clone(),
            timestamp: now,
        });
        if before.status == TheaterStatus::Available {
            let mut after = before;
            after.status = TheaterStatus::Scheduled;
            self.publish_status_change(&after, TheaterStatus::Available, now);
        }

        tracing::info!(
            booking_id = %booking.id,
            %theater_id,
            start = %booking.start_time,
            end = %booking.end_time,
            surgeon = %booking.surgeon_name,
            "surgery scheduled"
        );
        Ok(booking)
    }

    /// Lists a theater's bookings by start time.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if the theater does not exist.
    pub async fn list_bookings(
        &self,
        theater_id: TheaterId,
        active_only: bool,
    ) -> Result<Vec<Booking>, OpsError> {
        let _ = self.store.get_theater(theater_id).await?;
        self.store.list_bookings(theater_id, active_only).await
    }

    /// Cancels an active booking and refreshes the theater label.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`], or [`OpsError::InvalidTransition`] when the
    /// booking is already completed or cancelled.
    pub async fn cancel_booking(
        &self,
        id: BookingId,
        now: DateTime<Utc>,
    ) -> Result<Booking, OpsError> {
        let booking = self.close_booking(id, BookingStatus::Cancelled, now).await?;
        let theater = self.store.get_theater(booking.theater_id).await?;
        let active = self.store.list_bookings(theater.id, true).await?;
        self.reconcile_theater(theater, active, now).await?;
        tracing::info!(booking_id = %id, "booking cancelled");
        Ok(booking)
    }

    /// Completes a booking that has started. The theater goes into
    /// cleaning only when that booking is the one its board shows;
    /// otherwise the label is reconciled against the remaining bookings.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`], or [`OpsError::InvalidTransition`] when the
    /// booking has not started yet or is already completed or cancelled.
    pub async fn complete_booking(
        &self,
        id: BookingId,
        now: DateTime<Utc>,
    ) -> Result<Booking, OpsError> {
        let current = self.store.get_booking(id).await?;
        if current.status == BookingStatus::Scheduled && current.start_time > now {
            return Err(OpsError::transition(current.status, BookingStatus::Completed));
        }
        let active = self.store.list_bookings(current.theater_id, true).await?;
        let on_board = schedule::current_or_next(&active, now).is_some_and(|b| b.id == id);

        let booking = self.close_booking(id, BookingStatus::Completed, now).await?;
        let theater = self.store.get_theater(booking.theater_id).await?;
        if on_board {
            let previous = theater.status;
            let theater = self
                .store
                .set_theater_status(
                    theater.id,
                    TheaterStatus::Cleaning,
                    now.checked_add_signed(self.cleaning),
                    now,
                )
                .await?;
            if previous != TheaterStatus::Cleaning {
                self.publish_status_change(&theater, previous, now);
            }
        } else {
            let remaining = active.into_iter().filter(|b| b.id != id).collect();
            self.reconcile_theater(theater, remaining, now).await?;
        }
        tracing::info!(booking_id = %id, theater_id = %booking.theater_id, on_board, "booking completed");
        Ok(booking)
    }

    /// Applies every transition the status deriver observes at `now`:
    /// overdue bookings complete, due bookings start, and theater labels
    /// follow the derived status.
    ///
    /// # Errors
    ///
    /// Storage failures while loading theaters or bookings. Failures on a
    /// single theater are logged and skipped.
    pub async fn reconcile(&self, now: DateTime<Utc>) -> Result<ReconcileReport, OpsError> {
        let theaters = self.store.list_theaters().await?;
        let mut by_theater = group_by_theater(self.store.list_active_bookings().await?);
        let mut report = ReconcileReport {
            theaters: theaters.len(),
            changes: 0,
        };
        for theater in theaters {
            let theater_id = theater.id;
            let bookings = by_theater.remove(&theater_id).unwrap_or_default();
            match self.reconcile_theater(theater, bookings, now).await {
                Ok(changes) => report.changes = report.changes.saturating_add(changes),
                Err(e) => {
                    tracing::error!(%theater_id, error = %e, "theater reconciliation failed");
                }
            }
        }
        Ok(report)
    }

    async fn reconcile_theater(
        &self,
        theater: Theater,
        mut bookings: Vec<Booking>,
        now: DateTime<Utc>,
    ) -> Result<usize, OpsError> {
        let mut changes = 0;

        let mut expired = Vec::new();
        for booking in &bookings {
            if let Some(Transition::BookingExpired(id)) =
                status_deriver::derive(&theater, Some(booking), now).transition
            {
                expired.push((id, booking.status));
            }
        }
        for (id, status) in expired {
            if self
                .advance_booking(&theater, id, status, BookingStatus::Completed, now)
                .await?
            {
                changes += 1;
            }
            bookings.retain(|b| b.id != id);
        }

        let reading =
            status_deriver::derive(&theater, schedule::current_or_next(&bookings, now), now);
        if let Some(Transition::BookingStarted(id)) = reading.transition
            && self
                .advance_booking(
                    &theater,
                    id,
                    BookingStatus::Scheduled,
                    BookingStatus::InProgress,
                    now,
                )
                .await?
        {
            changes += 1;
        }

        let label = reading.status.storage_label();
        if label != theater.status || (!label.is_closed() && theater.status_until.is_some()) {
            let until = if label.is_closed() {
                theater.status_until
            } else {
                None
            };
            let updated = self
                .store
                .set_theater_status(theater.id, label, until, now)
                .await?;
            if label != theater.status {
                self.publish_status_change(&updated, theater.status, now);
                tracing::info!(
                    theater_id = %theater.id,
                    from = %theater.status,
                    to = %label,
                    "theater status reconciled"
                );
                changes += 1;
            }
        }
        Ok(changes)
    }

    /// Moves a booking by compare-and-set. Returns `false` when another
    /// writer moved it first.
    async fn advance_booking(
        &self,
        theater: &Theater,
        id: BookingId,
        expected: BookingStatus,
        next: BookingStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, OpsError> {
        match self.store.transition_booking(id, expected, next).await {
            Ok(_) => {
                let _ = self.event_bus.publish(HospitalEvent::BookingUpdated {
                    booking_id: id,
                    theater_id: theater.id,
                    status: next,
                    timestamp: now,
                });
                tracing::info!(booking_id = %id, code = %theater.code, status = %next, "booking advanced");
                Ok(true)
            }
            Err(OpsError::InvalidTransition { from, .. }) => {
                tracing::debug!(booking_id = %id, %from, "booking already moved");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn close_booking(
        &self,
        id: BookingId,
        next: BookingStatus,
        now: DateTime<Utc>,
    ) -> Result<Booking, OpsError> {
        let current = self.store.get_booking(id).await?;
        if !current.is_active() {
            return Err(OpsError::transition(current.status, next));
        }
        let booking = self.store.transition_booking(id, current.status, next).await?;
        let _ = self.event_bus.publish(HospitalEvent::BookingUpdated {
            booking_id: id,
            theater_id: booking.theater_id,
            status: next,
            timestamp: now,
        });
        Ok(booking)
    }

    fn publish_status_change(&self, theater: &Theater, from: TheaterStatus, now: DateTime<Utc>) {
        let _ = self.event_bus.publish(HospitalEvent::TheaterStatusChanged {
            theater_id: theater.id,
            code: theater.code.clone(),
            from,
            to: theater.status,
            timestamp: now,
        });
    }
}

fn required(field: &str, value: &str) -> Result<String, OpsError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OpsError::InvalidRequest(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn group_by_theater(bookings: Vec<Booking>) -> HashMap<TheaterId, Vec<Booking>> {
    let mut grouped: HashMap<TheaterId, Vec<Booking>> = HashMap::new();
    for booking in bookings {
        grouped.entry(booking.theater_id).or_default().push(booking);
    }
    grouped
}

fn view(theater: Theater, bookings: &[Booking], now: DateTime<Utc>) -> TheaterView {
    let reading =
        status_deriver::derive(&theater, schedule::current_or_next(bookings, now), now);
    TheaterView { theater, reading }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::DisplayStatus;
    use crate::service::memory_store;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        let Some(t) = Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).single() else {
            panic!("valid timestamp");
        };
        t
    }

    fn make_service() -> TheaterService {
        TheaterService::new(memory_store(), EventBus::new(64), 30)
    }

    fn surgery(start: DateTime<Utc>, duration: &str) -> SurgeryRequest {
        SurgeryRequest {
            patient_name: "Asha Rao".into(),
            procedure: "Appendectomy".into(),
            surgeon: SurgeonRequest {
                id: None,
                name: Some("Dr. Mehta".into()),
            },
            start_time: Some(start),
            duration: duration.into(),
            ..SurgeryRequest::default()
        }
    }

    async fn theater_with_booking(service: &TheaterService) -> (TheaterId, Booking) {
        let Ok(created) = service.create_theater("OT-002", "West", at(6, 0)).await else {
            panic!("create failed");
        };
        let id = created.theater.id;
        let Ok(booking) = service
            .schedule_surgery(id, surgery(at(9, 0), "2 hours"), at(7, 0))
            .await
        else {
            panic!("schedule failed");
        };
        (id, booking)
    }

    #[tokio::test]
    async fn occupied_theater_reports_progress() {
        let service = make_service();
        let (id, _) = theater_with_booking(&service).await;
        let Ok(view) = service.get_theater(id, at(10, 0)).await else {
            panic!("get failed");
        };
        assert_eq!(view.reading.status, DisplayStatus::Occupied);
        assert_eq!(view.reading.elapsed_minutes, Some(60));
        assert_eq!(view.reading.progress_percent, Some(50));
    }

    #[tokio::test]
    async fn conflict_check_reports_overlap() {
        let service = make_service();
        let (id, booking) = theater_with_booking(&service).await;
        let Ok(check) = service.check_conflict(id, at(10, 30), "1 hours").await else {
            panic!("check failed");
        };
        assert!(check.has_conflict());
        assert_eq!(check.conflicting_booking, Some(booking.id));
        assert_eq!(check.range.end, at(11, 30));

        let Ok(free) = service.check_conflict(id, at(11, 0), "1 hours").await else {
            panic!("check failed");
        };
        assert!(!free.has_conflict());
    }

    #[tokio::test]
    async fn schedule_requires_patient_and_start() {
        let service = make_service();
        let Ok(created) = service.create_theater("OT-001", "East", at(6, 0)).await else {
            panic!("create failed");
        };
        let mut request = surgery(at(9, 0), "1h");
        request.patient_name = "  ".into();
        let result = service
            .schedule_surgery(created.theater.id, request, at(7, 0))
            .await;
        assert!(matches!(result, Err(OpsError::InvalidRequest(_))));

        let mut request = surgery(at(9, 0), "1h");
        request.start_time = None;
        let result = service
            .schedule_surgery(created.theater.id, request, at(7, 0))
            .await;
        assert!(matches!(result, Err(OpsError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn maintenance_window_blocks_scheduling() {
        let service = make_service();
        let Ok(created) = service.create_theater("OT-003", "North", at(6, 0)).await else {
            panic!("create failed");
        };
        let id = created.theater.id;
        let update = TheaterUpdate {
            status: Some(TheaterStatus::Maintenance),
            status_until: Some(at(12, 0)),
            ..TheaterUpdate::default()
        };
        let Ok(view) = service.update_theater(id, update, at(8, 0)).await else {
            panic!("update failed");
        };
        assert_eq!(view.reading.status, DisplayStatus::Maintenance);

        let result = service
            .schedule_surgery(id, surgery(at(10, 0), "1h"), at(8, 0))
            .await;
        assert!(matches!(result, Err(OpsError::TheaterUnavailable(_))));
    }

    #[tokio::test]
    async fn reconcile_starts_then_completes_booking() {
        let service = make_service();
        let (id, booking) = theater_with_booking(&service).await;
        let mut rx = service.event_bus.subscribe();

        let Ok(report) = service.reconcile(at(9, 30)).await else {
            panic!("reconcile failed");
        };
        assert_eq!(report.theaters, 1);
        assert_eq!(report.changes, 2);
        let Ok(started) = service.store.get_booking(booking.id).await else {
            panic!("booking missing");
        };
        assert_eq!(started.status, BookingStatus::InProgress);
        let Ok(HospitalEvent::BookingUpdated { status, .. }) = rx.recv().await else {
            panic!("expected booking event");
        };
        assert_eq!(status, BookingStatus::InProgress);

        let Ok(_) = service.reconcile(at(11, 30)).await else {
            panic!("reconcile failed");
        };
        let Ok(done) = service.store.get_booking(booking.id).await else {
            panic!("booking missing");
        };
        assert_eq!(done.status, BookingStatus::Completed);
        let Ok(theater) = service.store.get_theater(id).await else {
            panic!("theater missing");
        };
        assert_eq!(theater.status, TheaterStatus::Available);
    }

    #[tokio::test]
    async fn reconcile_is_idempotent() {
        let service = make_service();
        let _ = theater_with_booking(&service).await;
        let _ = service.reconcile(at(9, 30)).await;
        let Ok(again) = service.reconcile(at(9, 31)).await else {
            panic!("reconcile failed");
        };
        assert_eq!(again.changes, 0);
    }

    #[tokio::test]
    async fn complete_booking_starts_cleaning() {
        let service = make_service();
        let (id, booking) = theater_with_booking(&service).await;
        let Ok(done) = service.complete_booking(booking.id, at(10, 15)).await else {
            panic!("complete failed");
        };
        assert_eq!(done.status, BookingStatus::Completed);

        let Ok(view) = service.get_theater(id, at(10, 30)).await else {
            panic!("get failed");
        };
        assert_eq!(view.reading.status, DisplayStatus::Cleaning);
        assert_eq!(view.theater.status_until, Some(at(10, 45)));

        let again = service.complete_booking(booking.id, at(10, 20)).await;
        assert!(matches!(again, Err(OpsError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn completing_booking_off_the_board_keeps_theater_occupied() {
        let service = make_service();
        let (id, running) = theater_with_booking(&service).await;
        let Ok(later) = service
            .schedule_surgery(id, surgery(at(13, 0), "1 hours"), at(7, 0))
            .await
        else {
            panic!("schedule failed");
        };
        let Ok(_) = service.reconcile(at(9, 30)).await else {
            panic!("reconcile failed");
        };

        let early = service.complete_booking(later.id, at(10, 0)).await;
        assert!(matches!(early, Err(OpsError::InvalidTransition { .. })));

        let Ok(_) = service
            .store
            .transition_booking(later.id, BookingStatus::Scheduled, BookingStatus::InProgress)
            .await
        else {
            panic!("transition failed");
        };
        let Ok(done) = service.complete_booking(later.id, at(10, 0)).await else {
            panic!("complete failed");
        };
        assert_eq!(done.status, BookingStatus::Completed);

        let Ok(view) = service.get_theater(id, at(10, 0)).await else {
            panic!("get failed");
        };
        assert_eq!(view.reading.status, DisplayStatus::Occupied);
        assert_eq!(view.theater.status, TheaterStatus::InProgress);
        assert_eq!(view.theater.status_until, None);
        assert_eq!(view.reading.booking_id, Some(running.id));

        let extra = service
            .schedule_surgery(id, surgery(at(11, 0), "1h"), at(10, 20))
            .await;
        assert!(extra.is_ok());
    }

    #[tokio::test]
    async fn cancel_frees_theater() {
        let service = make_service();
        let (id, booking) = theater_with_booking(&service).await;
        let Ok(_) = service.cancel_booking(booking.id, at(8, 0)).await else {
            panic!("cancel failed");
        };
        let Ok(theater) = service.store.get_theater(id).await else {
            panic!("theater missing");
        };
        assert_eq!(theater.status, TheaterStatus::Available);
        let retry = service.cancel_booking(booking.id, at(8, 5)).await;
        assert!(matches!(retry, Err(OpsError::InvalidTransition { .. })));
    }
}
