//! Domain events reflecting hospital state changes.
//!
//! Every mutation emits a [`HospitalEvent`] through the [`super::EventBus`].
//! Events are broadcast to WebSocket subscribers, filtered by [`Topic`]
//! and, for alerts, by the targeted staff roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    AlertCode, AlertId, BookingId, BookingStatus, DepartmentId, StaffRole, TheaterId,
    TheaterStatus, TokenId, TokenPriority, TokenStatus,
};

/// Feed a WebSocket client can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Theater status changes.
    Theaters,
    /// Booking creation and closure.
    Bookings,
    /// Emergency alerts.
    Alerts,
    /// Department token queues.
    Tokens,
}

text_enum!(Topic, "topic" {
    Theaters => "theaters",
    Bookings => "bookings",
    Alerts => "alerts",
    Tokens => "tokens",
});

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum HospitalEvent {
    /// The persisted label of a theater changed.
    TheaterStatusChanged {
        /// Theater identifier.
        theater_id: TheaterId,
        /// Theater code.
        code: String,
        /// Previous label.
        from: TheaterStatus,
        /// New label.
        to: TheaterStatus,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A surgery was booked.
    BookingCreated {
        /// Booking identifier.
        booking_id: BookingId,
        /// Theater identifier.
        theater_id: TheaterId,
        /// Scheduled start.
        start_time: DateTime<Utc>,
        /// Estimated end.
        end_time: DateTime<Utc>,
        /// Surgeon name.
        surgeon_name: String,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A booking changed status (started, completed, or cancelled).
    BookingUpdated {
        /// Booking identifier.
        booking_id: BookingId,
        /// Theater identifier.
        theater_id: TheaterId,
        /// New booking status.
        status: BookingStatus,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An emergency alert was raised.
    AlertRaised {
        /// Alert identifier.
        alert_id: AlertId,
        /// Incident code.
        code: AlertCode,
        /// Incident location.
        location: String,
        /// Alert message.
        message: String,
        /// 1 (most urgent) to 5.
        priority: u8,
        /// Roles the alert targets; empty means everyone.
        target_roles: Vec<StaffRole>,
        /// Raise timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An emergency alert was resolved.
    AlertResolved {
        /// Alert identifier.
        alert_id: AlertId,
        /// Roles the alert targeted.
        target_roles: Vec<StaffRole>,
        /// Resolution timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A token was issued.
    TokenIssued {
        /// Token identifier.
        token_id: TokenId,
        /// Issuing department.
        department_id: DepartmentId,
        /// Department-scoped number.
        number: i32,
        /// Requested priority.
        priority: TokenPriority,
        /// Issue timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A token moved through its lifecycle.
    TokenStatusChanged {
        /// Token identifier.
        token_id: TokenId,
        /// Issuing department.
        department_id: DepartmentId,
        /// Department-scoped number.
        number: i32,
        /// Previous status.
        from: TokenStatus,
        /// New status.
        to: TokenStatus,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl HospitalEvent {
    /// Returns the feed this event belongs to.
    #[must_use]
    pub const fn topic(&self) -> Topic {
        match self {
            Self::TheaterStatusChanged { .. } => Topic::Theaters,
            Self::BookingCreated { .. } | Self::BookingUpdated { .. } => Topic::Bookings,
            Self::AlertRaised { .. } | Self::AlertResolved { .. } => Topic::Alerts,
            Self::TokenIssued { .. } | Self::TokenStatusChanged { .. } => Topic::Tokens,
        }
    }

    /// Roles an alert event targets. Empty for non-alert events and for
    /// alerts addressed to everyone.
    #[must_use]
    pub fn target_roles(&self) -> &[StaffRole] {
        match self {
            Self::AlertRaised { target_roles, .. } | Self::AlertResolved { target_roles, .. } => {
                target_roles.as_slice()
            }
            _ => &[],
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::TheaterStatusChanged { .. } => "theater_status_changed",
            Self::BookingCreated { .. } => "booking_created",
            Self::BookingUpdated { .. } => "booking_updated",
            Self::AlertRaised { .. } => "alert_raised",
            Self::AlertResolved { .. } => "alert_resolved",
            Self::TokenIssued { .. } => "token_issued",
            Self::TokenStatusChanged { .. } => "token_status_changed",
        }
    }
}
