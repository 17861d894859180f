//! Domain layer: hospital records, scheduling rules, and the event system.
//!
//! Everything here is synchronous and free of I/O except the
//! [`EventBus`]. The theater status deriver, interval overlap test, token
//! state machine and emergency queue assembly all take the current time
//! (or the rows) as arguments so they can be exercised without a store.

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum whose
/// variants are persisted as lowercase text.
macro_rules! text_enum {
    ($name:ident, $label:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Returns the canonical text form used on the wire and in storage.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::OpsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(crate::error::OpsError::InvalidRequest(format!(
                        concat!("unknown ", $label, ": {}"),
                        other
                    ))),
                }
            }
        }
    };
}

pub mod alert;
pub mod directory;
pub mod emergency_queue;
pub mod event_bus;
pub mod hospital_event;
pub mod ids;
pub mod role;
pub mod schedule;
pub mod status_deriver;
pub mod theater;
pub mod token;

pub use alert::{AlertCode, AlertStatus, EmergencyAlert};
pub use directory::{Department, Doctor, Patient};
pub use emergency_queue::{EmergencyEntry, EmergencySource, Severity};
pub use event_bus::EventBus;
pub use hospital_event::{HospitalEvent, Topic};
pub use ids::{AlertId, BookingId, DepartmentId, DoctorId, PatientId, TheaterId, TokenId};
pub use role::StaffRole;
pub use schedule::TimeRange;
pub use status_deriver::{DisplayStatus, TheaterReading, Transition};
pub use theater::{Booking, BookingStatus, Occupant, Theater, TheaterStatus};
pub use token::{Token, TokenPriority, TokenStatus};
