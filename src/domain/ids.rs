//! Type-safe record identifiers.
//!
//! Every table is keyed by a UUID v4. Each record kind gets its own
//! newtype so a [`TheaterId`] can never be passed where a [`BookingId`]
//! is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a new random identifier (UUID v4).
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Wraps an existing [`uuid::Uuid`].
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`uuid::Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

record_id!(
    /// Identifier of an operating theater.
    TheaterId
);
record_id!(
    /// Identifier of a surgery booking.
    BookingId
);
record_id!(
    /// Identifier of an emergency alert.
    AlertId
);
record_id!(
    /// Identifier of a queue token.
    TokenId
);
record_id!(
    /// Identifier of a patient record.
    PatientId
);
record_id!(
    /// Identifier of a doctor record.
    DoctorId
);
record_id!(
    /// Identifier of a department.
    DepartmentId
);
