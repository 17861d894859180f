//! Service layer: business logic orchestration.
//!
//! Each service holds the shared [`crate::persistence::HospitalStore`]
//! and the [`super::domain::EventBus`]. Mutations follow the same
//! pattern: validate → call the store → emit events → log → return.
//! [`status_reconciler`] runs the [`TheaterService`] reconciliation on a
//! timer.

pub mod alert_service;
pub mod directory_service;
pub mod queue_service;
pub mod status_reconciler;
pub mod theater_service;

pub use alert_service::{AlertService, NewAlert};
pub use directory_service::{DirectoryService, NewPatient, PatientUpdate};
pub use queue_service::QueueService;
pub use theater_service::{
    ConflictCheck, ReconcileReport, SurgeryRequest, TheaterService, TheaterUpdate, TheaterView,
};

/// A fresh in-memory store for service unit tests.
#[cfg(test)]
pub(crate) fn memory_store() -> crate::persistence::SharedStore {
    std::sync::Arc::new(crate::persistence::MemoryStore::new())
}
