//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::OpsConfig;
use crate::domain::EventBus;
use crate::persistence::SharedStore;
use crate::service::{AlertService, DirectoryService, QueueService, TheaterService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Theaters, bookings and reconciliation.
    pub theater_service: Arc<TheaterService>,
    /// Department token queues.
    pub queue_service: Arc<QueueService>,
    /// Emergency alerts and the emergency queue.
    pub alert_service: Arc<AlertService>,
    /// Departments, doctors and patients.
    pub directory_service: Arc<DirectoryService>,
    /// Backing store, used directly for health checks.
    pub store: SharedStore,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wires every service over one store and event bus.
    #[must_use]
    pub fn new(store: SharedStore, event_bus: EventBus, config: &OpsConfig) -> Self {
        Self {
            theater_service: Arc::new(TheaterService::new(
                Arc::clone(&store),
                event_bus.clone(),
                config.cleaning_minutes,
            )),
            queue_service: Arc::new(QueueService::new(
                Arc::clone(&store),
                event_bus.clone(),
                config.token_service_minutes,
            )),
            alert_service: Arc::new(AlertService::new(Arc::clone(&store), event_bus.clone())),
            directory_service: Arc::new(DirectoryService::new(Arc::clone(&store))),
            store,
            event_bus,
        }
    }
}
