//! Alert service: emergency alerts and the emergency queue.

use chrono::{DateTime, Utc};

use crate::domain::alert::validate_priority;
use crate::domain::emergency_queue::{self, EmergencyEntry};
use crate::domain::{
    AlertCode, AlertId, AlertStatus, EmergencyAlert, EventBus, HospitalEvent, StaffRole,
};
use crate::error::OpsError;
use crate::persistence::{AlertStore, DirectoryStore, SharedStore};

/// An alert to raise.
#[derive(Debug, Clone)]
pub struct NewAlert {
    /// Incident code.
    pub code: AlertCode,
    /// Where it happened.
    pub location: String,
    /// What happened.
    pub message: String,
    /// 1 (most urgent) to 5.
    pub priority: u8,
    /// Roles to notify; empty notifies everyone.
    pub target_roles: Vec<StaffRole>,
}

/// Raises, lists and resolves alerts, and assembles the emergency queue.
#[derive(Debug, Clone)]
pub struct AlertService {
    store: SharedStore,
    event_bus: EventBus,
}

impl AlertService {
    /// Creates a new `AlertService`.
    #[must_use]
    pub fn new(store: SharedStore, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    /// Raises an alert and broadcasts it to the targeted roles.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidRequest`] for a priority outside 1..=5 or a blank
    /// location or message.
    pub async fn raise(
        &self,
        request: NewAlert,
        now: DateTime<Utc>,
    ) -> Result<EmergencyAlert, OpsError> {
        let priority = validate_priority(request.priority)?;
        let location = request.location.trim().to_string();
        let message = request.message.trim().to_string();
        if location.is_empty() || message.is_empty() {
            return Err(OpsError::InvalidRequest(
                "alert location and message must not be empty".to_string(),
            ));
        }
        let mut target_roles = request.target_roles;
        target_roles.sort_by_key(StaffRole::as_str);
        target_roles.dedup();

        let alert = self
            .store
            .insert_alert(EmergencyAlert {
                id: AlertId::new(),
                code: request.code,
                location,
                message,
                priority,
                status: AlertStatus::Active,
                target_roles,
                created_at: now,
                resolved_at: None,
            })
            .await?;

        let _ = self.event_bus.publish(HospitalEvent::AlertRaised {
            alert_id: alert.id,
            code: alert.code,
            location: alert.location.clone(),
            message: alert.message.clone(),
            priority: alert.priority,
            target_roles: alert.target_roles.clone(),
            timestamp: now,
        });
        tracing::warn!(
            alert_id = %alert.id,
            code = %alert.code,
            location = %alert.location,
            priority = alert.priority,
            "emergency alert raised"
        );
        Ok(alert)
    }

    /// Lists alerts by priority then age.
    ///
    /// # Errors
    ///
    /// Storage failures.
    pub async fn list(&self, status: Option<AlertStatus>) -> Result<Vec<EmergencyAlert>, OpsError> {
        self.store.list_alerts(status).await
    }

    /// Fetches an alert.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    pub async fn get(&self, id: AlertId) -> Result<EmergencyAlert, OpsError> {
        self.store.get_alert(id).await
    }

    /// Resolves an active alert.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`], or [`OpsError::InvalidTransition`] if it is
    /// already resolved.
    pub async fn resolve(
        &self,
        id: AlertId,
        now: DateTime<Utc>,
    ) -> Result<EmergencyAlert, OpsError> {
        let alert = self.store.resolve_alert(id, now).await?;
        let _ = self.event_bus.publish(HospitalEvent::AlertResolved {
            alert_id: alert.id,
            target_roles: alert.target_roles.clone(),
            timestamp: now,
        });
        tracing::info!(alert_id = %alert.id, code = %alert.code, "emergency alert resolved");
        Ok(alert)
    }

    /// Assembles the emergency board from active alerts and flagged
    /// patients.
    ///
    /// # Errors
    ///
    /// Storage failures.
    pub async fn emergency_queue(&self) -> Result<Vec<EmergencyEntry>, OpsError> {
        let alerts = self.store.list_alerts(Some(AlertStatus::Active)).await?;
        let patients = self.store.list_flagged_patients().await?;
        Ok(emergency_queue::assemble(&alerts, &patients))
    }
}
