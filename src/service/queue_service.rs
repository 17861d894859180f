//! Queue service: department token issue, ordering, and transitions.

use chrono::{DateTime, Utc};

use crate::domain::token::{self, sort_queue};
use crate::domain::{
    DepartmentId, EventBus, HospitalEvent, PatientId, Token, TokenId, TokenPriority, TokenStatus,
};
use crate::error::OpsError;
use crate::persistence::{DirectoryStore, NewToken, SharedStore, TokenStore};

/// Attempts `call_next` makes when another caller takes the head first.
const CALL_NEXT_ATTEMPTS: usize = 3;

/// Orchestrates department token queues and emits token events.
#[derive(Debug, Clone)]
pub struct QueueService {
    store: SharedStore,
    event_bus: EventBus,
    minutes_per_token: u32,
}

impl QueueService {
    /// Creates a new `QueueService`. Each waiting token ahead adds
    /// `minutes_per_token` to a new token's wait estimate.
    #[must_use]
    pub fn new(store: SharedStore, event_bus: EventBus, minutes_per_token: u32) -> Self {
        Self {
            store,
            event_bus,
            minutes_per_token,
        }
    }

    /// Issues the department's next token to a patient.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if the department or patient does not exist.
    pub async fn issue(
        &self,
        department_id: DepartmentId,
        patient_id: PatientId,
        priority: TokenPriority,
        now: DateTime<Utc>,
    ) -> Result<Token, OpsError> {
        let token = self
            .store
            .issue_token(NewToken {
                patient_id,
                department_id,
                priority,
                minutes_per_token: self.minutes_per_token,
                created_at: now,
            })
            .await?;

        let _ = self.event_bus.publish(HospitalEvent::TokenIssued {
            token_id: token.id,
            department_id,
            number: token.number,
            priority,
            timestamp: now,
        });
        tracing::info!(
            token_id = %token.id,
            %department_id,
            number = token.number,
            %priority,
            wait_minutes = token.estimated_wait_minutes,
            "token issued"
        );
        Ok(token)
    }

    /// Returns the department's tokens in serving order. Without a status
    /// filter only open tokens (waiting, called, in progress) are listed.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if the department does not exist.
    pub async fn queue(
        &self,
        department_id: DepartmentId,
        status: Option<TokenStatus>,
    ) -> Result<Vec<Token>, OpsError> {
        let _ = self.store.get_department(department_id).await?;
        let mut tokens = match status {
            Some(status) => self.store.list_tokens(department_id, &[status]).await?,
            None => {
                self.store
                    .list_tokens(department_id, &TokenStatus::OPEN)
                    .await?
            }
        };
        sort_queue(&mut tokens);
        Ok(tokens)
    }

    /// Fetches a token.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if it does not exist.
    pub async fn get(&self, id: TokenId) -> Result<Token, OpsError> {
        self.store.get_token(id).await
    }

    /// Moves a token to `to` if the state machine allows it.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`], or [`OpsError::InvalidTransition`] when the
    /// move is not allowed or another update got there first.
    pub async fn update_status(
        &self,
        id: TokenId,
        to: TokenStatus,
        now: DateTime<Utc>,
    ) -> Result<Token, OpsError> {
        let current = self.store.get_token(id).await?;
        current.status.validate_transition(to)?;
        self.apply(&current, to, now).await
    }

    /// Cancels a waiting, called, or in-progress token.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`], or [`OpsError::InvalidTransition`] for a
    /// completed or already-cancelled token.
    pub async fn cancel(&self, id: TokenId, now: DateTime<Utc>) -> Result<Token, OpsError> {
        self.update_status(id, TokenStatus::Cancelled, now).await
    }

    /// Calls the head of the department's waiting queue.
    ///
    /// # Errors
    ///
    /// [`OpsError::NotFound`] if the department does not exist or nobody is
    /// waiting.
    pub async fn call_next(
        &self,
        department_id: DepartmentId,
        now: DateTime<Utc>,
    ) -> Result<Token, OpsError> {
        let _ = self.store.get_department(department_id).await?;
        for _ in 0..CALL_NEXT_ATTEMPTS {
            let waiting = self
                .store
                .list_tokens(department_id, &[TokenStatus::Waiting])
                .await?;
            let Some(next) = token::next_waiting(&waiting) else {
                return Err(OpsError::not_found("waiting token in department", department_id));
            };
            match self.apply(next, TokenStatus::Called, now).await {
                Err(OpsError::InvalidTransition { .. }) => {
                    tracing::debug!(token_id = %next.id, "token taken by another caller, retrying");
                }
                other => return other,
            }
        }
        Err(OpsError::Internal(format!(
            "could not call next token in department {department_id}"
        )))
    }

    async fn apply(
        &self,
        current: &Token,
        to: TokenStatus,
        now: DateTime<Utc>,
    ) -> Result<Token, OpsError> {
        let token = self
            .store
            .transition_token(current.id, current.status, to, now)
            .await?;
        let _ = self.event_bus.publish(HospitalEvent::TokenStatusChanged {
            token_id: token.id,
            department_id: token.department_id,
            number: token.number,
            from: current.status,
            to,
            timestamp: now,
        });
        tracing::info!(
            token_id = %token.id,
            number = token.number,
            from = %current.status,
            %to,
            "token status changed"
        );
        Ok(token)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::domain::{Department, Patient};
    use crate::service::memory_store;

    async fn setup() -> (QueueService, DepartmentId, PatientId) {
        let store = memory_store();
        let now = Utc::now();
        let department = Department {
            id: DepartmentId::new(),
            name: "Orthopedics".into(),
            description: None,
            created_at: now,
        };
        let patient = Patient {
            id: PatientId::new(),
            name: "Farah".into(),
            age: Some(33),
            condition: "fracture".into(),
            department_id: Some(department.id),
            created_at: now,
            updated_at: now,
        };
        let ids = (department.id, patient.id);
        let Ok(_) = store.insert_department(department).await else {
            panic!("department insert failed");
        };
        let Ok(_) = store.insert_patient(patient).await else {
            panic!("patient insert failed");
        };
        (QueueService::new(store, EventBus::new(64), 10), ids.0, ids.1)
    }

    #[tokio::test]
    async fn token_walks_the_full_lifecycle() {
        let (service, department, patient) = setup().await;
        let now = Utc::now();
        let Ok(token) = service
            .issue(department, patient, TokenPriority::Normal, now)
            .await
        else {
            panic!("issue failed");
        };
        assert_eq!(token.number, 1);
        for next in [
            TokenStatus::Called,
            TokenStatus::InProgress,
            TokenStatus::Completed,
        ] {
            let Ok(moved) = service.update_status(token.id, next, now).await else {
                panic!("transition to {next} failed");
            };
            assert_eq!(moved.status, next);
        }
    }

    #[tokio::test]
    async fn cancelling_completed_token_is_rejected() {
        let (service, department, patient) = setup().await;
        let now = Utc::now();
        let Ok(token) = service
            .issue(department, patient, TokenPriority::Normal, now)
            .await
        else {
            panic!("issue failed");
        };
        for next in [
            TokenStatus::Called,
            TokenStatus::InProgress,
            TokenStatus::Completed,
        ] {
            tokio_test::assert_ok!(service.update_status(token.id, next, now).await);
        }
        let result = service.cancel(token.id, now).await;
        assert!(matches!(result, Err(OpsError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn skipping_a_step_is_rejected() {
        let (service, department, patient) = setup().await;
        let Ok(token) = service
            .issue(department, patient, TokenPriority::Urgent, Utc::now())
            .await
        else {
            panic!("issue failed");
        };
        let result = service
            .update_status(token.id, TokenStatus::Completed, Utc::now())
            .await;
        assert!(matches!(result, Err(OpsError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn call_next_takes_highest_priority() {
        let (service, department, patient) = setup().await;
        let start = Utc::now();
        let _ = service
            .issue(department, patient, TokenPriority::Normal, start)
            .await;
        let Ok(emergency) = service
            .issue(
                department,
                patient,
                TokenPriority::Emergency,
                start + Duration::minutes(5),
            )
            .await
        else {
            panic!("issue failed");
        };

        let Ok(called) = service.call_next(department, start).await else {
            panic!("call next failed");
        };
        assert_eq!(called.id, emergency.id);
        assert_eq!(called.status, TokenStatus::Called);

        let Ok(queue) = service.queue(department, None).await else {
            panic!("queue failed");
        };
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.first().map(|t| t.id), Some(emergency.id));
    }

    #[tokio::test]
    async fn call_next_on_empty_queue_is_not_found() {
        let (service, department, _) = setup().await;
        let result = service.call_next(department, Utc::now()).await;
        assert!(matches!(result, Err(OpsError::NotFound { .. })));
    }
}
