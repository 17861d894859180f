//! Broadcast channel for domain events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Every state
//! mutation publishes a [`HospitalEvent`] through the bus, and all
//! WebSocket connections subscribe to receive filtered events.

use tokio::sync::broadcast;

use super::HospitalEvent;

/// Broadcast bus for [`HospitalEvent`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity
/// (default 10 000). When the ring buffer is full, the oldest events are
/// dropped for lagging receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<HospitalEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    /// If there are no active receivers, the event is silently dropped.
    pub fn publish(&self, event: HospitalEvent) -> usize {
        tracing::debug!(event_type = event.event_type_str(), "publishing event");
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future events.
    ///
    /// Each WebSocket connection should call this once on connect.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HospitalEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Utc;
    use tokio::sync::broadcast::error::RecvError;

    use super::*;
    use crate::domain::{
        AlertCode, AlertId, DepartmentId, StaffRole, TheaterId, TheaterStatus, TokenId,
        TokenPriority, Topic,
    };

    fn theater_changed(to: TheaterStatus) -> HospitalEvent {
        HospitalEvent::TheaterStatusChanged {
            theater_id: TheaterId::new(),
            code: "OT-001".into(),
            from: TheaterStatus::Available,
            to,
            timestamp: Utc::now(),
        }
    }

    fn code_blue() -> HospitalEvent {
        HospitalEvent::AlertRaised {
            alert_id: AlertId::new(),
            code: AlertCode::Blue,
            location: "Ward 4".into(),
            message: "Cardiac arrest".into(),
            priority: 1,
            target_roles: vec![StaffRole::Doctor, StaffRole::Nurse],
            timestamp: Utc::now(),
        }
    }

    fn token_issued(number: i32) -> HospitalEvent {
        HospitalEvent::TokenIssued {
            token_id: TokenId::new(),
            department_id: DepartmentId::new(),
            number,
            priority: TokenPriority::Normal,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(100);
        assert_eq!(bus.publish(code_blue()), 0);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let bus = EventBus::new(0);
        let _rx = bus.subscribe();
        assert_eq!(bus.publish(token_issued(1)), 1);
    }

    #[tokio::test]
    async fn events_from_every_topic_arrive_in_publish_order() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();

        bus.publish(theater_changed(TheaterStatus::Scheduled));
        bus.publish(code_blue());
        bus.publish(token_issued(7));

        let mut topics = Vec::new();
        for _ in 0..3 {
            let Ok(event) = rx.recv().await else {
                panic!("expected event");
            };
            topics.push(event.topic());
        }
        assert_eq!(topics, vec![Topic::Theaters, Topic::Alerts, Topic::Tokens]);
    }

    #[tokio::test]
    async fn alert_reaches_every_subscriber_with_its_roles() {
        let bus = EventBus::new(100);
        let mut ward = bus.subscribe();
        let mut desk = bus.subscribe();

        assert_eq!(bus.publish(code_blue()), 2);

        for rx in [&mut ward, &mut desk] {
            let Ok(event) = rx.recv().await else {
                panic!("expected alert");
            };
            assert_eq!(event.event_type_str(), "alert_raised");
            assert_eq!(event.target_roles(), &[StaffRole::Doctor, StaffRole::Nurse]);
        }
    }

    #[tokio::test]
    async fn slow_subscriber_lags_when_buffer_overflows() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for number in 1..=4 {
            bus.publish(token_issued(number));
        }

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(2))));
        let Ok(HospitalEvent::TokenIssued { number, .. }) = rx.recv().await else {
            panic!("expected token event");
        };
        assert_eq!(number, 3);
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let bus = EventBus::new(100);
        assert_eq!(bus.receiver_count(), 0);

        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);

        drop(rx1);
        assert_eq!(bus.receiver_count(), 1);
    }
}
