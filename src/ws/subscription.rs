//! Per-connection subscription manager.
//!
//! Tracks which topics a WebSocket client follows and which staff roles it
//! declared, and filters events server-side.

use std::collections::HashSet;

use crate::domain::{HospitalEvent, StaffRole, Topic};

/// Manages the subscriptions of a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed topics. If `subscribe_all` is true, this set is ignored.
    topics: HashSet<Topic>,
    /// Whether the client subscribes to every topic (wildcard `"*"`).
    subscribe_all: bool,
    /// Declared roles; empty receives every alert.
    roles: HashSet<StaffRole>,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds topics to the subscription set. `wildcard` subscribes to all.
    pub fn subscribe(&mut self, topics: &[Topic], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.topics.extend(topics.iter().copied());
    }

    /// Removes topics. `wildcard` clears everything, including the
    /// wildcard itself.
    pub fn unsubscribe(&mut self, topics: &[Topic], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
            self.topics.clear();
            return;
        }
        for topic in topics {
            self.topics.remove(topic);
        }
    }

    /// Replaces the declared roles.
    pub fn set_roles(&mut self, roles: impl IntoIterator<Item = StaffRole>) {
        self.roles = roles.into_iter().collect();
    }

    /// Returns `true` if the event should be delivered to this client.
    ///
    /// The topic must be subscribed. A role-targeted alert additionally
    /// needs one of its roles among the declared ones, unless the client
    /// declared none.
    #[must_use]
    pub fn matches(&self, event: &HospitalEvent) -> bool {
        if !(self.subscribe_all || self.topics.contains(&event.topic())) {
            return false;
        }
        let targets = event.target_roles();
        targets.is_empty()
            || self.roles.is_empty()
            || targets.iter().any(|role| self.roles.contains(role))
    }

    /// Subscribed topics in a stable order.
    #[must_use]
    pub fn topics(&self) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self.topics.iter().copied().collect();
        topics.sort_by_key(Topic::as_str);
        topics
    }

    /// Declared roles in a stable order.
    #[must_use]
    pub fn roles(&self) -> Vec<StaffRole> {
        let mut roles: Vec<StaffRole> = self.roles.iter().copied().collect();
        roles.sort_by_key(StaffRole::as_str);
        roles
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::{AlertCode, AlertId, DepartmentId, TokenId, TokenPriority};

    fn alert(target_roles: Vec<StaffRole>) -> HospitalEvent {
        HospitalEvent::AlertRaised {
            alert_id: AlertId::new(),
            code: AlertCode::Blue,
            location: "ICU".to_string(),
            message: "Arrest".to_string(),
            priority: 1,
            target_roles,
            timestamp: Utc::now(),
        }
    }

    fn token_issued() -> HospitalEvent {
        HospitalEvent::TokenIssued {
            token_id: TokenId::new(),
            department_id: DepartmentId::new(),
            number: 1,
            priority: TokenPriority::Normal,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(&token_issued()));
    }

    #[test]
    fn topic_filter_applies() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[Topic::Tokens], false);
        assert!(mgr.matches(&token_issued()));
        assert!(!mgr.matches(&alert(vec![])));
    }

    #[test]
    fn wildcard_matches_every_topic() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[], true);
        assert!(mgr.matches(&token_issued()));
        assert!(mgr.matches(&alert(vec![])));
    }

    #[test]
    fn alerts_respect_declared_roles() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[Topic::Alerts], false);
        mgr.set_roles([StaffRole::Pharmacist]);
        assert!(!mgr.matches(&alert(vec![StaffRole::Doctor, StaffRole::Nurse])));
        assert!(mgr.matches(&alert(vec![StaffRole::Pharmacist])));
        assert!(mgr.matches(&alert(vec![])));
    }

    #[test]
    fn undeclared_roles_receive_all_alerts() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[Topic::Alerts], false);
        assert!(mgr.matches(&alert(vec![StaffRole::Doctor])));
    }

    #[test]
    fn wildcard_unsubscribe_clears_everything() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[Topic::Theaters], true);
        mgr.unsubscribe(&[], true);
        assert!(!mgr.is_subscribed_all());
        assert!(mgr.topics().is_empty());
    }
}
