//! WebSocket message types: envelope and commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{HospitalEvent, StaffRole};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for commands; server-generated for events.
    #[serde(default)]
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp. Optional on incoming commands.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands a client can send in a [`WsMessageType::Command`] payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to topics. `"*"` subscribes to every topic.
    Subscribe {
        /// Topic names: `theaters`, `bookings`, `alerts`, `tokens`, `*`.
        topics: Vec<String>,
        /// Staff roles of the connected user; replaces any earlier
        /// declaration. Without roles every alert is delivered.
        #[serde(default)]
        roles: Option<Vec<StaffRole>>,
    },
    /// Unsubscribe from topics. `"*"` clears every subscription.
    Unsubscribe {
        /// Topic names to drop.
        topics: Vec<String>,
    },
    /// Liveness probe; answered with a `pong` response.
    Ping,
}

impl WsMessage {
    /// Wraps a domain event for broadcast.
    #[must_use]
    pub fn event(event: &HospitalEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            msg_type: WsMessageType::Event,
            timestamp: Utc::now(),
            payload: serde_json::to_value(event).unwrap_or_default(),
        }
    }

    /// Answers the command with the given `id`.
    #[must_use]
    pub fn response(id: String, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type: WsMessageType::Response,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Reports a failed command.
    #[must_use]
    pub fn error(id: String, code: u16, message: &str) -> Self {
        Self {
            id,
            msg_type: WsMessageType::Error,
            timestamp: Utc::now(),
            payload: serde_json::json!({
                "code": code,
                "message": message,
            }),
        }
    }

    /// Serializes the envelope to JSON text.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn command_without_timestamp_parses() {
        let text = r#"{"id":"c1","type":"command","payload":{"command":"subscribe","topics":["alerts"],"roles":["nurse"]}}"#;
        let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
            panic!("envelope should parse");
        };
        assert_eq!(msg.msg_type, WsMessageType::Command);
        let Ok(WsCommand::Subscribe { topics, roles }) =
            serde_json::from_value::<WsCommand>(msg.payload)
        else {
            panic!("expected subscribe");
        };
        assert_eq!(topics, vec!["alerts".to_string()]);
        assert_eq!(roles, Some(vec![StaffRole::Nurse]));
    }

    #[test]
    fn error_envelope_carries_code() {
        let msg = WsMessage::error("x".into(), 400, "bad");
        let Ok(json) = serde_json::to_value(&msg) else {
            panic!("serialization failed");
        };
        assert_eq!(json["type"], "error");
        assert_eq!(json["payload"]["code"], 400);
    }
}
