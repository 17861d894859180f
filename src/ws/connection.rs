//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::{HospitalEvent, Topic};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and answers them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(socket: WebSocket, mut event_rx: broadcast::Receiver<HospitalEvent>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();
    tracing::debug!("ws connection opened");

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs);
                        if ws_tx.send(Message::text(reply.to_json())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            // Event from EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        if subs.matches(&event) {
                            let msg = WsMessage::event(&event);
                            if ws_tx.send(Message::text(msg.to_json())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Handles a text message from the client and builds the reply.
fn handle_text_message(text: &str, subs: &mut SubscriptionManager) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error(String::new(), 400, "malformed JSON");
    };
    if msg.msg_type != WsMessageType::Command {
        return WsMessage::error(msg.id, 400, "only command messages are accepted");
    }
    let command = match serde_json::from_value::<WsCommand>(msg.payload) {
        Ok(command) => command,
        Err(e) => {
            return WsMessage::error(msg.id, 404, &format!("unknown command: {e}"));
        }
    };

    match command {
        WsCommand::Subscribe { topics, roles } => {
            let (parsed, wildcard) = match parse_topics(&topics) {
                Ok(parsed) => parsed,
                Err(message) => return WsMessage::error(msg.id, 400, &message),
            };
            subs.subscribe(&parsed, wildcard);
            if let Some(roles) = roles {
                subs.set_roles(roles);
            }
            tracing::debug!(topics = ?subs.topics(), roles = ?subs.roles(), "ws subscribed");
            WsMessage::response(
                msg.id,
                serde_json::json!({
                    "subscribed": subs.topics(),
                    "wildcard": subs.is_subscribed_all(),
                    "roles": subs.roles(),
                }),
            )
        }
        WsCommand::Unsubscribe { topics } => {
            let (parsed, wildcard) = match parse_topics(&topics) {
                Ok(parsed) => parsed,
                Err(message) => return WsMessage::error(msg.id, 400, &message),
            };
            subs.unsubscribe(&parsed, wildcard);
            WsMessage::response(
                msg.id,
                serde_json::json!({
                    "subscribed": subs.topics(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Ping => WsMessage::response(msg.id, serde_json::json!({ "pong": true })),
    }
}

/// Splits topic names into known topics and the `"*"` wildcard.
fn parse_topics(names: &[String]) -> Result<(Vec<Topic>, bool), String> {
    let mut topics = Vec::with_capacity(names.len());
    let mut wildcard = false;
    for name in names {
        if name == "*" {
            wildcard = true;
        } else {
            topics.push(name.parse::<Topic>().map_err(|e| e.to_string())?);
        }
    }
    Ok((topics, wildcard))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(payload: &str) -> String {
        format!(r#"{{"id":"req-1","type":"command","payload":{payload}}}"#)
    }

    #[test]
    fn subscribe_reports_topics_and_roles() {
        let mut subs = SubscriptionManager::new();
        let reply = handle_text_message(
            &command(r#"{"command":"subscribe","topics":["tokens","alerts"],"roles":["nurse"]}"#),
            &mut subs,
        );
        assert_eq!(reply.msg_type, WsMessageType::Response);
        assert_eq!(reply.id, "req-1");
        assert_eq!(reply.payload["subscribed"], serde_json::json!(["alerts", "tokens"]));
        assert_eq!(reply.payload["roles"], serde_json::json!(["nurse"]));
    }

    #[test]
    fn unknown_topic_is_an_error() {
        let mut subs = SubscriptionManager::new();
        let reply = handle_text_message(
            &command(r#"{"command":"subscribe","topics":["pharmacy"]}"#),
            &mut subs,
        );
        assert_eq!(reply.msg_type, WsMessageType::Error);
        assert_eq!(reply.payload["code"], 400);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let mut subs = SubscriptionManager::new();
        let reply = handle_text_message("not json", &mut subs);
        assert_eq!(reply.msg_type, WsMessageType::Error);
    }

    #[test]
    fn unknown_command_is_not_found() {
        let mut subs = SubscriptionManager::new();
        let reply = handle_text_message(&command(r#"{"command":"refill"}"#), &mut subs);
        assert_eq!(reply.payload["code"], 404);
    }

    #[test]
    fn wildcard_unsubscribe_clears() {
        let mut subs = SubscriptionManager::new();
        let _ = handle_text_message(&command(r#"{"command":"subscribe","topics":["*"]}"#), &mut subs);
        assert!(subs.is_subscribed_all());
        let _ = handle_text_message(&command(r#"{"command":"unsubscribe","topics":["*"]}"#), &mut subs);
        assert!(!subs.is_subscribed_all());
    }
}
