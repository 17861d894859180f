//! End-to-end WebSocket feed tests: topic subscriptions and role-filtered
//! alert delivery.

#![allow(clippy::panic)]

mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

use common::{TestApp, spawn_app};

type Socket =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn connect(app: &TestApp) -> Socket {
    let Ok((socket, _)) = tokio_tungstenite::connect_async(app.ws_url()).await else {
        panic!("ws connect failed");
    };
    socket
}

async fn send(socket: &mut Socket, payload: Value) -> Value {
    let envelope = json!({"id": "cmd-1", "type": "command", "payload": payload});
    let Ok(()) = socket.send(Message::text(envelope.to_string())).await else {
        panic!("ws send failed");
    };
    next_json(socket).await
}

async fn next_json(socket: &mut Socket) -> Value {
    loop {
        let Ok(Some(Ok(msg))) = tokio::time::timeout(Duration::from_secs(3), socket.next()).await
        else {
            panic!("no ws message within timeout");
        };
        if let Ok(text) = msg.to_text()
            && !text.is_empty()
        {
            let Ok(json) = serde_json::from_str::<Value>(text) else {
                panic!("server sent invalid JSON: {text}");
            };
            return json;
        }
    }
}

#[tokio::test]
async fn subscribe_acknowledges_topics() {
    let app = spawn_app().await;
    let mut socket = connect(&app).await;

    let reply = send(
        &mut socket,
        json!({"command": "subscribe", "topics": ["tokens", "theaters"], "roles": ["nurse"]}),
    )
    .await;
    assert_eq!(reply["type"], "response");
    assert_eq!(reply["id"], "cmd-1");
    assert_eq!(reply["payload"]["subscribed"], json!(["theaters", "tokens"]));

    let reply = send(&mut socket, json!({"command": "subscribe", "topics": ["lab"]})).await;
    assert_eq!(reply["type"], "error");
}

#[tokio::test]
async fn alerts_reach_only_targeted_roles() {
    let app = spawn_app().await;
    let mut socket = connect(&app).await;
    let reply = send(
        &mut socket,
        json!({"command": "subscribe", "topics": ["alerts"], "roles": ["pharmacist"]}),
    )
    .await;
    assert_eq!(reply["type"], "response");

    let _ = app
        .create(
            "/api/v1/alerts",
            &json!({
                "code": "blue",
                "location": "Ward 3",
                "message": "Arrest",
                "target_roles": ["doctor", "nurse"],
            }),
        )
        .await;
    let pharmacy = app
        .create(
            "/api/v1/alerts",
            &json!({
                "code": "orange",
                "location": "Pharmacy",
                "message": "Chemical spill",
                "priority": 2,
                "target_roles": ["pharmacist"],
            }),
        )
        .await;

    let event = next_json(&mut socket).await;
    assert_eq!(event["type"], "event");
    assert_eq!(event["payload"]["event_type"], "alert_raised");
    assert_eq!(event["payload"]["alert_id"], pharmacy.as_str());
}

#[tokio::test]
async fn token_events_follow_the_queue() {
    let app = spawn_app().await;
    let department = app
        .create("/api/v1/departments", &json!({"name": "Radiology"}))
        .await;
    let patient = app
        .create("/api/v1/patients", &json!({"name": "Ines"}))
        .await;

    let mut socket = connect(&app).await;
    let _ = send(&mut socket, json!({"command": "subscribe", "topics": ["*"]})).await;

    let token = app
        .create(
            &format!("/api/v1/departments/{department}/tokens"),
            &json!({"patient_id": patient, "priority": "urgent"}),
        )
        .await;

    let event = next_json(&mut socket).await;
    assert_eq!(event["payload"]["event_type"], "token_issued");
    assert_eq!(event["payload"]["token_id"], token.as_str());
    assert_eq!(event["payload"]["number"], 1);
}
