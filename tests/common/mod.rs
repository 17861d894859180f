//! Shared helpers for the integration tests: an in-memory server on an
//! ephemeral port and small JSON request wrappers.

#![allow(dead_code, clippy::panic)]

use std::sync::Arc;

use hospital_ops::app_state::AppState;
use hospital_ops::config::OpsConfig;
use hospital_ops::domain::EventBus;
use hospital_ops::persistence::{MemoryStore, SharedStore};
use reqwest::StatusCode;
use serde_json::Value;

/// A running server and a client pointed at it.
pub struct TestApp {
    /// `host:port` the server listens on.
    pub addr: String,
    /// HTTP client.
    pub client: reqwest::Client,
}

/// Starts the full router over a fresh [`MemoryStore`].
pub async fn spawn_app() -> TestApp {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let state = AppState::new(store, EventBus::new(256), &OpsConfig::default());
    let app = hospital_ops::build_app(state);

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("failed to bind ephemeral port");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("listener has no local address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    TestApp {
        addr: addr.to_string(),
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// WebSocket URL of the event feed.
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Sends a JSON `POST` and returns status and body.
    pub async fn post(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let Ok(resp) = self.client.post(self.url(path)).json(body).send().await else {
            panic!("POST {path} failed");
        };
        read(resp).await
    }

    /// Sends a JSON `PATCH` and returns status and body.
    pub async fn patch(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let Ok(resp) = self.client.patch(self.url(path)).json(body).send().await else {
            panic!("PATCH {path} failed");
        };
        read(resp).await
    }

    /// Sends a `GET` and returns status and body.
    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let Ok(resp) = self.client.get(self.url(path)).send().await else {
            panic!("GET {path} failed");
        };
        read(resp).await
    }

    /// Sends a `DELETE` and returns the status.
    pub async fn delete(&self, path: &str) -> StatusCode {
        let Ok(resp) = self.client.delete(self.url(path)).send().await else {
            panic!("DELETE {path} failed");
        };
        resp.status()
    }

    /// Creates a record and returns its `id`.
    pub async fn create(&self, path: &str, body: &Value) -> String {
        let (status, json) = self.post(path, body).await;
        assert_eq!(status, StatusCode::CREATED, "POST {path}: {json}");
        let Some(id) = json["id"].as_str() else {
            panic!("POST {path} returned no id: {json}");
        };
        id.to_string()
    }
}

async fn read(resp: reqwest::Response) -> (StatusCode, Value) {
    let status = resp.status();
    let body = resp.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}
