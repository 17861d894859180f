//! End-to-end REST tests against the full router over the memory store.

#![allow(clippy::panic)]

mod common;

use chrono::{Duration, Utc};
use reqwest::StatusCode;
use serde_json::json;

use common::spawn_app;

#[tokio::test]
async fn health_reports_memory_backend() {
    let app = spawn_app().await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");

    let (status, roles) = app.get("/config/roles").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roles.as_array().map(Vec::len), Some(6));
}

#[tokio::test]
async fn running_surgery_shows_as_occupied() {
    let app = spawn_app().await;
    let theater = app
        .create("/api/v1/theaters", &json!({"code": "OT-002", "name": "Main"}))
        .await;
    let start = Utc::now() - Duration::minutes(60);

    let (status, booking) = app
        .post(
            &format!("/api/v1/theaters/{theater}/bookings"),
            &json!({
                "patient_name": "Asha Rao",
                "procedure": "Appendectomy",
                "start_time": start.to_rfc3339(),
                "duration": "2 hours",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{booking}");
    assert_eq!(booking["surgeon_name"], "On-Call Surgeon");
    assert_eq!(booking["status"], "scheduled");

    let (status, view) = app.get(&format!("/api/v1/theaters/{theater}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["status"], "occupied");
    assert_eq!(view["occupant"]["patient_name"], "Asha Rao");
    let progress = view["progress_percent"].as_u64().unwrap_or_default();
    assert!((49..=51).contains(&progress), "progress {progress}");
}

#[tokio::test]
async fn conflicts_are_detected_and_enforced() {
    let app = spawn_app().await;
    let theater = app
        .create("/api/v1/theaters", &json!({"code": "OT-003", "name": "East"}))
        .await;
    let start = Utc::now() + Duration::hours(2);
    let (status, _) = app
        .post(
            &format!("/api/v1/theaters/{theater}/bookings"),
            &json!({
                "patient_name": "Lee",
                "procedure": "Hernia repair",
                "surgeon_name": "Dr. Okafor",
                "start_time": start.to_rfc3339(),
                "duration": "2",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let conflicts = format!("/api/v1/theaters/{theater}/conflicts");
    let (_, inside) = app
        .post(
            &conflicts,
            &json!({"start_time": (start + Duration::minutes(30)).to_rfc3339(), "duration": "1 hours"}),
        )
        .await;
    assert_eq!(inside["has_conflict"], true);

    let (_, adjacent) = app
        .post(
            &conflicts,
            &json!({"start_time": (start + Duration::hours(2)).to_rfc3339(), "duration": "1"}),
        )
        .await;
    assert_eq!(adjacent["has_conflict"], false);

    let (status, error) = app
        .post(
            &format!("/api/v1/theaters/{theater}/bookings"),
            &json!({
                "patient_name": "Kim",
                "procedure": "Biopsy",
                "start_time": (start - Duration::minutes(30)).to_rfc3339(),
                "duration": "1.5h",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"]["code"], 2002);
}

#[tokio::test]
async fn completing_a_booking_starts_cleaning() {
    let app = spawn_app().await;
    let theater = app
        .create("/api/v1/theaters", &json!({"code": "OT-004", "name": "West"}))
        .await;
    let booking = app
        .create(
            &format!("/api/v1/theaters/{theater}/bookings"),
            &json!({
                "patient_name": "Noor",
                "procedure": "Knee arthroscopy",
                "start_time": (Utc::now() - Duration::minutes(10)).to_rfc3339(),
                "duration": "1",
            }),
        )
        .await;

    let (status, done) = app
        .post(&format!("/api/v1/bookings/{booking}/complete"), &json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "completed");

    let (_, view) = app.get(&format!("/api/v1/theaters/{theater}")).await;
    assert_eq!(view["status"], "cleaning");

    let (status, _) = app
        .post(&format!("/api/v1/bookings/{booking}/cancel"), &json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn completing_a_future_booking_is_rejected() {
    let app = spawn_app().await;
    let theater = app
        .create("/api/v1/theaters", &json!({"code": "OT-006", "name": "South"}))
        .await;
    let booking = app
        .create(
            &format!("/api/v1/theaters/{theater}/bookings"),
            &json!({
                "patient_name": "Ravi",
                "procedure": "Hernia repair",
                "start_time": (Utc::now() + Duration::hours(3)).to_rfc3339(),
                "duration": "1",
            }),
        )
        .await;

    let (status, error) = app
        .post(&format!("/api/v1/bookings/{booking}/complete"), &json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"]["code"], 2004);

    let (_, view) = app.get(&format!("/api/v1/theaters/{theater}")).await;
    assert_eq!(view["status"], "booked");
}

#[tokio::test]
async fn duplicate_code_and_unknown_theater() {
    let app = spawn_app().await;
    let body = json!({"code": "OT-005", "name": "North"});
    let _ = app.create("/api/v1/theaters", &body).await;
    let (status, _) = app.post("/api/v1/theaters", &body).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, error) = app
        .get(&format!("/api/v1/theaters/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"]["code"], 2001);
}

#[tokio::test]
async fn token_queue_orders_and_guards_transitions() {
    let app = spawn_app().await;
    let department = app
        .create("/api/v1/departments", &json!({"name": "Cardiology"}))
        .await;
    let patient = app
        .create(
            "/api/v1/patients",
            &json!({"name": "Ravi", "age": 58, "condition": "chest pain", "department_id": department}),
        )
        .await;
    let tokens = format!("/api/v1/departments/{department}/tokens");

    let (_, first) = app
        .post(&tokens, &json!({"patient_id": patient}))
        .await;
    assert_eq!(first["number"], 1);
    assert_eq!(first["estimated_wait_minutes"], 0);
    let (_, second) = app
        .post(&tokens, &json!({"patient_id": patient, "priority": "normal"}))
        .await;
    assert_eq!(second["estimated_wait_minutes"], 10);
    let (_, urgent) = app
        .post(&tokens, &json!({"patient_id": patient, "priority": "emergency"}))
        .await;
    assert_eq!(urgent["number"], 3);
    assert_eq!(urgent["estimated_wait_minutes"], 0);

    let (_, queue) = app.get(&tokens).await;
    assert_eq!(queue["waiting"], 3);
    assert_eq!(queue["tokens"][0]["id"], urgent["id"]);

    let (status, called) = app
        .post(&format!("{tokens}/call-next"), &json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(called["id"], urgent["id"]);
    assert_eq!(called["status"], "called");

    let Some(id) = urgent["id"].as_str() else {
        panic!("token without id");
    };
    let status_path = format!("/api/v1/tokens/{id}/status");
    let (status, _) = app
        .patch(&status_path, &json!({"status": "completed"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    for next in ["in_progress", "completed"] {
        let (status, body) = app.patch(&status_path, &json!({"status": next})).await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }
    let (status, error) = app
        .post(&format!("/api/v1/tokens/{id}/cancel"), &json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"]["code"], 2004);
}

#[tokio::test]
async fn call_next_on_empty_queue_is_404() {
    let app = spawn_app().await;
    let department = app
        .create("/api/v1/departments", &json!({"name": "Dermatology"}))
        .await;
    let (status, _) = app
        .post(
            &format!("/api/v1/departments/{department}/tokens/call-next"),
            &json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn alerts_feed_the_emergency_queue() {
    let app = spawn_app().await;
    let (status, _) = app
        .post(
            "/api/v1/alerts",
            &json!({"code": "blue", "location": "ICU", "message": "Arrest", "priority": 6}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let alert = app
        .create(
            "/api/v1/alerts",
            &json!({"code": "blue", "location": "ICU bed 4", "message": "Arrest", "priority": 1}),
        )
        .await;
    let _ = app
        .create(
            "/api/v1/patients",
            &json!({"name": "Mina", "condition": "Urgent: sepsis"}),
        )
        .await;

    let (status, queue) = app.get("/api/v1/emergency-queue").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue.as_array().map(Vec::len), Some(2));
    assert_eq!(queue[0]["title"], "Code Blue");
    assert_eq!(queue[0]["severity"], "critical");
    assert_eq!(queue[1]["severity"], "high");

    let resolve = format!("/api/v1/alerts/{alert}/resolve");
    let (status, resolved) = app.post(&resolve, &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["status"], "resolved");
    let (status, _) = app.post(&resolve, &json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, active) = app.get("/api/v1/alerts?status=active").await;
    assert_eq!(active["pagination"]["total"], 0);
}

#[tokio::test]
async fn patients_are_paginated() {
    let app = spawn_app().await;
    for name in ["A", "B", "C"] {
        let _ = app
            .create("/api/v1/patients", &json!({"name": name}))
            .await;
    }
    let (status, page) = app.get("/api/v1/patients?page=2&per_page=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(page["pagination"]["total_pages"], 2);
}
