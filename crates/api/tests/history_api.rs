//! Integration tests for `GET /api/v1/users/{id}/history`.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{Duration, TimeZone, Utc};
use common::{body_json, get, MemoryHistory};
use microsaas_events::{EmailData, Event, EventData, HistoryStore};
use serde_json::json;
use uuid::Uuid;

fn event_at(user: Uuid, minute: i64, event_type: &str) -> Event {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    Event::restore(
        Uuid::new_v4(),
        base + Duration::minutes(minute),
        Some(user),
        EventData::decode(event_type, json!({ "minute": minute })).unwrap(),
    )
}

async fn seeded(user: Uuid, count: i64) -> Arc<MemoryHistory> {
    let history = Arc::new(MemoryHistory::default());
    for minute in 0..count {
        history
            .store(&event_at(user, minute, "login"))
            .await
            .unwrap();
    }
    history
}

// ---------------------------------------------------------------------------
// Test: history is returned newest first
// ---------------------------------------------------------------------------

#[tokio::test]
async fn history_lists_user_events_newest_first() {
    let user = Uuid::new_v4();
    let history = seeded(user, 3).await;
    history
        .store(&event_at(Uuid::new_v4(), 10, "login"))
        .await
        .unwrap();

    let app = common::build_test_app(history);
    let response = get(app, &format!("/api/v1/users/{user}/history")).await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let events = json.as_array().unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["data"]["minute"], 2);
    assert_eq!(events[2]["data"]["minute"], 0);
    assert!(events.iter().all(|e| e["user"] == user.to_string()));
}

// ---------------------------------------------------------------------------
// Test: event envelope fields are serialized
// ---------------------------------------------------------------------------

#[tokio::test]
async fn history_entries_carry_type_time_and_typed_payload() {
    let user = Uuid::new_v4();
    let history = Arc::new(MemoryHistory::default());
    let sent = Event::new(EventData::EmailSent(EmailData {
        from: "noreply@example.com".to_string(),
        to: "jane@example.com".to_string(),
        subject: "E-mail Confirmation".to_string(),
        body: "<p>hi</p>".to_string(),
    }))
    .with_user(Some(user));
    history.store(&sent).await.unwrap();

    let app = common::build_test_app(history);
    let json = body_json(get(app, &format!("/api/v1/users/{user}/history")).await).await;

    let entry = &json[0];
    assert_eq!(entry["id"], sent.id().to_string());
    assert_eq!(entry["type"], "email_sent");
    assert!(entry["time"].is_string());
    assert_eq!(entry["data"]["to"], "jane@example.com");
    assert_eq!(entry["data"]["subject"], "E-mail Confirmation");
}

// ---------------------------------------------------------------------------
// Test: a user without events gets an empty list
// ---------------------------------------------------------------------------

#[tokio::test]
async fn user_without_history_gets_empty_list() {
    let app = common::build_test_app(Arc::new(MemoryHistory::default()));
    let response = get(app, &format!("/api/v1/users/{}/history", Uuid::new_v4())).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

// ---------------------------------------------------------------------------
// Test: default and capped page sizes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn history_defaults_to_twenty_five_entries() {
    let user = Uuid::new_v4();
    let history = seeded(user, 30).await;

    let app = common::build_test_app(Arc::clone(&history));
    let json = body_json(get(app, &format!("/api/v1/users/{user}/history")).await).await;

    assert_eq!(json.as_array().unwrap().len(), 25);
    assert_eq!(json[0]["data"]["minute"], 29);
    assert_eq!(*history.limits.lock().unwrap(), vec![25]);
}

#[tokio::test]
async fn explicit_limit_is_capped() {
    let user = Uuid::new_v4();
    let history = seeded(user, 5).await;

    let app = common::build_test_app(Arc::clone(&history));
    let small = get(app.clone(), &format!("/api/v1/users/{user}/history?limit=2")).await;
    assert_eq!(body_json(small).await.as_array().unwrap().len(), 2);

    let large = get(app, &format!("/api/v1/users/{user}/history?limit=5000")).await;
    assert_eq!(large.status(), StatusCode::OK);

    assert_eq!(*history.limits.lock().unwrap(), vec![2, 100]);
}

#[tokio::test]
async fn non_positive_limit_is_rejected() {
    let history = Arc::new(MemoryHistory::default());
    let app = common::build_test_app(Arc::clone(&history));

    let response = get(app, &format!("/api/v1/users/{}/history?limit=0", Uuid::new_v4())).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
    assert!(history.limits.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: storage failures surface as 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_failure_returns_not_found() {
    let app = common::build_test_app(Arc::new(MemoryHistory::failing()));
    let response = get(app, &format!("/api/v1/users/{}/history", Uuid::new_v4())).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "User history not found");
}

// ---------------------------------------------------------------------------
// Test: malformed user id is rejected before reaching the store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_user_id_is_rejected() {
    let history = Arc::new(MemoryHistory::default());
    let app = common::build_test_app(Arc::clone(&history));

    let response = get(app, "/api/v1/users/not-a-uuid/history").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(history.limits.lock().unwrap().is_empty());
}
