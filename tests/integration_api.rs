//! API Integration Tests

use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use uuid::Uuid;

mod common;

use common::{start, TestApp};

fn ts(value: &serde_json::Value) -> DateTime<Utc> {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_item_lifecycle_e2e() {
    let app = TestApp::new();
    let owner = Uuid::new_v4();

    // 1. Create
    let (status, created) = app
        .send(
            "POST",
            "/api/v1/items",
            Some(owner),
            Some(json!({
                "name": "Go Maps",
                "tags": ["go", "maps", "go"],
                "next_revision_at": (start() + Duration::days(1)).to_rfc3339(),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {created}");
    assert_eq!(created["repetitions"], 0);
    assert_eq!(created["tags"].as_array().unwrap().len(), 2);
    let id = created["id"].as_str().unwrap().to_string();

    // 2. Rename
    let (status, renamed) = app
        .send(
            "PATCH",
            &format!("/api/v1/items/{id}/name"),
            Some(owner),
            Some(json!({ "name": "Go maps and slices" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Go maps and slices");

    // 3. Review
    app.clock.advance(Duration::days(1));
    let (status, reviewed) = app
        .send("POST", &format!("/api/v1/items/{id}/review"), Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviewed["item"]["repetitions"], 1);
    assert_eq!(
        ts(&reviewed["item"]["next_revision_at"]),
        start() + Duration::days(1) + Duration::days(3)
    );

    // 4. Delete hides the item
    let (status, _) = app
        .send("DELETE", &format!("/api/v1/items/{id}"), Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .send("GET", &format!("/api/v1/items/{id}"), Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 5. Restore brings it back
    let (status, restored) = app
        .send("POST", &format!("/api/v1/items/{id}/restore"), Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(restored["repetitions"], 1);
    assert!(restored.get("deleted_at").is_none());
}

#[tokio::test]
async fn test_missing_and_invalid_caller() {
    let app = TestApp::new();

    let (status, body) = app.send("GET", "/api/v1/items", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "missing_header");

    let (status, body) = app
        .send("GET", "/health", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_validation_error_names_field() {
    let app = TestApp::new();
    let owner = Uuid::new_v4();

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/items",
            Some(owner),
            Some(json!({ "name": "x" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "validation_error");
    assert_eq!(body["details"], "name");
}

#[tokio::test]
async fn test_non_owner_gets_forbidden() {
    let app = TestApp::new();
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();

    let (_, created) = app
        .send(
            "POST",
            "/api/v1/items",
            Some(owner),
            Some(json!({ "name": "Channels" })),
        )
        .await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = app
        .send(
            "PATCH",
            &format!("/api/v1/items/{id}/description"),
            Some(intruder),
            Some(json!({ "description": "mine now" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error_code"], "forbidden");

    let (_, fetched) = app
        .send("GET", &format!("/api/v1/items/{id}"), Some(owner), None)
        .await;
    assert_eq!(fetched["description"], "");
}

#[tokio::test]
async fn test_tags_and_reschedule() {
    let app = TestApp::new();
    let owner = Uuid::new_v4();

    let (_, created) = app
        .send(
            "POST",
            "/api/v1/items",
            Some(owner),
            Some(json!({ "name": "Lifetimes", "tags": ["rust"] })),
        )
        .await;
    let id = created["id"].as_str().unwrap();

    let (status, tagged) = app
        .send(
            "POST",
            &format!("/api/v1/items/{id}/tags"),
            Some(owner),
            Some(json!({ "tags": [" borrowck ", "rust"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tagged["tags"], json!(["borrowck", "rust"]));

    let (status, untagged) = app
        .send(
            "DELETE",
            &format!("/api/v1/items/{id}/tags"),
            Some(owner),
            Some(json!({ "tags": ["rust"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(untagged["tags"], json!(["borrowck"]));

    let target = start() + Duration::days(10);
    let (status, rescheduled) = app
        .send(
            "PUT",
            &format!("/api/v1/items/{id}/next-revision"),
            Some(owner),
            Some(json!({ "next_revision_at": target.to_rfc3339() })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ts(&rescheduled["next_revision_at"]), target);

    let (status, body) = app
        .send(
            "PUT",
            &format!("/api/v1/items/{id}/next-revision"),
            Some(owner),
            Some(json!({ "next_revision_at": start().to_rfc3339() })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "next_revision_at");
}

#[tokio::test]
async fn test_list_pagination() {
    let app = TestApp::new();
    let owner = Uuid::new_v4();

    let (_, empty) = app
        .send("GET", "/api/v1/items", Some(owner), None)
        .await;
    assert_eq!(
        empty["metadata"],
        json!({
            "current_page": 0,
            "page_size": 0,
            "first_page": 0,
            "last_page": 0,
            "total_records": 0
        })
    );

    for name in ["First", "Second", "Third"] {
        app.send(
            "POST",
            "/api/v1/items",
            Some(owner),
            Some(json!({ "name": name })),
        )
        .await;
        app.clock.advance(Duration::seconds(1));
    }

    let (status, page) = app
        .send("GET", "/api/v1/items?page=2&page_size=2", Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["items"][0]["name"], "First");
    assert_eq!(page["metadata"]["last_page"], 2);
    assert_eq!(page["metadata"]["total_records"], 3);

    let (status, _) = app
        .send("GET", "/api/v1/items?page_size=101", Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_reminder() {
    let app = TestApp::new();
    let user = Uuid::new_v4();

    let (status, body) = app
        .send(
            "PUT",
            "/api/v1/users/me/reminder",
            Some(user),
            Some(json!({ "reminder_time": "08:30:00", "utc_offset_minutes": -300 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user.to_string());
    assert_eq!(body["utc_offset_minutes"], -300);

    let (status, body) = app
        .send(
            "PUT",
            "/api/v1/users/me/reminder",
            Some(user),
            Some(json!({ "reminder_time": "08:30:00", "utc_offset_minutes": 900 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "utc_offset_minutes");

    let (status, body) = app
        .send(
            "PUT",
            "/api/v1/users/me/reminder",
            Some(user),
            Some(json!({ "reminder_time": "08:30:00", "display_name": "x".repeat(101) })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "display_name");
}

#[tokio::test]
async fn test_unknown_item_is_not_found() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            "POST",
            &format!("/api/v1/items/{}/review", Uuid::new_v4()),
            Some(Uuid::new_v4()),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "not_found");
}
