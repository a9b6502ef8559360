//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::util::ServiceExt;
use uuid::Uuid;

use revise_scheduler::api::{self, AppState};
use revise_scheduler::domain::{IntervalTable, ManualClock};
use revise_scheduler::repository::{InMemoryReviseItemRepository, InMemoryUserDirectory};

/// Fixed start instant for API tests
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Application wired to in-memory storage and a manual clock
pub struct TestApp {
    pub router: Router,
    pub items: InMemoryReviseItemRepository,
    pub users: Arc<InMemoryUserDirectory>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub fn new() -> Self {
        let items = InMemoryReviseItemRepository::new();
        let users = Arc::new(InMemoryUserDirectory::new(items.clone()));
        let clock = Arc::new(ManualClock::new(start()));

        let router = api::build_router(AppState {
            items: items.clone(),
            users: users.clone(),
            clock: clock.clone(),
            intervals: Arc::new(IntervalTable::default()),
        });

        Self {
            router,
            items,
            users,
            clock,
        }
    }

    /// Send one request as `user` and decode the JSON body (Null if empty)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        user: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("X-Request-User-Id", user.to_string());
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        decode(response).await
    }
}

async fn decode(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}

/// Connect to the test database.
///
/// Tests use fresh ids, so tables are not truncated and tests may run in
/// parallel against the same database.
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    assert!(
        revise_scheduler::db::check_schema(&pool).await.unwrap(),
        "run migrations/0001_init.sql first"
    );

    pool
}
