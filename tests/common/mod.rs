// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tower::ServiceExt;
use wastetrack::config::Config;
use wastetrack::db::{Db, FirestoreDb};
use wastetrack::models::{NewEvent, NewReward, User, UserProfile};
use wastetrack::routes::create_router;
use wastetrack::services::WebhookVerifier;
use wastetrack::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_firestore() -> Db {
    Db::Firestore(
        FirestoreDb::new("test-project")
            .await
            .expect("Failed to connect to Firestore emulator"),
    )
}

/// Create a test app on a fresh in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, Db::in_memory()).expect("valid webhook secret"));
    (create_router(state.clone()), state)
}

/// Create a session token for `user_id` with the test signing key.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str) -> String {
    wastetrack::middleware::auth::create_jwt(user_id, &Config::test_default().session_signing_key)
        .expect("Failed to create JWT")
}

/// Unique ID for test isolation against a shared datastore.
#[allow(dead_code)]
pub fn unique_id(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}_{}", prefix, nanos)
}

#[allow(dead_code)]
pub async fn seed_user(db: &Db, id: &str, name: &str) -> User {
    db.sync_user(&UserProfile {
        id: id.to_string(),
        name: name.to_string(),
        email: None,
    })
    .await
    .unwrap()
}

/// Seed a user holding `points`, through the ledger.
#[allow(dead_code)]
pub async fn seed_user_with_points(db: &Db, id: &str, points: i64) -> User {
    seed_user(db, id, id).await;
    if points > 0 {
        db.credit_points(id, points, "seed").await.unwrap();
    }
    db.get_user(id).await.unwrap().unwrap()
}

#[allow(dead_code)]
pub async fn seed_reward(db: &Db, points_required: i64, stock: u32) -> String {
    db.create_reward(NewReward {
        name: "Reusable bag".to_string(),
        description: "Canvas tote".to_string(),
        points_required,
        stock,
        image_url: None,
    })
    .await
    .unwrap()
    .id
}

#[allow(dead_code)]
pub async fn seed_event(db: &Db, organizer: &str, capacity: Option<u32>) -> String {
    db.create_event(
        organizer,
        NewEvent {
            title: "Beach cleanup".to_string(),
            location: "Pier 3".to_string(),
            date: "2026-11-01T09:00:00.000Z".to_string(),
            capacity,
        },
    )
    .await
    .unwrap()
    .id
}

/// Svix-style headers signing `body` with the test webhook secret.
#[allow(dead_code)]
pub fn signed_webhook_headers(body: &str) -> Vec<(&'static str, String)> {
    let verifier = WebhookVerifier::new(&Config::test_default().identity_webhook_secret).unwrap();
    let ts = chrono::Utc::now().timestamp();
    let signature = verifier.sign("msg_test", ts, body.as_bytes()).unwrap();
    vec![
        ("svix-id", "msg_test".to_string()),
        ("svix-timestamp", ts.to_string()),
        ("svix-signature", signature),
    ]
}

/// Send a request as `user_id` (or anonymously) and return status and JSON.
#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user_id: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header(
            header::AUTHORIZATION,
            format!("Bearer {}", create_test_jwt(user_id)),
        );
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}
