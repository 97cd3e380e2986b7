// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request handling and error mapping for the API routes.

use axum::http::StatusCode;
use serde_json::json;
use wastetrack::config::Config;

mod common;
use common::{create_test_app, create_test_app_with, seed_event, seed_user, send};

// ─── Ledger ──────────────────────────────────────────────────

#[tokio::test]
async fn test_admin_credit_and_debit() {
    let (app, state) = create_test_app();
    seed_user(&state.db, "user_a", "Ann").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/ledger/credit",
        Some("user_admin"),
        Some(json!({"userId": "user_a", "amount": 15, "reason": "Volunteer bonus"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["points"], 15);
    assert_eq!(body["transaction"]["type"], "earned");
    assert_eq!(body["transaction"]["description"], "Volunteer bonus");

    let (status, body) = send(
        &app,
        "POST",
        "/api/ledger/debit",
        Some("user_admin"),
        Some(json!({"userId": "user_a", "amount": 20, "reason": "Correction"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "insufficient_points");

    let (status, body) = send(
        &app,
        "POST",
        "/api/ledger/debit",
        Some("user_admin"),
        Some(json!({"userId": "user_a", "amount": 5, "reason": "Correction"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["points"], 10);
    assert_eq!(body["transaction"]["amount"], -5);
}

#[tokio::test]
async fn test_ledger_validation_and_not_found() {
    let (app, _) = create_test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/ledger/credit",
        Some("user_admin"),
        Some(json!({"userId": "user_a", "amount": 0, "reason": "nothing"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, body) = send(
        &app,
        "POST",
        "/api/ledger/credit",
        Some("user_admin"),
        Some(json!({"userId": "ghost", "amount": 5, "reason": "bonus"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

// ─── Rewards ─────────────────────────────────────────────────

#[tokio::test]
async fn test_redeem_unknown_reward() {
    let (app, state) = create_test_app();
    seed_user(&state.db, "user_a", "Ann").await;

    let (status, body) = send(&app, "POST", "/api/rewards/nope/redeem", Some("user_a"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_reward_catalog_sorted_by_cost() {
    let (app, _) = create_test_app();
    for (name, cost) in [("Bike light", 50), ("Sticker", 5), ("Tote", 20)] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/rewards",
            Some("user_admin"),
            Some(json!({"name": name, "pointsRequired": cost, "stock": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, rewards) = send(&app, "GET", "/api/rewards", Some("user_a"), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = rewards
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Sticker", "Tote", "Bike light"]);
}

#[tokio::test]
async fn test_reward_validation() {
    let (app, _) = create_test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/rewards",
        Some("user_admin"),
        Some(json!({"name": "", "pointsRequired": -1, "stock": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

// ─── Reports & Collection ────────────────────────────────────

#[tokio::test]
async fn test_collect_once() {
    let (app, state) = create_test_app();
    seed_user(&state.db, "user_a", "Ann").await;
    seed_user(&state.db, "user_col", "Colin").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/reports",
        Some("user_a"),
        Some(json!({"location": "Park", "wasteType": "glass", "amount": "1 crate"})),
    )
    .await;
    let report_id = body["report"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/reports/{}/collect", report_id);

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some("user_col"),
        Some(json!({"comments": "Picked up"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["status"], "collected");
    assert_eq!(body["report"]["collectorId"], "user_col");
    assert_eq!(body["pointsAwarded"], 10);

    let (status, body) = send(&app, "POST", &uri, Some("user_col"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_collected");

    // Credited exactly once
    let collector = state.db.get_user("user_col").await.unwrap().unwrap();
    assert_eq!(collector.points, 10);

    let (status, _) = send(
        &app,
        "POST",
        "/api/reports/missing/collect",
        Some("user_col"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_reports_by_status() {
    let (app, state) = create_test_app();
    seed_user(&state.db, "user_a", "Ann").await;

    for location in ["A", "B"] {
        send(
            &app,
            "POST",
            "/api/reports",
            Some("user_a"),
            Some(json!({"location": location, "wasteType": "paper", "amount": "1 bag"})),
        )
        .await;
    }
    let (_, all) = send(&app, "GET", "/api/reports", Some("user_a"), None).await;
    let first_id = all[0]["id"].as_str().unwrap().to_string();
    send(
        &app,
        "POST",
        &format!("/api/reports/{}/collect", first_id),
        Some("user_a"),
        Some(json!({})),
    )
    .await;

    let (_, pending) = send(&app, "GET", "/api/reports?status=pending", Some("user_a"), None).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
    let (_, collected) =
        send(&app, "GET", "/api/reports?status=collected", Some("user_a"), None).await;
    assert_eq!(collected.as_array().unwrap().len(), 1);
    assert_eq!(collected[0]["id"], first_id.as_str());

    let (status, _) = send(&app, "GET", "/api/reports?status=lost", Some("user_a"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Events ──────────────────────────────────────────────────

#[tokio::test]
async fn test_registration_statuses() {
    let (app, state) = create_test_app();
    seed_user(&state.db, "user_org", "Olive").await;
    seed_user(&state.db, "user_b", "Bea").await;
    let event_id = seed_event(&state.db, "user_org", None).await;
    let uri = format!("/api/events/{}/registration", event_id);

    let (status, body) = send(&app, "GET", &uri, Some("user_b"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_registered");

    let (status, body) = send(&app, "DELETE", &uri, Some("user_b"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_registered");

    let (status, registration) = send(&app, "POST", &uri, Some("user_b"), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "POST", &uri, Some("user_b"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_registered");

    // The registrant can fetch their own token again
    let (status, body) = send(&app, "GET", &uri, Some("user_b"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["qrToken"], registration["qrToken"]);

    let (status, body) = send(&app, "DELETE", &uri, Some("user_b"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = send(
        &app,
        "POST",
        "/api/events/none/registration",
        Some("user_b"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_attendance_statuses() {
    let (app, state) = create_test_app();
    seed_user(&state.db, "user_org", "Olive").await;
    seed_user(&state.db, "user_b", "Bea").await;
    seed_user(&state.db, "user_c", "Cal").await;
    let event_id = seed_event(&state.db, "user_org", None).await;
    let token = state
        .db
        .register_for_event(&event_id, "user_b")
        .await
        .unwrap()
        .qr_token;
    let uri = format!("/api/events/{}/attendance", event_id);

    // No verifier identity
    let (status, _) = send(
        &app,
        "POST",
        &uri,
        None,
        Some(json!({"userId": "user_b", "qrToken": token})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some("user_org"),
        Some(json!({"userId": "user_b"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing_fields");

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some("user_org"),
        Some(json!({"userId": "user_b", "qrToken": "guess"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "token_mismatch");
    assert!(body.get("details").is_none());

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some("user_org"),
        Some(json!({"userId": "user_c", "qrToken": token})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_registered");

    assert_eq!(state.db.attendance_count(&event_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_attendance_points_when_enabled() {
    let mut config = Config::test_default();
    config.attendance_points = 7;
    let (app, state) = create_test_app_with(config);
    seed_user(&state.db, "user_org", "Olive").await;
    seed_user(&state.db, "user_b", "Bea").await;
    let event_id = seed_event(&state.db, "user_org", None).await;
    let token = state
        .db
        .register_for_event(&event_id, "user_b")
        .await
        .unwrap()
        .qr_token;

    let uri = format!("/api/events/{}/attendance", event_id);
    let scan = json!({"userId": "user_b", "qrToken": token});
    let (status, _) = send(&app, "POST", &uri, Some("user_org"), Some(scan.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", &uri, Some("user_org"), Some(scan)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, me) = send(&app, "GET", "/api/me", Some("user_b"), None).await;
    assert_eq!(me["points"], 7);
}

#[tokio::test]
async fn test_event_validation() {
    let (app, _) = create_test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/events",
        Some("user_org"),
        Some(json!({"title": "Cleanup", "location": "Pier", "date": "next tuesday"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = send(
        &app,
        "POST",
        "/api/events",
        Some("user_org"),
        Some(json!({"title": "Cleanup", "location": "Pier", "date": "2026-11-01T09:00:00Z", "capacity": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_events_listed_by_date() {
    let (app, _) = create_test_app();
    for (title, date) in [
        ("Later", "2026-12-01T09:00:00Z"),
        ("Sooner", "2026-11-01T09:00:00Z"),
    ] {
        send(
            &app,
            "POST",
            "/api/events",
            Some("user_org"),
            Some(json!({"title": title, "location": "Pier", "date": date})),
        )
        .await;
    }
    let (_, events) = send(&app, "GET", "/api/events", Some("user_org"), None).await;
    assert_eq!(events[0]["title"], "Sooner");
    assert_eq!(events[1]["title"], "Later");
    assert!(events[0]["capacity"].is_null());
}

// ─── AI proxy ────────────────────────────────────────────────

#[tokio::test]
async fn test_ai_proxy_unconfigured() {
    let (app, _) = create_test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/ai/generate",
        Some("user_a"),
        Some(json!({"prompt": "Is this recyclable?"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream_error");
}
