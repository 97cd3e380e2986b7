// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end scenarios through the HTTP router.

use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::{create_test_app, seed_user, send};

#[tokio::test]
async fn test_report_then_redeem_scenario() {
    let (app, state) = create_test_app();
    seed_user(&state.db, "user_a", "Ann").await;

    let (status, me) = send(&app, "GET", "/api/me", Some("user_a"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["points"], 0);

    // Reporting waste earns 10 points
    let (status, body) = send(
        &app,
        "POST",
        "/api/reports",
        Some("user_a"),
        Some(json!({"location": "Main St", "wasteType": "plastic", "amount": "2 bags"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["pointsAwarded"], 10);
    assert_eq!(body["report"]["status"], "pending");

    let (_, log) = send(&app, "GET", "/api/me/transactions", Some("user_a"), None).await;
    let log = log.as_array().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0]["type"], "earned");
    assert_eq!(log[0]["amount"], 10);

    // Admin stocks a reward costing 10 points
    let (status, reward) = send(
        &app,
        "POST",
        "/api/rewards",
        Some("user_admin"),
        Some(json!({"name": "Tote bag", "description": "Canvas", "pointsRequired": 10, "stock": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let reward_id = reward["id"].as_str().unwrap().to_string();

    let uri = format!("/api/rewards/{}/redeem", reward_id);
    let (status, body) = send(&app, "POST", &uri, Some("user_a"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["points"], 0);

    let (_, reward) = send(
        &app,
        "GET",
        &format!("/api/rewards/{}", reward_id),
        Some("user_a"),
        None,
    )
    .await;
    assert_eq!(reward["stock"], 2);

    let (_, log) = send(&app, "GET", "/api/me/transactions", Some("user_a"), None).await;
    let log = log.as_array().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1]["type"], "redeemed");
    assert_eq!(log[1]["amount"], -10);
    assert_eq!(log[1]["rewardId"], reward_id.as_str());

    // Second redemption: not enough points
    let (status, body) = send(&app, "POST", &uri, Some("user_a"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "insufficient_points");

    let (_, reward) = send(
        &app,
        "GET",
        &format!("/api/rewards/{}", reward_id),
        Some("user_a"),
        None,
    )
    .await;
    assert_eq!(reward["stock"], 2);
}

#[tokio::test]
async fn test_event_capacity_and_check_in_scenario() {
    let (app, state) = create_test_app();
    seed_user(&state.db, "user_org", "Olive").await;
    seed_user(&state.db, "user_b", "Bea").await;
    seed_user(&state.db, "user_c", "Cal").await;

    let (status, event) = send(
        &app,
        "POST",
        "/api/events",
        Some("user_org"),
        Some(json!({
            "title": "Creek cleanup",
            "location": "Stevens Creek",
            "date": "2026-11-01T09:00:00Z",
            "capacity": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let event_id = event["id"].as_str().unwrap().to_string();
    let registration_uri = format!("/api/events/{}/registration", event_id);

    // B registers and receives a token
    let (status, registration) = send(&app, "POST", &registration_uri, Some("user_b"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let token = registration["qrToken"].as_str().unwrap().to_string();

    let (_, detail) = send(
        &app,
        "GET",
        &format!("/api/events/{}", event_id),
        Some("user_b"),
        None,
    )
    .await;
    assert_eq!(detail["registrationCount"], 1);
    assert_eq!(detail["title"], "Creek cleanup");

    // C is turned away
    let (status, body) = send(&app, "POST", &registration_uri, Some("user_c"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "capacity_exceeded");

    // Organizer scans B
    let attendance_uri = format!("/api/events/{}/attendance", event_id);
    let scan = json!({"userId": "user_b", "qrToken": token});
    let (status, body) = send(
        &app,
        "POST",
        &attendance_uri,
        Some("user_org"),
        Some(scan.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["userName"], "Bea");

    let (_, detail) = send(
        &app,
        "GET",
        &format!("/api/events/{}", event_id),
        Some("user_org"),
        None,
    )
    .await;
    assert_eq!(detail["verifiedCount"], 1);

    // Scanning again is a conflict, not a second check-in
    let (status, body) = send(&app, "POST", &attendance_uri, Some("user_org"), Some(scan)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_verified");

    let (_, detail) = send(
        &app,
        "GET",
        &format!("/api/events/{}", event_id),
        Some("user_org"),
        None,
    )
    .await;
    assert_eq!(detail["verifiedCount"], 1);

    let (status, attendees) = send(
        &app,
        "GET",
        &format!("/api/events/{}/attendees", event_id),
        Some("user_org"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let attendees = attendees.as_array().unwrap();
    assert_eq!(attendees.len(), 1);
    assert_eq!(attendees[0]["userId"], "user_b");
    assert_eq!(attendees[0]["userName"], "Bea");
    assert!(attendees[0]["verifiedAt"].is_string());

    // Attended registrations cannot be cancelled
    let (status, body) = send(&app, "DELETE", &registration_uri, Some("user_b"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_attended");
}
