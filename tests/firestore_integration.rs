// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (FIRESTORE_EMULATOR_HOST). IDs are unique per run, so the emulator does
//! not need to be reset between runs.

use wastetrack::error::AppError;
use wastetrack::services::ScanSubmission;

mod common;
use common::{seed_event, seed_reward, seed_user, seed_user_with_points, test_firestore, unique_id};

// ═══════════════════════════════════════════════════════════════════════════
// LEDGER & REDEMPTION
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_ledger_round_trip() {
    require_emulator!();

    let db = test_firestore().await;
    let user_id = unique_id("user");
    seed_user_with_points(&db, &user_id, 10).await;

    db.debit_points(&user_id, 4, None, "spent").await.unwrap();
    assert!(matches!(
        db.debit_points(&user_id, 7, None, "spent").await,
        Err(AppError::InsufficientPoints { .. })
    ));

    let user = db.get_user(&user_id).await.unwrap().unwrap();
    let log = db.list_transactions(&user_id).await.unwrap();
    assert_eq!(user.points, 6);
    assert_eq!(log.len(), 2);
    assert_eq!(log.iter().map(|t| t.amount).sum::<i64>(), 6);
}

#[tokio::test]
async fn test_redeem_is_atomic() {
    require_emulator!();

    let db = test_firestore().await;
    let user_id = unique_id("user");
    seed_user_with_points(&db, &user_id, 10).await;
    let reward_id = seed_reward(&db, 10, 1).await;

    let plan = db.redeem_reward(&user_id, &reward_id).await.unwrap();
    assert_eq!(plan.posting.user.points, 0);
    assert_eq!(db.get_reward(&reward_id).await.unwrap().unwrap().stock, 0);

    assert!(matches!(
        db.redeem_reward(&user_id, &reward_id).await,
        Err(AppError::OutOfStock)
    ));
}

#[tokio::test]
async fn test_concurrent_last_unit() {
    require_emulator!();

    let db = test_firestore().await;
    let reward_id = seed_reward(&db, 1, 1).await;
    let users: Vec<String> = (0..4).map(|_| unique_id("user")).collect();
    for user in &users {
        seed_user_with_points(&db, user, 5).await;
    }

    let handles: Vec<_> = users
        .iter()
        .map(|user| {
            let db = db.clone();
            let user = user.clone();
            let reward_id = reward_id.clone();
            tokio::spawn(async move { db.redeem_reward(&user, &reward_id).await })
        })
        .collect();

    let mut fulfilled = 0;
    for handle in handles {
        // Losers see either OutOfStock or an aborted commit
        if handle.await.unwrap().is_ok() {
            fulfilled += 1;
        }
    }

    assert!(fulfilled <= 1);
    let reward = db.get_reward(&reward_id).await.unwrap().unwrap();
    assert_eq!(reward.stock, 1 - fulfilled);
}

// ═══════════════════════════════════════════════════════════════════════════
// EVENTS & ATTENDANCE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_registration_and_check_in() {
    require_emulator!();

    let db = test_firestore().await;
    let organizer = unique_id("org");
    let user_b = unique_id("user_b");
    let user_c = unique_id("user_c");
    seed_user(&db, &organizer, "Olive").await;
    seed_user(&db, &user_b, "Bea").await;
    seed_user(&db, &user_c, "Cal").await;
    let event_id = seed_event(&db, &organizer, Some(1)).await;

    let registration = db.register_for_event(&event_id, &user_b).await.unwrap();
    assert!(matches!(
        db.register_for_event(&event_id, &user_b).await,
        Err(AppError::AlreadyRegistered)
    ));
    assert!(matches!(
        db.register_for_event(&event_id, &user_c).await,
        Err(AppError::CapacityExceeded { capacity: 1 })
    ));
    assert_eq!(db.registration_count(&event_id).await.unwrap(), 1);

    let scan = ScanSubmission {
        event_id: event_id.clone(),
        user_id: Some(user_b.clone()),
        scanned_token: Some(registration.qr_token.clone()),
        verifier_id: Some(organizer.clone()),
    }
    .validate()
    .unwrap();

    let plan = db.verify_attendance(&scan, 0).await.unwrap();
    assert_eq!(plan.user_name, "Bea");
    assert!(matches!(
        db.verify_attendance(&scan, 0).await,
        Err(AppError::AlreadyVerified)
    ));
    assert_eq!(db.attendance_count(&event_id).await.unwrap(), 1);

    assert!(matches!(
        db.cancel_registration(&event_id, &user_b).await,
        Err(AppError::AlreadyAttended)
    ));

    let attendees = db.list_attendees(&event_id).await.unwrap();
    assert_eq!(attendees.len(), 1);
    assert_eq!(attendees[0].user_name, "Bea");
}

#[tokio::test]
async fn test_user_deletion_cascade() {
    require_emulator!();

    let db = test_firestore().await;
    let user_id = unique_id("user");
    seed_user_with_points(&db, &user_id, 5).await;
    let event_id = seed_event(&db, &user_id, None).await;
    db.register_for_event(&event_id, &user_id).await.unwrap();

    let deleted = db.delete_user_data(&user_id).await.unwrap();
    assert!(deleted >= 3);

    assert!(db.get_user(&user_id).await.unwrap().is_none());
    assert!(db.list_transactions(&user_id).await.unwrap().is_empty());
    assert_eq!(db.registration_count(&event_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_deletion_racing_cancel_keeps_count() {
    require_emulator!();

    let db = test_firestore().await;
    let leaving = unique_id("user");
    let staying = unique_id("user");
    seed_user(&db, &leaving, "Leaving").await;
    seed_user(&db, &staying, "Staying").await;
    let event_id = seed_event(&db, &staying, Some(2)).await;
    db.register_for_event(&event_id, &leaving).await.unwrap();
    db.register_for_event(&event_id, &staying).await.unwrap();

    // Contention may abort some of these; the final pass below finishes the delete.
    let _ = tokio::join!(
        db.cancel_registration(&event_id, &leaving),
        db.delete_user_data(&leaving),
        db.delete_user_data(&leaving)
    );
    db.delete_user_data(&leaving).await.unwrap();

    assert!(db.get_registration(&event_id, &leaving).await.unwrap().is_none());
    assert!(db.get_registration(&event_id, &staying).await.unwrap().is_some());
    let event = db.get_event(&event_id).await.unwrap().unwrap();
    assert_eq!(event.registered_count, 1);
}
