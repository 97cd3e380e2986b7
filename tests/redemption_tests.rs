// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reward redemption tests.

use wastetrack::db::Db;
use wastetrack::error::AppError;
use wastetrack::models::TransactionType;

mod common;
use common::{seed_reward, seed_user_with_points};

#[tokio::test]
async fn test_redeem_moves_points_and_stock_together() {
    let db = Db::in_memory();
    seed_user_with_points(&db, "user_a", 25).await;
    let reward_id = seed_reward(&db, 10, 3).await;

    let plan = db.redeem_reward("user_a", &reward_id).await.unwrap();
    assert_eq!(plan.posting.user.points, 15);
    assert_eq!(plan.reward.stock, 2);

    let reward = db.get_reward(&reward_id).await.unwrap().unwrap();
    assert_eq!(reward.stock, 2);

    let log = db.list_transactions("user_a").await.unwrap();
    let last = log.last().unwrap();
    assert_eq!(last.amount, -10);
    assert_eq!(last.kind, TransactionType::Redeemed);
    assert_eq!(last.description, "redeemed");
    assert_eq!(last.reward_id.as_deref(), Some(reward_id.as_str()));
}

#[tokio::test]
async fn test_insufficient_points_changes_nothing() {
    let db = Db::in_memory();
    seed_user_with_points(&db, "user_a", 9).await;
    let reward_id = seed_reward(&db, 10, 3).await;

    let err = db.redeem_reward("user_a", &reward_id).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientPoints { .. }));

    assert_eq!(db.get_user("user_a").await.unwrap().unwrap().points, 9);
    assert_eq!(db.get_reward(&reward_id).await.unwrap().unwrap().stock, 3);
    assert_eq!(db.list_transactions("user_a").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_out_of_stock_checked_before_points() {
    let db = Db::in_memory();
    seed_user_with_points(&db, "user_a", 0).await;
    let reward_id = seed_reward(&db, 10, 0).await;

    assert!(matches!(
        db.redeem_reward("user_a", &reward_id).await,
        Err(AppError::OutOfStock)
    ));
}

#[tokio::test]
async fn test_missing_user_or_reward() {
    let db = Db::in_memory();
    let reward_id = seed_reward(&db, 1, 1).await;
    assert!(matches!(
        db.redeem_reward("ghost", &reward_id).await,
        Err(AppError::NotFound(_))
    ));

    seed_user_with_points(&db, "user_a", 5).await;
    assert!(matches!(
        db.redeem_reward("user_a", "no_such_reward").await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_free_reward_still_consumes_stock() {
    let db = Db::in_memory();
    seed_user_with_points(&db, "user_a", 0).await;
    let reward_id = seed_reward(&db, 0, 1).await;

    let plan = db.redeem_reward("user_a", &reward_id).await.unwrap();
    assert_eq!(plan.posting.user.points, 0);
    assert_eq!(plan.posting.transaction.amount, 0);

    assert!(matches!(
        db.redeem_reward("user_a", &reward_id).await,
        Err(AppError::OutOfStock)
    ));
}

#[tokio::test]
async fn test_last_unit_redeemed_exactly_once_under_race() {
    let db = Db::in_memory();
    let reward_id = seed_reward(&db, 5, 1).await;
    for i in 0..10 {
        seed_user_with_points(&db, &format!("user_{i}"), 50).await;
    }

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let db = db.clone();
            let reward_id = reward_id.clone();
            tokio::spawn(async move { db.redeem_reward(&format!("user_{i}"), &reward_id).await })
        })
        .collect();

    let mut fulfilled = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => fulfilled += 1,
            Err(AppError::OutOfStock) | Err(AppError::InsufficientPoints { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(fulfilled, 1);
    assert_eq!(db.get_reward(&reward_id).await.unwrap().unwrap().stock, 0);
}

#[tokio::test]
async fn test_same_user_double_redeem_race() {
    let db = Db::in_memory();
    seed_user_with_points(&db, "user_a", 10).await;
    let reward_id = seed_reward(&db, 10, 5).await;

    let (a, b) = tokio::join!(
        db.redeem_reward("user_a", &reward_id),
        db.redeem_reward("user_a", &reward_id)
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);

    assert_eq!(db.get_user("user_a").await.unwrap().unwrap().points, 0);
    assert_eq!(db.get_reward(&reward_id).await.unwrap().unwrap().stock, 4);
}
