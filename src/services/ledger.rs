// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Points ledger rules.
//!
//! A posting is computed against a snapshot of the user and then written by
//! the datastore as one unit: the new balance and the appended
//! [`Transaction`] commit together or not at all. Nothing here touches the
//! datastore, so both backends share the exact same rules.

use crate::error::{AppError, Result};
use crate::models::{Transaction, TransactionType, User};

/// Description used for reward redemptions.
pub const REDEEMED_DESCRIPTION: &str = "redeemed";

/// The result of applying one ledger operation to a user snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerPosting {
    /// User with the updated balance
    pub user: User,
    /// Entry to append
    pub transaction: Transaction,
}

/// Credit `amount` points to `user`.
pub fn credit(
    user: &User,
    amount: i64,
    description: &str,
    transaction_id: String,
    now: &str,
) -> Result<LedgerPosting> {
    if amount <= 0 {
        return Err(AppError::BadRequest(
            "amount must be a positive integer".to_string(),
        ));
    }

    let points = user
        .points
        .checked_add(amount)
        .ok_or_else(|| AppError::BadRequest("point balance overflow".to_string()))?;

    Ok(post(
        user,
        points,
        amount,
        TransactionType::Earned,
        None,
        description,
        transaction_id,
        now,
    ))
}

/// Debit `amount` points from `user`, failing without effect when the
/// balance is too low.
pub fn debit(
    user: &User,
    amount: i64,
    reward_id: Option<&str>,
    description: &str,
    transaction_id: String,
    now: &str,
) -> Result<LedgerPosting> {
    if amount <= 0 {
        return Err(AppError::BadRequest(
            "amount must be a positive integer".to_string(),
        ));
    }
    withdraw(user, amount, reward_id, description, transaction_id, now)
}

/// Debit used by redemptions, where a zero-cost reward still gets an
/// audit entry.
pub(crate) fn withdraw(
    user: &User,
    amount: i64,
    reward_id: Option<&str>,
    description: &str,
    transaction_id: String,
    now: &str,
) -> Result<LedgerPosting> {
    if user.points < amount {
        return Err(AppError::InsufficientPoints {
            required: amount,
            available: user.points,
        });
    }

    Ok(post(
        user,
        user.points - amount,
        -amount,
        TransactionType::Redeemed,
        reward_id,
        description,
        transaction_id,
        now,
    ))
}

#[allow(clippy::too_many_arguments)]
fn post(
    user: &User,
    new_points: i64,
    signed_amount: i64,
    kind: TransactionType,
    reward_id: Option<&str>,
    description: &str,
    transaction_id: String,
    now: &str,
) -> LedgerPosting {
    let mut updated = user.clone();
    updated.points = new_points;

    LedgerPosting {
        transaction: Transaction {
            id: transaction_id,
            user_id: user.id.clone(),
            reward_id: reward_id.map(String::from),
            amount: signed_amount,
            kind,
            description: description.to_string(),
            created_at: now.to_string(),
        },
        user: updated,
    }
}

/// Rebuild a balance from the log. Must always equal `User::points`.
pub fn replay_balance(transactions: &[Transaction]) -> i64 {
    transactions.iter().map(|t| t.amount).sum()
}
