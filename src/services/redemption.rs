// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reward redemption state machine.
//!
//! `Requested -> Fulfilled | Rejected`. The checks run against one
//! consistent snapshot of the user and the reward, in this order:
//! user exists, reward exists, stock, points. Only a fulfilled plan carries
//! writes, and the datastore applies the stock decrement and the debit in a
//! single transaction.

use crate::error::{AppError, Result};
use crate::models::{Reward, User};
use crate::services::ledger::{self, LedgerPosting, REDEEMED_DESCRIPTION};

/// Terminal outcome of a redemption request, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionState {
    Requested,
    Fulfilled,
    Rejected,
}

impl RedemptionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedemptionState::Requested => "requested",
            RedemptionState::Fulfilled => "fulfilled",
            RedemptionState::Rejected => "rejected",
        }
    }

    /// Outcome of a finished redemption attempt.
    pub fn of<T>(result: &Result<T>) -> Self {
        if result.is_ok() {
            RedemptionState::Fulfilled
        } else {
            RedemptionState::Rejected
        }
    }
}

/// Writes for a fulfilled redemption.
#[derive(Debug, Clone, PartialEq)]
pub struct RedemptionPlan {
    /// Reward with stock decremented by one
    pub reward: Reward,
    /// Debit of `points_required`
    pub posting: LedgerPosting,
}

/// Evaluate a redemption against a snapshot.
pub fn plan_redemption(
    user: Option<&User>,
    reward: Option<&Reward>,
    user_id: &str,
    reward_id: &str,
    transaction_id: String,
    now: &str,
) -> Result<RedemptionPlan> {
    let user = user.ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
    let reward =
        reward.ok_or_else(|| AppError::NotFound(format!("Reward {} not found", reward_id)))?;

    if reward.stock == 0 {
        return Err(AppError::OutOfStock);
    }

    let posting = ledger::withdraw(
        user,
        reward.points_required,
        Some(&reward.id),
        REDEEMED_DESCRIPTION,
        transaction_id,
        now,
    )?;

    let mut reward = reward.clone();
    reward.stock -= 1;

    Ok(RedemptionPlan { reward, posting })
}
