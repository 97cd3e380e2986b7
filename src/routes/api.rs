// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile and ledger routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Transaction, User};
use crate::routes::{require_admin, validated};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require authentication via session token).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/me/transactions", get(get_transactions))
        .route("/api/ledger/credit", post(credit))
        .route("/api/ledger/debit", post(debit))
}

// ─── User Profile ────────────────────────────────────────────

/// User profile with current balance.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub points: i64,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            points: user.points,
        }
    }
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(profile.into()))
}

/// Caller's ledger, oldest entry first.
async fn get_transactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Transaction>>> {
    Ok(Json(state.db.list_transactions(&user.user_id).await?))
}

// ─── Ledger Adjustments ──────────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct LedgerRequest {
    #[validate(length(min = 1, max = 128))]
    user_id: String,
    #[validate(range(min = 1))]
    amount: i64,
    #[validate(length(min = 1, max = 200))]
    reason: String,
}

/// Posted entry and the balance it produced.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LedgerResponse {
    pub user: UserResponse,
    pub transaction: Transaction,
}

async fn credit(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Json(body): Json<LedgerRequest>,
) -> Result<Json<LedgerResponse>> {
    require_admin(&state, &caller.user_id)?;
    let body = validated(body)?;

    let posting = state
        .db
        .credit_points(&body.user_id, body.amount, &body.reason)
        .await?;

    tracing::info!(
        admin = %caller.user_id,
        user_id = %body.user_id,
        amount = body.amount,
        balance = posting.user.points,
        "Points credited"
    );

    Ok(Json(LedgerResponse {
        user: posting.user.into(),
        transaction: posting.transaction,
    }))
}

async fn debit(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Json(body): Json<LedgerRequest>,
) -> Result<Json<LedgerResponse>> {
    require_admin(&state, &caller.user_id)?;
    let body = validated(body)?;

    let posting = state
        .db
        .debit_points(&body.user_id, body.amount, None, &body.reason)
        .await?;

    tracing::info!(
        admin = %caller.user_id,
        user_id = %body.user_id,
        amount = body.amount,
        balance = posting.user.points,
        "Points debited"
    );

    Ok(Json(LedgerResponse {
        user: posting.user.into(),
        transaction: posting.transaction,
    }))
}
