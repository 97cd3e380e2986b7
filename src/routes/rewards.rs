// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reward catalog and redemption routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{NewReward, Reward};
use crate::routes::api::UserResponse;
use crate::routes::{require_admin, validated};
use crate::services::RedemptionState;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/rewards", get(list_rewards).post(create_reward))
        .route("/api/rewards/{id}", get(get_reward))
        .route("/api/rewards/{id}/redeem", post(redeem))
}

async fn list_rewards(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Reward>>> {
    Ok(Json(state.db.list_rewards().await?))
}

async fn get_reward(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Reward>> {
    state
        .db
        .get_reward(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Reward {} not found", id)))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateRewardRequest {
    #[validate(length(min = 1, max = 120))]
    name: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    description: String,
    #[validate(range(min = 0))]
    points_required: i64,
    stock: u32,
    #[validate(url)]
    image_url: Option<String>,
}

async fn create_reward(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Json(body): Json<CreateRewardRequest>,
) -> Result<(StatusCode, Json<Reward>)> {
    require_admin(&state, &caller.user_id)?;
    let body = validated(body)?;

    let reward = state
        .db
        .create_reward(NewReward {
            name: body.name,
            description: body.description,
            points_required: body.points_required,
            stock: body.stock,
            image_url: body.image_url,
        })
        .await?;

    tracing::info!(
        reward_id = %reward.id,
        points_required = reward.points_required,
        stock = reward.stock,
        "Reward created"
    );

    Ok((StatusCode::CREATED, Json(reward)))
}

/// Successful redemption: the caller's new balance.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RedeemResponse {
    pub success: bool,
    pub user: UserResponse,
}

/// Redeem one unit of a reward for the caller.
async fn redeem(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(reward_id): Path<String>,
) -> Result<Json<RedeemResponse>> {
    tracing::debug!(
        user_id = %user.user_id,
        reward_id = %reward_id,
        state = RedemptionState::Requested.as_str(),
        "Redemption requested"
    );

    let result = state.db.redeem_reward(&user.user_id, &reward_id).await;
    let outcome = RedemptionState::of(&result);

    let plan = match result {
        Ok(plan) => plan,
        Err(e) => {
            tracing::info!(
                user_id = %user.user_id,
                reward_id = %reward_id,
                state = outcome.as_str(),
                reason = e.code(),
                "Redemption rejected"
            );
            return Err(e);
        }
    };

    tracing::info!(
        user_id = %user.user_id,
        reward_id = %reward_id,
        state = outcome.as_str(),
        stock = plan.reward.stock,
        balance = plan.posting.user.points,
        "Reward redeemed"
    );

    Ok(Json(RedeemResponse {
        success: true,
        user: plan.posting.user.into(),
    }))
}
