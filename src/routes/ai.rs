// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Generative-AI pass-through.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::AppState;
use axum::{extract::State, routing::post, Extension, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/ai/generate", post(generate))
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>> {
    tracing::debug!(user_id = %user.user_id, "Forwarding AI request");
    Ok(Json(state.ai_proxy.forward(&body).await?))
}
