// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webhook routes for identity-provider user lifecycle events.

use crate::error::{AppError, Result};
use crate::services::identity::{self, IdentityEvent, UserSync};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use std::sync::Arc;

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhooks/identity", post(handle_event))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Handle a signed lifecycle event (POST).
///
/// The signature covers the raw body, so it is verified before parsing.
async fn handle_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    if let Err(e) = state.webhook_verifier.verify(
        header(&headers, identity::HEADER_ID),
        header(&headers, identity::HEADER_TIMESTAMP),
        header(&headers, identity::HEADER_SIGNATURE),
        &body,
        chrono::Utc::now().timestamp(),
    ) {
        tracing::warn!(error = %e, "Security Alert: Identity webhook signature rejected");
        return Err(AppError::InvalidToken);
    }

    let event: IdentityEvent = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse identity webhook event");
            return Err(AppError::BadRequest("Malformed event payload".to_string()));
        }
    };
    let event_type = event.event_type.clone();

    match event.into_sync() {
        UserSync::Upsert(profile) => {
            let user = state.db.sync_user(&profile).await?;
            tracing::info!(
                user_id = %user.id,
                event_type = %event_type,
                points = user.points,
                "User synced from identity provider"
            );
        }
        UserSync::Delete(user_id) => {
            let deleted = state.db.delete_user_data(&user_id).await?;
            tracing::info!(user_id = %user_id, deleted, "User deleted by identity provider");
        }
        UserSync::Ignore => {
            tracing::debug!(event_type = %event_type, "Ignoring identity webhook event");
        }
    }

    Ok(StatusCode::OK)
}
