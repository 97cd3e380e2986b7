// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event, registration and attendance routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Attendee, Event, EventRegistration, NewEvent};
use crate::routes::validated;
use crate::services::ScanSubmission;
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
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/events/{id}", get(get_event))
        .route(
            "/api/events/{id}/registration",
            get(get_registration)
                .post(register)
                .delete(cancel_registration),
        )
        .route("/api/events/{id}/attendance", post(verify_attendance))
        .route("/api/events/{id}/attendees", get(list_attendees))
}

// ─── Events ──────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateEventRequest {
    #[validate(length(min = 1, max = 200))]
    title: String,
    #[validate(length(min = 1, max = 500))]
    location: String,
    #[validate(length(min = 1, max = 64))]
    date: String,
    #[validate(range(min = 1))]
    capacity: Option<u32>,
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>)> {
    let body = validated(body)?;
    if chrono::DateTime::parse_from_rfc3339(&body.date).is_err() {
        return Err(AppError::BadRequest(
            "date must be an RFC3339 timestamp".to_string(),
        ));
    }

    let event = state
        .db
        .create_event(
            &user.user_id,
            NewEvent {
                title: body.title,
                location: body.location,
                date: body.date,
                capacity: body.capacity,
            },
        )
        .await?;

    tracing::info!(
        event_id = %event.id,
        organizer_id = %user.user_id,
        capacity = ?event.capacity,
        "Event created"
    );

    Ok((StatusCode::CREATED, Json(event)))
}

async fn list_events(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Event>>> {
    Ok(Json(state.db.list_events().await?))
}

/// Event with live registration and attendance counts.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct EventDetailResponse {
    #[serde(flatten)]
    pub event: Event,
    pub registration_count: u32,
    pub verified_count: u32,
}

async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Json<EventDetailResponse>> {
    let event = state
        .db
        .get_event(&event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;

    let (registration_count, verified_count) = tokio::try_join!(
        state.db.registration_count(&event_id),
        state.db.attendance_count(&event_id),
    )?;

    Ok(Json(EventDetailResponse {
        event,
        registration_count,
        verified_count,
    }))
}

// ─── Registration ────────────────────────────────────────────

/// Register the caller. The response carries the QR token.
async fn register(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
) -> Result<(StatusCode, Json<EventRegistration>)> {
    let registration = match state.db.register_for_event(&event_id, &user.user_id).await {
        Ok(registration) => registration,
        Err(e) => {
            tracing::debug!(
                event_id = %event_id,
                user_id = %user.user_id,
                reason = e.code(),
                "Registration rejected"
            );
            return Err(e);
        }
    };

    tracing::info!(event_id = %event_id, user_id = %user.user_id, "Registered for event");

    Ok((StatusCode::CREATED, Json(registration)))
}

/// The caller's own registration, for QR display.
async fn get_registration(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
) -> Result<Json<EventRegistration>> {
    state
        .db
        .get_registration(&event_id, &user.user_id)
        .await?
        .map(Json)
        .ok_or(AppError::NotRegistered)
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CancelResponse {
    pub success: bool,
}

async fn cancel_registration(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
) -> Result<Json<CancelResponse>> {
    state
        .db
        .cancel_registration(&event_id, &user.user_id)
        .await?;

    tracing::info!(event_id = %event_id, user_id = %user.user_id, "Registration cancelled");

    Ok(Json(CancelResponse { success: true }))
}

// ─── Attendance ──────────────────────────────────────────────

/// Scanned QR payload. Both fields are checked by the verifier so absent
/// values get a specific error.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttendanceRequest {
    user_id: Option<String>,
    qr_token: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAttendanceResponse {
    pub success: bool,
    pub user_name: String,
}

/// Check in a registrant from a scanned QR code. The caller is the verifier.
async fn verify_attendance(
    State(state): State<Arc<AppState>>,
    Extension(verifier): Extension<AuthUser>,
    Path(event_id): Path<String>,
    Json(body): Json<AttendanceRequest>,
) -> Result<Json<VerifyAttendanceResponse>> {
    let scan = ScanSubmission {
        event_id,
        user_id: body.user_id,
        scanned_token: body.qr_token,
        verifier_id: Some(verifier.user_id),
    }
    .validate()?;

    let plan = match state
        .db
        .verify_attendance(&scan, state.config.attendance_points)
        .await
    {
        Ok(plan) => plan,
        Err(e @ AppError::AlreadyVerified) => {
            tracing::debug!(
                event_id = %scan.event_id,
                user_id = %scan.user_id,
                "Attendance already verified"
            );
            return Err(e);
        }
        Err(e @ AppError::TokenMismatch) => {
            tracing::warn!(
                event_id = %scan.event_id,
                user_id = %scan.user_id,
                verifier_id = %scan.verifier_id,
                "QR token mismatch"
            );
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    tracing::info!(
        event_id = %scan.event_id,
        user_id = %scan.user_id,
        verifier_id = %scan.verifier_id,
        points_awarded = plan.posting.as_ref().map_or(0, |p| p.transaction.amount),
        "Attendance verified"
    );

    Ok(Json(VerifyAttendanceResponse {
        success: true,
        user_name: plan.user_name,
    }))
}

async fn list_attendees(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<Attendee>>> {
    Ok(Json(state.db.list_attendees(&event_id).await?))
}
