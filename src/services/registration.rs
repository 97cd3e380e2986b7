// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event registration and capacity rules.

use crate::error::{AppError, Result};
use crate::models::{Event, EventAttendance, EventRegistration};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};

/// Random bytes per QR token.
const QR_TOKEN_BYTES: usize = 32;

/// Generate an unguessable QR bearer token.
pub fn generate_qr_token() -> Result<String> {
    let mut bytes = [0u8; QR_TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Writes for a successful registration.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationPlan {
    /// Event with `registered_count` incremented
    pub event: Event,
    pub registration: EventRegistration,
}

/// Evaluate a registration against a snapshot of the event and any existing
/// registration for the pair.
pub fn plan_registration(
    event: Option<&Event>,
    existing: Option<&EventRegistration>,
    event_id: &str,
    user_id: &str,
    qr_token: String,
    now: &str,
) -> Result<RegistrationPlan> {
    let event = event.ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;

    if existing.is_some() {
        return Err(AppError::AlreadyRegistered);
    }

    if let Some(capacity) = event.capacity {
        if event.registered_count >= capacity {
            return Err(AppError::CapacityExceeded { capacity });
        }
    }

    let mut event = event.clone();
    event.registered_count += 1;

    Ok(RegistrationPlan {
        registration: EventRegistration {
            event_id: event.id.clone(),
            user_id: user_id.to_string(),
            qr_token,
            registered_at: now.to_string(),
        },
        event,
    })
}

/// Evaluate a cancellation. Returns the event with the count decremented.
pub fn plan_cancellation(
    event: Option<&Event>,
    registration: Option<&EventRegistration>,
    attendance: Option<&EventAttendance>,
    event_id: &str,
) -> Result<Event> {
    let event = event.ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;

    if registration.is_none() {
        return Err(AppError::NotRegistered);
    }
    if attendance.is_some() {
        return Err(AppError::AlreadyAttended);
    }

    let mut event = event.clone();
    event.registered_count = event.registered_count.saturating_sub(1);
    Ok(event)
}
