// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! QR proof-of-presence verification.
//!
//! A registrant's device shows their `qr_token`; a verifier scans it and
//! submits `(event, user, token)`. Checks run in a fixed order so each
//! failure maps to one distinguishable reason:
//!
//! 1. verifier present, else `Unauthorized`
//! 2. user and token present, else `MissingFields`
//! 3. registration exists, else `NotRegistered`
//! 4. token matches, else `TokenMismatch`
//! 5. no attendance yet, else `AlreadyVerified`
//!
//! The attendance record is keyed by (event, user) in the datastore, so that
//! key, not the pre-check, is what bounds attendance to at most once.

use crate::error::{AppError, Result};
use crate::models::{Event, EventAttendance, EventRegistration, User};
use crate::services::ledger::{self, LedgerPosting};
use subtle::ConstantTimeEq;

/// Raw scan submission; any field may be absent.
#[derive(Debug, Clone, Default)]
pub struct ScanSubmission {
    pub event_id: String,
    pub user_id: Option<String>,
    pub scanned_token: Option<String>,
    pub verifier_id: Option<String>,
}

/// Scan submission with every field present.
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    pub event_id: String,
    pub user_id: String,
    pub scanned_token: String,
    pub verifier_id: String,
}

impl ScanSubmission {
    /// Steps 1 and 2: caller identity and required fields.
    pub fn validate(self) -> Result<Scan> {
        let verifier_id = present(self.verifier_id).ok_or(AppError::Unauthorized)?;

        let user_id = present(self.user_id);
        let scanned_token = present(self.scanned_token);

        match (user_id, scanned_token) {
            (Some(user_id), Some(scanned_token)) => Ok(Scan {
                event_id: self.event_id,
                user_id,
                scanned_token,
                verifier_id,
            }),
            (None, None) => Err(AppError::MissingFields("userId, qrToken".to_string())),
            (None, _) => Err(AppError::MissingFields("userId".to_string())),
            (_, None) => Err(AppError::MissingFields("qrToken".to_string())),
        }
    }
}

/// Blank counts as absent; anything else passes through untouched.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Compare a scanned token with the issued one without leaking timing.
pub fn tokens_match(scanned: &str, expected: &str) -> bool {
    scanned.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Steps 3 to 5 against a snapshot. Returns the attendance record to write.
pub fn plan_verification(
    scan: &Scan,
    registration: Option<&EventRegistration>,
    existing: Option<&EventAttendance>,
    now: &str,
) -> Result<EventAttendance> {
    let registration = registration.ok_or(AppError::NotRegistered)?;

    if !tokens_match(&scan.scanned_token, &registration.qr_token) {
        return Err(AppError::TokenMismatch);
    }

    if existing.is_some() {
        return Err(AppError::AlreadyVerified);
    }

    Ok(EventAttendance {
        event_id: scan.event_id.clone(),
        user_id: scan.user_id.clone(),
        verified_at: now.to_string(),
        verified_by: scan.verifier_id.clone(),
    })
}

/// Writes for a successful check-in.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationPlan {
    pub attendance: EventAttendance,
    /// Attendee display name, for the scanner's confirmation screen
    pub user_name: String,
    /// Attendance credit; None when attendance points are disabled
    pub posting: Option<LedgerPosting>,
}

/// Full check-in against a snapshot: the verification steps, then the
/// optional attendance credit for the attendee.
#[allow(clippy::too_many_arguments)]
pub fn plan_check_in(
    scan: &Scan,
    event: Option<&Event>,
    registration: Option<&EventRegistration>,
    existing: Option<&EventAttendance>,
    attendee: Option<&User>,
    points: i64,
    transaction_id: String,
    now: &str,
) -> Result<VerificationPlan> {
    let attendance = plan_verification(scan, registration, existing, now)?;

    let event =
        event.ok_or_else(|| AppError::NotFound(format!("Event {} not found", scan.event_id)))?;
    let attendee =
        attendee.ok_or_else(|| AppError::NotFound(format!("User {} not found", scan.user_id)))?;

    let posting = if points > 0 {
        Some(ledger::credit(
            attendee,
            points,
            &attendance_credit_description(&event.title),
            transaction_id,
            now,
        )?)
    } else {
        None
    };

    Ok(VerificationPlan {
        attendance,
        user_name: attendee.name.clone(),
        posting,
    })
}

/// Description of the optional attendance credit.
pub fn attendance_credit_description(event_title: &str) -> String {
    format!("Attended event: {}", event_title)
}
