// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Community event, registration and attendance models.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Community event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Document ID
    pub id: String,
    pub organizer_id: String,
    pub title: String,
    pub location: String,
    /// Event date/time (RFC3339)
    pub date: String,
    /// Maximum registrations; None means unlimited
    #[serde(default)]
    pub capacity: Option<u32>,
    /// Committed registrations, written in the same transaction as each
    /// registration or cancellation
    #[serde(default)]
    pub registered_count: u32,
    pub created_at: String,
}

/// Fields supplied by the organizer.
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub title: String,
    pub location: String,
    pub date: String,
    pub capacity: Option<u32>,
}

impl NewEvent {
    pub fn into_event(self, id: String, organizer_id: &str, now: &str) -> Event {
        Event {
            id,
            organizer_id: organizer_id.to_string(),
            title: self.title,
            location: self.location,
            date: self.date,
            capacity: self.capacity,
            registered_count: 0,
            created_at: now.to_string(),
        }
    }
}

/// A user's reserved slot for an event.
///
/// `qr_token` is a bearer secret shown only to the registrant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct EventRegistration {
    pub event_id: String,
    pub user_id: String,
    pub qr_token: String,
    pub registered_at: String,
}

/// Verified, at-most-once proof that a registrant checked in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAttendance {
    pub event_id: String,
    pub user_id: String,
    pub verified_at: String,
    /// Scanning user
    pub verified_by: String,
}

/// Attendance row joined with the attendee's display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub user_id: String,
    pub user_name: String,
    pub verified_at: String,
}

/// Composite document ID for per-(event, user) records.
pub fn pair_document_id(event_id: &str, user_id: &str) -> String {
    format!(
        "{}:{}",
        urlencoding::encode(event_id),
        urlencoding::encode(user_id)
    )
}
