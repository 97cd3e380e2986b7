// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User profile mirrored from the identity provider.
///
/// `points` is only ever changed together with a ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// External identity-provider ID (also used as document ID)
    pub id: String,
    /// Display name
    pub name: String,
    /// Primary email (may be None if not shared)
    #[serde(default)]
    pub email: Option<String>,
    /// Current point balance
    #[serde(default)]
    pub points: i64,
    /// When the user was first synced
    pub created_at: String,
    /// Last profile sync
    pub updated_at: String,
}

/// Profile fields supplied by an identity-provider sync.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
}

impl User {
    /// Merge a profile sync into an optional existing row.
    ///
    /// Balance and creation time survive updates, so replaying the same
    /// sync is a no-op apart from `updated_at`.
    pub fn from_sync(existing: Option<User>, profile: &UserProfile, now: &str) -> User {
        match existing {
            Some(mut user) => {
                user.name = profile.name.clone();
                user.email = profile.email.clone();
                user.updated_at = now.to_string();
                user
            }
            None => User {
                id: profile.id.clone(),
                name: profile.name.clone(),
                email: profile.email.clone(),
                points: 0,
                created_at: now.to_string(),
                updated_at: now.to_string(),
            },
        }
    }
}
