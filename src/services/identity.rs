// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity-provider webhook verification and user lifecycle events.
//!
//! The provider signs each delivery Svix-style: HMAC-SHA256 over
//! `"{id}.{timestamp}.{body}"` with the base64 secret that follows the
//! `whsec_` prefix, sent as space-separated `v1,<base64>` signatures.

use crate::models::UserProfile;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";
/// Accepted clock difference between the provider and us.
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 5 * 60;

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

/// Webhook verification failures. All of them reject the delivery.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WebhookError {
    #[error("webhook secret is not valid base64")]
    InvalidSecret,
    #[error("missing header: {0}")]
    MissingHeader(&'static str),
    #[error("invalid timestamp header")]
    InvalidTimestamp,
    #[error("timestamp outside tolerance")]
    StaleTimestamp,
    #[error("no matching signature")]
    SignatureMismatch,
}

/// Verifies signed webhook deliveries.
#[derive(Clone)]
pub struct WebhookVerifier {
    key: Vec<u8>,
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> Result<Self, WebhookError> {
        let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
        let key = STANDARD
            .decode(encoded)
            .map_err(|_| WebhookError::InvalidSecret)?;
        Ok(Self { key })
    }

    /// Compute the `v1,<base64>` signature for a payload.
    pub fn sign(&self, msg_id: &str, timestamp: i64, body: &[u8]) -> Result<String, WebhookError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| WebhookError::InvalidSecret)?;
        mac.update(msg_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(format!(
            "{},{}",
            SIGNATURE_VERSION,
            STANDARD.encode(mac.finalize().into_bytes())
        ))
    }

    /// Verify a delivery's headers against its raw body.
    pub fn verify(
        &self,
        msg_id: Option<&str>,
        timestamp: Option<&str>,
        signatures: Option<&str>,
        body: &[u8],
        now_unix: i64,
    ) -> Result<(), WebhookError> {
        let msg_id = msg_id.ok_or(WebhookError::MissingHeader(HEADER_ID))?;
        let timestamp = timestamp.ok_or(WebhookError::MissingHeader(HEADER_TIMESTAMP))?;
        let signatures = signatures.ok_or(WebhookError::MissingHeader(HEADER_SIGNATURE))?;

        let timestamp: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| WebhookError::InvalidTimestamp)?;
        if (now_unix - timestamp).abs() > TIMESTAMP_TOLERANCE_SECS {
            return Err(WebhookError::StaleTimestamp);
        }

        let expected = self.sign(msg_id, timestamp, body)?;
        let matched = signatures
            .split_whitespace()
            .filter(|sig| sig.starts_with(SIGNATURE_VERSION))
            .any(|sig| bool::from(sig.as_bytes().ct_eq(expected.as_bytes())));

        if matched {
            Ok(())
        } else {
            Err(WebhookError::SignatureMismatch)
        }
    }
}

/// Lifecycle event envelope.
#[derive(Debug, Deserialize)]
pub struct IdentityEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: IdentityUserData,
}

#[derive(Debug, Deserialize)]
pub struct IdentityUserData {
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email_addresses: Vec<IdentityEmail>,
    #[serde(default)]
    pub primary_email_address_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdentityEmail {
    #[serde(default)]
    pub id: Option<String>,
    pub email_address: String,
}

/// What a lifecycle event asks us to do with the User table.
#[derive(Debug, Clone, PartialEq)]
pub enum UserSync {
    Upsert(UserProfile),
    Delete(String),
    Ignore,
}

impl IdentityEvent {
    pub fn into_sync(self) -> UserSync {
        let Some(id) = self.data.id.clone().filter(|id| !id.is_empty()) else {
            return UserSync::Ignore;
        };

        match self.event_type.as_str() {
            "user.created" | "user.updated" => UserSync::Upsert(UserProfile {
                name: self.data.display_name(),
                email: self.data.primary_email(),
                id,
            }),
            "user.deleted" => UserSync::Delete(id),
            _ => UserSync::Ignore,
        }
    }
}

impl IdentityUserData {
    fn primary_email(&self) -> Option<String> {
        let primary = self.primary_email_address_id.as_deref();
        self.email_addresses
            .iter()
            .find(|e| primary.is_some() && e.id.as_deref() == primary)
            .or_else(|| self.email_addresses.first())
            .map(|e| e.email_address.clone())
    }

    /// First/last name, else username, else email, else "Anonymous".
    fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if !full.is_empty() {
            return full;
        }
        self.username
            .clone()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| self.primary_email())
            .unwrap_or_else(|| "Anonymous".to_string())
    }
}
