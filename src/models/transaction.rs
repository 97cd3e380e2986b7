// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ledger entry model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Earned,
    Redeemed,
}

/// Immutable ledger entry. Never updated or deleted after it is written
/// (except by the account-deletion cascade).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Document ID
    pub id: String,
    /// Owner
    pub user_id: String,
    /// Set for redemptions, None for earnings
    #[serde(default)]
    pub reward_id: Option<String>,
    /// Signed amount: positive when earned, negative when redeemed
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub description: String,
    /// When the entry was written (RFC3339, millisecond precision)
    pub created_at: String,
}
