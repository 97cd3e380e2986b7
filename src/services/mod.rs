// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.
//!
//! The planners here are pure: they take a snapshot read by the datastore
//! and return the documents to write, or the reason to write nothing.

pub mod ai_proxy;
pub mod attendance;
pub mod collection;
pub mod identity;
pub mod ledger;
pub mod redemption;
pub mod registration;

pub use ai_proxy::AiProxy;
pub use attendance::{Scan, ScanSubmission, VerificationPlan};
pub use identity::{IdentityEvent, UserSync, WebhookError, WebhookVerifier};
pub use ledger::LedgerPosting;
pub use redemption::{RedemptionPlan, RedemptionState};
