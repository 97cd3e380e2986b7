// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Every operation that writes more than one document is a single atomic
//! unit in both backends: a Firestore transaction, or one critical section
//! of the in-memory store. Business checks come from `services::*` and run
//! against the snapshot read inside that unit.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{
    Attendee, Event, EventRegistration, NewEvent, NewReward, Report, ReportStatus, Reward,
    Transaction, User, UserProfile,
};
use crate::services::attendance::{Scan, VerificationPlan};
use crate::services::collection::{CollectionPlan, NewReport, ReportPlan};
use crate::services::ledger::LedgerPosting;
use crate::services::redemption::RedemptionPlan;
use ring::rand::{SecureRandom, SystemRandom};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const TRANSACTIONS: &str = "transactions";
    pub const REWARDS: &str = "rewards";
    pub const REPORTS: &str = "reports";
    /// Keyed by report ID
    pub const COLLECTED_WASTE: &str = "collected_waste";
    pub const EVENTS: &str = "events";
    /// Keyed by `pair_document_id(event_id, user_id)`
    pub const EVENT_REGISTRATIONS: &str = "event_registrations";
    /// Keyed by `pair_document_id(event_id, user_id)`
    pub const EVENT_ATTENDANCE: &str = "event_attendance";
}

/// Random document ID (16 bytes, hex).
pub fn new_document_id() -> Result<String, AppError> {
    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(hex::encode(bytes))
}

/// Datastore handle shared by all request handlers.
#[derive(Clone)]
pub enum Db {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

macro_rules! dispatch {
    ($self:ident . $method:ident ( $($arg:expr),* )) => {
        match $self {
            Db::Firestore(db) => db.$method($($arg),*).await,
            Db::Memory(db) => db.$method($($arg),*).await,
        }
    };
}

impl Db {
    /// Fresh, empty in-memory store.
    pub fn in_memory() -> Self {
        Db::Memory(MemoryDb::default())
    }

    // ─── Users ───────────────────────────────────────────────────

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        dispatch!(self.get_user(user_id))
    }

    /// Create or update a user from an identity-provider sync.
    pub async fn sync_user(&self, profile: &UserProfile) -> Result<User, AppError> {
        dispatch!(self.sync_user(profile))
    }

    /// Delete a user and everything they own. Returns the number of
    /// documents removed.
    pub async fn delete_user_data(&self, user_id: &str) -> Result<usize, AppError> {
        dispatch!(self.delete_user_data(user_id))
    }

    // ─── Ledger ──────────────────────────────────────────────────

    pub async fn credit_points(
        &self,
        user_id: &str,
        amount: i64,
        description: &str,
    ) -> Result<LedgerPosting, AppError> {
        dispatch!(self.credit_points(user_id, amount, description))
    }

    pub async fn debit_points(
        &self,
        user_id: &str,
        amount: i64,
        reward_id: Option<&str>,
        description: &str,
    ) -> Result<LedgerPosting, AppError> {
        dispatch!(self.debit_points(user_id, amount, reward_id, description))
    }

    /// A user's ledger entries, oldest first.
    pub async fn list_transactions(&self, user_id: &str) -> Result<Vec<Transaction>, AppError> {
        dispatch!(self.list_transactions(user_id))
    }

    // ─── Rewards ─────────────────────────────────────────────────

    pub async fn create_reward(&self, reward: NewReward) -> Result<Reward, AppError> {
        dispatch!(self.create_reward(reward))
    }

    pub async fn get_reward(&self, reward_id: &str) -> Result<Option<Reward>, AppError> {
        dispatch!(self.get_reward(reward_id))
    }

    pub async fn list_rewards(&self) -> Result<Vec<Reward>, AppError> {
        dispatch!(self.list_rewards())
    }

    pub async fn redeem_reward(
        &self,
        user_id: &str,
        reward_id: &str,
    ) -> Result<RedemptionPlan, AppError> {
        dispatch!(self.redeem_reward(user_id, reward_id))
    }

    // ─── Reports ─────────────────────────────────────────────────

    pub async fn create_report(
        &self,
        user_id: &str,
        report: NewReport,
        points: i64,
    ) -> Result<ReportPlan, AppError> {
        dispatch!(self.create_report(user_id, report, points))
    }

    pub async fn get_report(&self, report_id: &str) -> Result<Option<Report>, AppError> {
        dispatch!(self.get_report(report_id))
    }

    /// Reports, newest first.
    pub async fn list_reports(
        &self,
        status: Option<ReportStatus>,
    ) -> Result<Vec<Report>, AppError> {
        dispatch!(self.list_reports(status))
    }

    pub async fn collect_report(
        &self,
        report_id: &str,
        collector_id: &str,
        comments: String,
        points: i64,
    ) -> Result<CollectionPlan, AppError> {
        dispatch!(self.collect_report(report_id, collector_id, comments, points))
    }

    // ─── Events ──────────────────────────────────────────────────

    pub async fn create_event(
        &self,
        organizer_id: &str,
        event: NewEvent,
    ) -> Result<Event, AppError> {
        dispatch!(self.create_event(organizer_id, event))
    }

    pub async fn get_event(&self, event_id: &str) -> Result<Option<Event>, AppError> {
        dispatch!(self.get_event(event_id))
    }

    /// Events, soonest first.
    pub async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        dispatch!(self.list_events())
    }

    pub async fn register_for_event(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<EventRegistration, AppError> {
        dispatch!(self.register_for_event(event_id, user_id))
    }

    pub async fn cancel_registration(&self, event_id: &str, user_id: &str) -> Result<(), AppError> {
        dispatch!(self.cancel_registration(event_id, user_id))
    }

    pub async fn get_registration(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<EventRegistration>, AppError> {
        dispatch!(self.get_registration(event_id, user_id))
    }

    /// Committed registrations for an event.
    pub async fn registration_count(&self, event_id: &str) -> Result<u32, AppError> {
        dispatch!(self.registration_count(event_id))
    }

    // ─── Attendance ──────────────────────────────────────────────

    pub async fn verify_attendance(
        &self,
        scan: &Scan,
        points: i64,
    ) -> Result<VerificationPlan, AppError> {
        dispatch!(self.verify_attendance(scan, points))
    }

    pub async fn attendance_count(&self, event_id: &str) -> Result<u32, AppError> {
        dispatch!(self.attendance_count(event_id))
    }

    /// Verified attendees, first-verified first.
    pub async fn list_attendees(&self, event_id: &str) -> Result<Vec<Attendee>, AppError> {
        dispatch!(self.list_attendees(event_id))
    }
}
