// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory datastore for local development and tests.
//!
//! All tables live behind one async mutex, so each operation sees a
//! consistent snapshot and commits as a unit (serializable isolation).
//! Plans are computed before any table is touched, so a rejected check
//! leaves nothing behind.

use crate::db::new_document_id;
use crate::error::AppError;
use crate::models::event::pair_document_id;
use crate::models::{
    Attendee, CollectedWaste, Event, EventAttendance, EventRegistration, NewEvent, NewReward,
    Report, ReportStatus, Reward, Transaction, User, UserProfile,
};
use crate::services::attendance::{self, Scan, VerificationPlan};
use crate::services::collection::{self, CollectionPlan, NewReport, ReportPlan};
use crate::services::ledger::{self, LedgerPosting};
use crate::services::redemption::{self, RedemptionPlan};
use crate::services::registration;
use crate::time_utils::now_rfc3339;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    /// Append-only, in commit order
    transactions: Vec<Transaction>,
    rewards: HashMap<String, Reward>,
    reports: HashMap<String, Report>,
    collected_waste: HashMap<String, CollectedWaste>,
    events: HashMap<String, Event>,
    registrations: HashMap<String, EventRegistration>,
    attendance: HashMap<String, EventAttendance>,
}

impl Tables {
    fn apply_posting(&mut self, posting: &LedgerPosting) {
        self.users
            .insert(posting.user.id.clone(), posting.user.clone());
        self.transactions.push(posting.transaction.clone());
    }
}

/// In-memory database.
#[derive(Clone, Default)]
pub struct MemoryDb {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryDb {
    // ─── Users ───────────────────────────────────────────────────

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.tables.lock().await.users.get(user_id).cloned())
    }

    pub async fn sync_user(&self, profile: &UserProfile) -> Result<User, AppError> {
        let mut tables = self.tables.lock().await;
        let existing = tables.users.get(&profile.id).cloned();
        let user = User::from_sync(existing, profile, &now_rfc3339());
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    pub async fn delete_user_data(&self, user_id: &str) -> Result<usize, AppError> {
        let mut tables = self.tables.lock().await;
        let mut deleted = 0;

        // Registrations, keeping each event's committed count in step.
        let registrations: Vec<String> = tables
            .registrations
            .iter()
            .filter(|(_, r)| r.user_id == user_id)
            .map(|(key, _)| key.clone())
            .collect();
        for key in registrations {
            if let Some(registration) = tables.registrations.remove(&key) {
                if let Some(event) = tables.events.get_mut(&registration.event_id) {
                    event.registered_count = event.registered_count.saturating_sub(1);
                }
                deleted += 1;
            }
        }

        let before = tables.attendance.len();
        tables.attendance.retain(|_, a| a.user_id != user_id);
        deleted += before - tables.attendance.len();

        let before = tables.transactions.len();
        tables.transactions.retain(|t| t.user_id != user_id);
        deleted += before - tables.transactions.len();

        let owned_reports: Vec<String> = tables
            .reports
            .values()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.id.clone())
            .collect();
        for report_id in &owned_reports {
            tables.reports.remove(report_id);
            deleted += 1;
        }

        let before = tables.collected_waste.len();
        tables
            .collected_waste
            .retain(|id, c| c.collector_id != user_id && !owned_reports.contains(id));
        deleted += before - tables.collected_waste.len();

        if tables.users.remove(user_id).is_some() {
            deleted += 1;
        }

        tracing::info!(user_id, deleted, "User data deletion complete");
        Ok(deleted)
    }

    // ─── Ledger ──────────────────────────────────────────────────

    pub async fn credit_points(
        &self,
        user_id: &str,
        amount: i64,
        description: &str,
    ) -> Result<LedgerPosting, AppError> {
        let mut tables = self.tables.lock().await;
        let user = tables
            .users
            .get(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let posting = ledger::credit(
            user,
            amount,
            description,
            new_document_id()?,
            &now_rfc3339(),
        )?;
        tables.apply_posting(&posting);
        Ok(posting)
    }

    pub async fn debit_points(
        &self,
        user_id: &str,
        amount: i64,
        reward_id: Option<&str>,
        description: &str,
    ) -> Result<LedgerPosting, AppError> {
        let mut tables = self.tables.lock().await;
        let user = tables
            .users
            .get(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let posting = ledger::debit(
            user,
            amount,
            reward_id,
            description,
            new_document_id()?,
            &now_rfc3339(),
        )?;
        tables.apply_posting(&posting);
        Ok(posting)
    }

    pub async fn list_transactions(&self, user_id: &str) -> Result<Vec<Transaction>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    // ─── Rewards ─────────────────────────────────────────────────

    pub async fn create_reward(&self, reward: NewReward) -> Result<Reward, AppError> {
        let reward = reward.into_reward(new_document_id()?, &now_rfc3339());
        self.tables
            .lock()
            .await
            .rewards
            .insert(reward.id.clone(), reward.clone());
        Ok(reward)
    }

    pub async fn get_reward(&self, reward_id: &str) -> Result<Option<Reward>, AppError> {
        Ok(self.tables.lock().await.rewards.get(reward_id).cloned())
    }

    pub async fn list_rewards(&self) -> Result<Vec<Reward>, AppError> {
        let tables = self.tables.lock().await;
        let mut rewards: Vec<Reward> = tables.rewards.values().cloned().collect();
        rewards.sort_by(|a, b| {
            a.points_required
                .cmp(&b.points_required)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(rewards)
    }

    pub async fn redeem_reward(
        &self,
        user_id: &str,
        reward_id: &str,
    ) -> Result<RedemptionPlan, AppError> {
        let mut tables = self.tables.lock().await;

        let plan = redemption::plan_redemption(
            tables.users.get(user_id),
            tables.rewards.get(reward_id),
            user_id,
            reward_id,
            new_document_id()?,
            &now_rfc3339(),
        )?;

        tables
            .rewards
            .insert(plan.reward.id.clone(), plan.reward.clone());
        tables.apply_posting(&plan.posting);
        Ok(plan)
    }

    // ─── Reports ─────────────────────────────────────────────────

    pub async fn create_report(
        &self,
        user_id: &str,
        report: NewReport,
        points: i64,
    ) -> Result<ReportPlan, AppError> {
        let mut tables = self.tables.lock().await;

        let plan = collection::plan_report(
            tables.users.get(user_id),
            user_id,
            new_document_id()?,
            report,
            points,
            new_document_id()?,
            &now_rfc3339(),
        )?;

        tables
            .reports
            .insert(plan.report.id.clone(), plan.report.clone());
        if let Some(posting) = &plan.posting {
            tables.apply_posting(posting);
        }
        Ok(plan)
    }

    pub async fn get_report(&self, report_id: &str) -> Result<Option<Report>, AppError> {
        Ok(self.tables.lock().await.reports.get(report_id).cloned())
    }

    pub async fn list_reports(
        &self,
        status: Option<ReportStatus>,
    ) -> Result<Vec<Report>, AppError> {
        let tables = self.tables.lock().await;
        let mut reports: Vec<Report> = tables
            .reports
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(reports)
    }

    pub async fn collect_report(
        &self,
        report_id: &str,
        collector_id: &str,
        comments: String,
        points: i64,
    ) -> Result<CollectionPlan, AppError> {
        let mut tables = self.tables.lock().await;

        let plan = collection::plan_collection(
            tables.reports.get(report_id),
            tables.collected_waste.get(report_id),
            tables.users.get(collector_id),
            report_id,
            collector_id,
            comments,
            points,
            new_document_id()?,
            &now_rfc3339(),
        )?;

        tables
            .reports
            .insert(plan.report.id.clone(), plan.report.clone());
        tables
            .collected_waste
            .insert(plan.record.report_id.clone(), plan.record.clone());
        if let Some(posting) = &plan.posting {
            tables.apply_posting(posting);
        }
        Ok(plan)
    }

    // ─── Events ──────────────────────────────────────────────────

    pub async fn create_event(
        &self,
        organizer_id: &str,
        event: NewEvent,
    ) -> Result<Event, AppError> {
        let event = event.into_event(new_document_id()?, organizer_id, &now_rfc3339());
        self.tables
            .lock()
            .await
            .events
            .insert(event.id.clone(), event.clone());
        Ok(event)
    }

    pub async fn get_event(&self, event_id: &str) -> Result<Option<Event>, AppError> {
        Ok(self.tables.lock().await.events.get(event_id).cloned())
    }

    pub async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        let tables = self.tables.lock().await;
        let mut events: Vec<Event> = tables.events.values().cloned().collect();
        events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(events)
    }

    pub async fn register_for_event(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<EventRegistration, AppError> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(user_id) {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        let key = pair_document_id(event_id, user_id);
        let plan = registration::plan_registration(
            tables.events.get(event_id),
            tables.registrations.get(&key),
            event_id,
            user_id,
            registration::generate_qr_token()?,
            &now_rfc3339(),
        )?;

        tables.events.insert(plan.event.id.clone(), plan.event);
        tables.registrations.insert(key, plan.registration.clone());
        Ok(plan.registration)
    }

    pub async fn cancel_registration(&self, event_id: &str, user_id: &str) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        let key = pair_document_id(event_id, user_id);

        let event = registration::plan_cancellation(
            tables.events.get(event_id),
            tables.registrations.get(&key),
            tables.attendance.get(&key),
            event_id,
        )?;

        tables.events.insert(event.id.clone(), event);
        tables.registrations.remove(&key);
        Ok(())
    }

    pub async fn get_registration(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<EventRegistration>, AppError> {
        let key = pair_document_id(event_id, user_id);
        Ok(self.tables.lock().await.registrations.get(&key).cloned())
    }

    pub async fn registration_count(&self, event_id: &str) -> Result<u32, AppError> {
        let tables = self.tables.lock().await;
        let count = tables
            .registrations
            .values()
            .filter(|r| r.event_id == event_id)
            .count();
        Ok(count as u32)
    }

    // ─── Attendance ──────────────────────────────────────────────

    pub async fn verify_attendance(
        &self,
        scan: &Scan,
        points: i64,
    ) -> Result<VerificationPlan, AppError> {
        let mut tables = self.tables.lock().await;
        let key = pair_document_id(&scan.event_id, &scan.user_id);

        let plan = attendance::plan_check_in(
            scan,
            tables.events.get(&scan.event_id),
            tables.registrations.get(&key),
            tables.attendance.get(&key),
            tables.users.get(&scan.user_id),
            points,
            new_document_id()?,
            &now_rfc3339(),
        )?;

        tables.attendance.insert(key, plan.attendance.clone());
        if let Some(posting) = &plan.posting {
            tables.apply_posting(posting);
        }
        Ok(plan)
    }

    pub async fn attendance_count(&self, event_id: &str) -> Result<u32, AppError> {
        let tables = self.tables.lock().await;
        let count = tables
            .attendance
            .values()
            .filter(|a| a.event_id == event_id)
            .count();
        Ok(count as u32)
    }

    pub async fn list_attendees(&self, event_id: &str) -> Result<Vec<Attendee>, AppError> {
        let tables = self.tables.lock().await;
        let mut attendees: Vec<Attendee> = tables
            .attendance
            .values()
            .filter(|a| a.event_id == event_id)
            .map(|a| Attendee {
                user_id: a.user_id.clone(),
                user_name: tables
                    .users
                    .get(&a.user_id)
                    .map(|u| u.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                verified_at: a.verified_at.clone(),
            })
            .collect();
        attendees.sort_by(|a, b| {
            a.verified_at
                .cmp(&b.verified_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(attendees)
    }
}
