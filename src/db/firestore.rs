// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Multi-document mutations run inside one Firestore transaction. Reads for
//! those mutations go through a client bound to the transaction, which
//! registers the documents for conflict detection: if another request
//! commits a write to any of them first, our commit fails instead of
//! overdrawing points or stock.
//!
//! Per-(event, user) records use deterministic document IDs, so a second
//! registration or attendance for the same pair lands on the same document.

use crate::db::{collections, new_document_id};
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
use firestore::{FirestoreConsistencySelector, FirestoreQueryDirection, FirestoreTransaction};
use futures_util::{stream, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

fn db_err(e: impl std::fmt::Display) -> AppError {
    AppError::Database(e.to_string())
}

/// Read one document by ID.
async fn read<T>(
    client: &firestore::FirestoreDb,
    collection: &str,
    id: &str,
) -> Result<Option<T>, AppError>
where
    T: DeserializeOwned + Send,
{
    client
        .fluent()
        .select()
        .by_id_in(collection)
        .obj()
        .one(id)
        .await
        .map_err(db_err)
}

/// Query all documents whose `field` equals `value`.
async fn query_eq<T>(
    client: &firestore::FirestoreDb,
    collection: &str,
    field: &'static str,
    value: &str,
) -> Result<Vec<T>, AppError>
where
    T: DeserializeOwned + Send,
{
    let value = value.to_string();
    client
        .fluent()
        .select()
        .from(collection)
        .filter(move |q| q.for_all([q.field(field).eq(value.clone())]))
        .obj()
        .query()
        .await
        .map_err(db_err)
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation returns a database error.
    pub fn new_offline() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Transaction Helpers ─────────────────────────────────────

    /// Begin a transaction and return it with a client whose reads are
    /// bound to it.
    async fn begin(
        &self,
    ) -> Result<(FirestoreTransaction<'_>, firestore::FirestoreDb), AppError> {
        let client = self.get_client()?;
        let transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        let reader = client.clone_with_consistency_selector(
            FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone()),
        );
        Ok((transaction, reader))
    }

    /// Roll back after a rejected check and hand the error back.
    async fn abort<T>(transaction: FirestoreTransaction<'_>, err: AppError) -> Result<T, AppError> {
        let _ = transaction.rollback().await;
        Err(err)
    }

    /// Add an upsert of `object` to the transaction.
    fn stage<T>(
        &self,
        transaction: &mut FirestoreTransaction<'_>,
        collection: &str,
        document_id: &str,
        object: &T,
    ) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        self.get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(document_id)
            .object(object)
            .add_to_transaction(transaction)
            .map_err(|e| {
                AppError::Database(format!(
                    "Failed to add {} write to transaction: {}",
                    collection, e
                ))
            })?;
        Ok(())
    }

    /// Add a delete to the transaction.
    fn stage_delete(
        &self,
        transaction: &mut FirestoreTransaction<'_>,
        collection: &str,
        document_id: &str,
    ) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(document_id)
            .add_to_transaction(transaction)
            .map_err(|e| {
                AppError::Database(format!(
                    "Failed to add {} deletion to transaction: {}",
                    collection, e
                ))
            })?;
        Ok(())
    }

    /// Stage the balance update and the ledger entry together.
    fn stage_posting(
        &self,
        transaction: &mut FirestoreTransaction<'_>,
        posting: &LedgerPosting,
    ) -> Result<(), AppError> {
        self.stage(transaction, collections::USERS, &posting.user.id, &posting.user)?;
        self.stage(
            transaction,
            collections::TRANSACTIONS,
            &posting.transaction.id,
            &posting.transaction,
        )
    }

    async fn commit(
        transaction: FirestoreTransaction<'_>,
        operation: &'static str,
    ) -> Result<(), AppError> {
        transaction.commit().await.map_err(|e| {
            tracing::error!(operation, error = %e, "Transaction commit failed");
            AppError::Database(format!("Transaction commit failed: {}", e))
        })?;
        Ok(())
    }

    /// Upsert a single document outside a transaction.
    async fn put<T>(&self, collection: &str, document_id: &str, object: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(document_id)
            .object(object)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        read(self.get_client()?, collections::USERS, user_id).await
    }

    /// Create or update a user without clobbering a concurrently updated
    /// balance.
    pub async fn sync_user(&self, profile: &UserProfile) -> Result<User, AppError> {
        let (mut transaction, reader) = self.begin().await?;

        let existing: Option<User> = match read(&reader, collections::USERS, &profile.id).await {
            Ok(existing) => existing,
            Err(e) => return Self::abort(transaction, e).await,
        };
        let user = User::from_sync(existing, profile, &now_rfc3339());

        self.stage(&mut transaction, collections::USERS, &user.id, &user)?;
        Self::commit(transaction, "sync_user").await?;
        Ok(user)
    }

    // ─── Ledger Operations ───────────────────────────────────────

    pub async fn credit_points(
        &self,
        user_id: &str,
        amount: i64,
        description: &str,
    ) -> Result<LedgerPosting, AppError> {
        let (mut transaction, reader) = self.begin().await?;

        let planned = async {
            let user: User = read(&reader, collections::USERS, user_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
            ledger::credit(
                &user,
                amount,
                description,
                new_document_id()?,
                &now_rfc3339(),
            )
        }
        .await;
        let posting = match planned {
            Ok(posting) => posting,
            Err(e) => return Self::abort(transaction, e).await,
        };

        self.stage_posting(&mut transaction, &posting)?;
        Self::commit(transaction, "credit_points").await?;
        Ok(posting)
    }

    pub async fn debit_points(
        &self,
        user_id: &str,
        amount: i64,
        reward_id: Option<&str>,
        description: &str,
    ) -> Result<LedgerPosting, AppError> {
        let (mut transaction, reader) = self.begin().await?;

        let planned = async {
            let user: User = read(&reader, collections::USERS, user_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
            ledger::debit(
                &user,
                amount,
                reward_id,
                description,
                new_document_id()?,
                &now_rfc3339(),
            )
        }
        .await;
        let posting = match planned {
            Ok(posting) => posting,
            Err(e) => return Self::abort(transaction, e).await,
        };

        self.stage_posting(&mut transaction, &posting)?;
        Self::commit(transaction, "debit_points").await?;
        Ok(posting)
    }

    pub async fn list_transactions(&self, user_id: &str) -> Result<Vec<Transaction>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TRANSACTIONS)
            .filter(move |q| q.for_all([q.field("userId").eq(user_id.clone())]))
            .order_by([("createdAt", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    // ─── Reward Operations ───────────────────────────────────────

    pub async fn create_reward(&self, reward: NewReward) -> Result<Reward, AppError> {
        let reward = reward.into_reward(new_document_id()?, &now_rfc3339());
        self.put(collections::REWARDS, &reward.id, &reward).await?;
        Ok(reward)
    }

    pub async fn get_reward(&self, reward_id: &str) -> Result<Option<Reward>, AppError> {
        read(self.get_client()?, collections::REWARDS, reward_id).await
    }

    pub async fn list_rewards(&self) -> Result<Vec<Reward>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::REWARDS)
            .order_by([
                ("pointsRequired", FirestoreQueryDirection::Ascending),
                ("name", FirestoreQueryDirection::Ascending),
            ])
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    /// Redeem one unit of a reward: stock decrement and points debit commit
    /// together.
    pub async fn redeem_reward(
        &self,
        user_id: &str,
        reward_id: &str,
    ) -> Result<RedemptionPlan, AppError> {
        let (mut transaction, reader) = self.begin().await?;

        let planned = async {
            let user: Option<User> = read(&reader, collections::USERS, user_id).await?;
            let reward: Option<Reward> = read(&reader, collections::REWARDS, reward_id).await?;
            redemption::plan_redemption(
                user.as_ref(),
                reward.as_ref(),
                user_id,
                reward_id,
                new_document_id()?,
                &now_rfc3339(),
            )
        }
        .await;
        let plan = match planned {
            Ok(plan) => plan,
            Err(e) => return Self::abort(transaction, e).await,
        };

        self.stage(
            &mut transaction,
            collections::REWARDS,
            &plan.reward.id,
            &plan.reward,
        )?;
        self.stage_posting(&mut transaction, &plan.posting)?;
        Self::commit(transaction, "redeem_reward").await?;
        Ok(plan)
    }

    // ─── Report Operations ───────────────────────────────────────

    pub async fn create_report(
        &self,
        user_id: &str,
        report: NewReport,
        points: i64,
    ) -> Result<ReportPlan, AppError> {
        let (mut transaction, reader) = self.begin().await?;

        let planned = async {
            let reporter: Option<User> = read(&reader, collections::USERS, user_id).await?;
            collection::plan_report(
                reporter.as_ref(),
                user_id,
                new_document_id()?,
                report,
                points,
                new_document_id()?,
                &now_rfc3339(),
            )
        }
        .await;
        let plan = match planned {
            Ok(plan) => plan,
            Err(e) => return Self::abort(transaction, e).await,
        };

        self.stage(
            &mut transaction,
            collections::REPORTS,
            &plan.report.id,
            &plan.report,
        )?;
        if let Some(posting) = &plan.posting {
            self.stage_posting(&mut transaction, posting)?;
        }
        Self::commit(transaction, "create_report").await?;
        Ok(plan)
    }

    pub async fn get_report(&self, report_id: &str) -> Result<Option<Report>, AppError> {
        read(self.get_client()?, collections::REPORTS, report_id).await
    }

    pub async fn list_reports(
        &self,
        status: Option<ReportStatus>,
    ) -> Result<Vec<Report>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::REPORTS);

        let query = if let Some(status) = status {
            query.filter(move |q| q.for_all([q.field("status").eq(status.as_str())]))
        } else {
            query
        };

        query
            .order_by([("createdAt", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    /// Move a report to `collected` and credit the collector, exactly once.
    pub async fn collect_report(
        &self,
        report_id: &str,
        collector_id: &str,
        comments: String,
        points: i64,
    ) -> Result<CollectionPlan, AppError> {
        let (mut transaction, reader) = self.begin().await?;

        let planned = async {
            let report: Option<Report> = read(&reader, collections::REPORTS, report_id).await?;
            let existing: Option<CollectedWaste> =
                read(&reader, collections::COLLECTED_WASTE, report_id).await?;
            let collector: Option<User> = read(&reader, collections::USERS, collector_id).await?;
            collection::plan_collection(
                report.as_ref(),
                existing.as_ref(),
                collector.as_ref(),
                report_id,
                collector_id,
                comments,
                points,
                new_document_id()?,
                &now_rfc3339(),
            )
        }
        .await;
        let plan = match planned {
            Ok(plan) => plan,
            Err(e) => return Self::abort(transaction, e).await,
        };

        self.stage(
            &mut transaction,
            collections::REPORTS,
            &plan.report.id,
            &plan.report,
        )?;
        self.stage(
            &mut transaction,
            collections::COLLECTED_WASTE,
            &plan.record.report_id,
            &plan.record,
        )?;
        if let Some(posting) = &plan.posting {
            self.stage_posting(&mut transaction, posting)?;
        }
        Self::commit(transaction, "collect_report").await?;
        Ok(plan)
    }

    // ─── Event Operations ────────────────────────────────────────

    pub async fn create_event(
        &self,
        organizer_id: &str,
        event: NewEvent,
    ) -> Result<Event, AppError> {
        let event = event.into_event(new_document_id()?, organizer_id, &now_rfc3339());
        self.put(collections::EVENTS, &event.id, &event).await?;
        Ok(event)
    }

    pub async fn get_event(&self, event_id: &str) -> Result<Option<Event>, AppError> {
        read(self.get_client()?, collections::EVENTS, event_id).await
    }

    pub async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::EVENTS)
            .order_by([("date", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    /// Register a user. The event document's `registeredCount` is read and
    /// written in the same transaction, so concurrent registrations for one
    /// event serialize on it and cannot overfill capacity.
    pub async fn register_for_event(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<EventRegistration, AppError> {
        let doc_id = pair_document_id(event_id, user_id);
        let (mut transaction, reader) = self.begin().await?;

        let planned = async {
            let user: Option<User> = read(&reader, collections::USERS, user_id).await?;
            if user.is_none() {
                return Err(AppError::NotFound(format!("User {} not found", user_id)));
            }
            let event: Option<Event> = read(&reader, collections::EVENTS, event_id).await?;
            let existing: Option<EventRegistration> =
                read(&reader, collections::EVENT_REGISTRATIONS, &doc_id).await?;
            registration::plan_registration(
                event.as_ref(),
                existing.as_ref(),
                event_id,
                user_id,
                registration::generate_qr_token()?,
                &now_rfc3339(),
            )
        }
        .await;
        let plan = match planned {
            Ok(plan) => plan,
            Err(e) => return Self::abort(transaction, e).await,
        };

        self.stage(
            &mut transaction,
            collections::EVENTS,
            &plan.event.id,
            &plan.event,
        )?;
        self.stage(
            &mut transaction,
            collections::EVENT_REGISTRATIONS,
            &doc_id,
            &plan.registration,
        )?;
        Self::commit(transaction, "register_for_event").await?;
        Ok(plan.registration)
    }

    pub async fn cancel_registration(&self, event_id: &str, user_id: &str) -> Result<(), AppError> {
        let doc_id = pair_document_id(event_id, user_id);
        let (mut transaction, reader) = self.begin().await?;

        let planned = async {
            let event: Option<Event> = read(&reader, collections::EVENTS, event_id).await?;
            let existing: Option<EventRegistration> =
                read(&reader, collections::EVENT_REGISTRATIONS, &doc_id).await?;
            let attendance: Option<EventAttendance> =
                read(&reader, collections::EVENT_ATTENDANCE, &doc_id).await?;
            registration::plan_cancellation(
                event.as_ref(),
                existing.as_ref(),
                attendance.as_ref(),
                event_id,
            )
        }
        .await;
        let event = match planned {
            Ok(event) => event,
            Err(e) => return Self::abort(transaction, e).await,
        };

        self.stage(&mut transaction, collections::EVENTS, &event.id, &event)?;
        self.stage_delete(&mut transaction, collections::EVENT_REGISTRATIONS, &doc_id)?;
        Self::commit(transaction, "cancel_registration").await?;
        Ok(())
    }

    pub async fn get_registration(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<EventRegistration>, AppError> {
        read(
            self.get_client()?,
            collections::EVENT_REGISTRATIONS,
            &pair_document_id(event_id, user_id),
        )
        .await
    }

    /// Committed registrations, as recorded on the event document.
    pub async fn registration_count(&self, event_id: &str) -> Result<u32, AppError> {
        let event = self
            .get_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;
        Ok(event.registered_count)
    }

    // ─── Attendance Operations ───────────────────────────────────

    /// Record a check-in (and the optional attendance credit) atomically.
    pub async fn verify_attendance(
        &self,
        scan: &Scan,
        points: i64,
    ) -> Result<VerificationPlan, AppError> {
        let doc_id = pair_document_id(&scan.event_id, &scan.user_id);
        let (mut transaction, reader) = self.begin().await?;

        let planned = async {
            let registration: Option<EventRegistration> =
                read(&reader, collections::EVENT_REGISTRATIONS, &doc_id).await?;
            let existing: Option<EventAttendance> =
                read(&reader, collections::EVENT_ATTENDANCE, &doc_id).await?;
            let event: Option<Event> = read(&reader, collections::EVENTS, &scan.event_id).await?;
            let attendee: Option<User> = read(&reader, collections::USERS, &scan.user_id).await?;
            attendance::plan_check_in(
                scan,
                event.as_ref(),
                registration.as_ref(),
                existing.as_ref(),
                attendee.as_ref(),
                points,
                new_document_id()?,
                &now_rfc3339(),
            )
        }
        .await;
        let plan = match planned {
            Ok(plan) => plan,
            Err(e) => return Self::abort(transaction, e).await,
        };

        self.stage(
            &mut transaction,
            collections::EVENT_ATTENDANCE,
            &doc_id,
            &plan.attendance,
        )?;
        if let Some(posting) = &plan.posting {
            self.stage_posting(&mut transaction, posting)?;
        }
        Self::commit(transaction, "verify_attendance").await?;
        Ok(plan)
    }

    pub async fn attendance_count(&self, event_id: &str) -> Result<u32, AppError> {
        let rows: Vec<EventAttendance> = query_eq(
            self.get_client()?,
            collections::EVENT_ATTENDANCE,
            "eventId",
            event_id,
        )
        .await?;
        Ok(rows.len() as u32)
    }

    pub async fn list_attendees(&self, event_id: &str) -> Result<Vec<Attendee>, AppError> {
        let client = self.get_client()?;
        let event_id = event_id.to_string();

        let rows: Vec<EventAttendance> = client
            .fluent()
            .select()
            .from(collections::EVENT_ATTENDANCE)
            .filter(move |q| q.for_all([q.field("eventId").eq(event_id.clone())]))
            .order_by([("verifiedAt", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(db_err)?;

        // Resolve display names concurrently.
        let user_ids: Vec<String> = rows.iter().map(|r| r.user_id.clone()).collect();
        let names: HashMap<String, String> = stream::iter(user_ids)
            .map(|user_id| async move {
                let user: Option<User> = read(client, collections::USERS, &user_id).await?;
                Ok::<_, AppError>((user_id, user.map(|u| u.name)))
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(String, Option<String>), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, AppError>>()?
            .into_iter()
            .filter_map(|(id, name)| name.map(|n| (id, n)))
            .collect();

        Ok(rows
            .into_iter()
            .map(|a| Attendee {
                user_name: names
                    .get(&a.user_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                user_id: a.user_id,
                verified_at: a.verified_at,
            })
            .collect())
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete(&self, collection: &str, document_ids: &[String]) -> Result<(), AppError> {
        let client = self.get_client()?;

        for chunk in document_ids.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for doc_id in chunk {
                self.stage_delete(&mut transaction, collection, doc_id)?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    // ─── User Data Deletion ────────────────────────────────────────

    /// Delete ALL data for a user (identity-provider deletion cascade).
    ///
    /// Deletes:
    /// - `event_registrations` (each in a transaction with its event count)
    /// - `event_attendance`, `transactions` (query by userId)
    /// - `reports` owned by the user and their `collected_waste` records
    /// - `collected_waste` records made by the user as collector
    /// - `users/{user_id}`
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_user_data(&self, user_id: &str) -> Result<usize, AppError> {
        let client = self.get_client()?;
        let mut deleted_count = 0;

        // 1. Registrations, one transaction each so event counts stay exact
        let registrations: Vec<EventRegistration> = query_eq(
            client,
            collections::EVENT_REGISTRATIONS,
            "userId",
            user_id,
        )
        .await?;
        for registration in &registrations {
            self.remove_registration(&registration.event_id, user_id)
                .await?;
            deleted_count += 1;
        }
        tracing::debug!(user_id, count = registrations.len(), "Deleted registrations");

        // 2. Attendance records
        let attendance: Vec<EventAttendance> =
            query_eq(client, collections::EVENT_ATTENDANCE, "userId", user_id).await?;
        let ids: Vec<String> = attendance
            .iter()
            .map(|a| pair_document_id(&a.event_id, &a.user_id))
            .collect();
        self.batch_delete(collections::EVENT_ATTENDANCE, &ids).await?;
        deleted_count += ids.len();
        tracing::debug!(user_id, count = ids.len(), "Deleted attendance records");

        // 3. Ledger entries
        let transactions: Vec<Transaction> =
            query_eq(client, collections::TRANSACTIONS, "userId", user_id).await?;
        let ids: Vec<String> = transactions.into_iter().map(|t| t.id).collect();
        self.batch_delete(collections::TRANSACTIONS, &ids).await?;
        deleted_count += ids.len();
        tracing::debug!(user_id, count = ids.len(), "Deleted transactions");

        // 4. Reports owned by the user, plus collection records for them
        //    and collections made by the user
        let reports: Vec<Report> = query_eq(client, collections::REPORTS, "userId", user_id).await?;
        let report_ids: Vec<String> = reports.into_iter().map(|r| r.id).collect();
        let collected: Vec<CollectedWaste> = query_eq(
            client,
            collections::COLLECTED_WASTE,
            "collectorId",
            user_id,
        )
        .await?;
        let mut collected_ids: Vec<String> = collected.into_iter().map(|c| c.report_id).collect();
        for report_id in &report_ids {
            if !collected_ids.contains(report_id) {
                collected_ids.push(report_id.clone());
            }
        }
        // Deleting a missing document is a no-op in Firestore.
        self.batch_delete(collections::COLLECTED_WASTE, &collected_ids)
            .await?;
        self.batch_delete(collections::REPORTS, &report_ids).await?;
        deleted_count += report_ids.len() + collected_ids.len();
        tracing::debug!(user_id, count = report_ids.len(), "Deleted reports");

        // 5. User profile
        client
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(user_id)
            .execute()
            .await
            .map_err(db_err)?;
        deleted_count += 1;

        tracing::info!(user_id, deleted_count, "User data deletion complete");

        Ok(deleted_count)
    }

    /// Drop one registration and decrement its event's count.
    async fn remove_registration(&self, event_id: &str, user_id: &str) -> Result<(), AppError> {
        let doc_id = pair_document_id(event_id, user_id);
        let (mut transaction, reader) = self.begin().await?;

        let snapshot = async {
            let existing: Option<EventRegistration> =
                read(&reader, collections::EVENT_REGISTRATIONS, &doc_id).await?;
            let event: Option<Event> = read(&reader, collections::EVENTS, event_id).await?;
            Ok::<_, AppError>((existing, event))
        }
        .await;
        let event = match snapshot {
            // Already removed by a concurrent cancel or delete.
            Ok((None, _)) => {
                let _ = transaction.rollback().await;
                return Ok(());
            }
            Ok((Some(_), event)) => event,
            Err(e) => return Self::abort(transaction, e).await,
        };
        if let Some(mut event) = event {
            event.registered_count = event.registered_count.saturating_sub(1);
            self.stage(&mut transaction, collections::EVENTS, event_id, &event)?;
        }
        self.stage_delete(&mut transaction, collections::EVENT_REGISTRATIONS, &doc_id)?;
        Self::commit(transaction, "remove_registration").await
    }
}
