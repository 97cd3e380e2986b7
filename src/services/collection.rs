// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Waste report submission and collection rules.

use crate::error::{AppError, Result};
use crate::models::{CollectedWaste, Report, ReportStatus, User};
use crate::services::ledger::{self, LedgerPosting};

pub const REPORT_DESCRIPTION: &str = "Reported waste";
pub const COLLECTION_DESCRIPTION: &str = "Collected waste";

/// Fields supplied by the reporting user.
#[derive(Debug, Clone, Default)]
pub struct NewReport {
    pub location: String,
    pub waste_type: String,
    pub amount: String,
    pub image_url: Option<String>,
    pub verification_result: Option<serde_json::Value>,
}

/// Writes for a new report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPlan {
    pub report: Report,
    /// Reporter credit; None when report points are disabled
    pub posting: Option<LedgerPosting>,
}

/// Create a pending report and the optional reporter credit.
pub fn plan_report(
    reporter: Option<&User>,
    user_id: &str,
    report_id: String,
    input: NewReport,
    points: i64,
    transaction_id: String,
    now: &str,
) -> Result<ReportPlan> {
    let reporter =
        reporter.ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    let posting = if points > 0 {
        Some(ledger::credit(
            reporter,
            points,
            REPORT_DESCRIPTION,
            transaction_id,
            now,
        )?)
    } else {
        None
    };

    Ok(ReportPlan {
        report: Report {
            id: report_id,
            user_id: reporter.id.clone(),
            location: input.location,
            waste_type: input.waste_type,
            amount: input.amount,
            image_url: input.image_url,
            verification_result: input.verification_result,
            status: ReportStatus::Pending,
            collector_id: None,
            created_at: now.to_string(),
        },
        posting,
    })
}

/// Writes for a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionPlan {
    /// Report moved to `collected`
    pub report: Report,
    pub record: CollectedWaste,
    /// Collector credit; None when collection points are disabled
    pub posting: Option<LedgerPosting>,
}

/// Transition a report from pending to collected, exactly once.
#[allow(clippy::too_many_arguments)]
pub fn plan_collection(
    report: Option<&Report>,
    existing: Option<&CollectedWaste>,
    collector: Option<&User>,
    report_id: &str,
    collector_id: &str,
    comments: String,
    points: i64,
    transaction_id: String,
    now: &str,
) -> Result<CollectionPlan> {
    let report =
        report.ok_or_else(|| AppError::NotFound(format!("Report {} not found", report_id)))?;
    let collector = collector
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", collector_id)))?;

    if report.status == ReportStatus::Collected || existing.is_some() {
        return Err(AppError::AlreadyCollected);
    }

    let posting = if points > 0 {
        Some(ledger::credit(
            collector,
            points,
            COLLECTION_DESCRIPTION,
            transaction_id,
            now,
        )?)
    } else {
        None
    };

    let mut report = report.clone();
    report.status = ReportStatus::Collected;
    report.collector_id = Some(collector.id.clone());

    Ok(CollectionPlan {
        record: CollectedWaste {
            report_id: report.id.clone(),
            collector_id: collector.id.clone(),
            comments,
            collected_at: now.to_string(),
        },
        report,
        posting,
    })
}
