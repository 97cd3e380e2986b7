// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Waste report and collection models.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Lifecycle of a report: pending until collected, exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Collected,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Collected => "collected",
        }
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "collected" => Ok(ReportStatus::Collected),
            other => Err(format!("unknown report status: {}", other)),
        }
    }
}

/// User-submitted waste report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Document ID
    pub id: String,
    /// Reporting user
    pub user_id: String,
    pub location: String,
    pub waste_type: String,
    /// Free-form quantity, e.g. "5 kg"
    pub amount: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Opaque verification payload (e.g. image classification output)
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub verification_result: Option<serde_json::Value>,
    pub status: ReportStatus,
    #[serde(default)]
    pub collector_id: Option<String>,
    pub created_at: String,
}

/// One-per-report record of a fulfilled collection (document ID = report ID).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedWaste {
    pub report_id: String,
    pub collector_id: String,
    #[serde(default)]
    pub comments: String,
    pub collected_at: String,
}
