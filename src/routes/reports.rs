// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Waste report and collection routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Report, ReportStatus};
use crate::routes::validated;
use crate::services::collection::NewReport;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/reports", get(list_reports).post(create_report))
        .route("/api/reports/{id}", get(get_report))
        .route("/api/reports/{id}/collect", post(collect))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateReportRequest {
    #[validate(length(min = 1, max = 500))]
    location: String,
    #[validate(length(min = 1, max = 100))]
    waste_type: String,
    #[validate(length(min = 1, max = 100))]
    amount: String,
    #[validate(url)]
    image_url: Option<String>,
    verification_result: Option<serde_json::Value>,
}

/// New report and the reporter's credit.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub report: Report,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub points_awarded: i64,
}

async fn create_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateReportRequest>,
) -> Result<(StatusCode, Json<ReportResponse>)> {
    let body = validated(body)?;

    let plan = state
        .db
        .create_report(
            &user.user_id,
            NewReport {
                location: body.location,
                waste_type: body.waste_type,
                amount: body.amount,
                image_url: body.image_url,
                verification_result: body.verification_result,
            },
            state.config.report_points,
        )
        .await?;

    let points_awarded = plan.posting.as_ref().map_or(0, |p| p.transaction.amount);
    tracing::info!(
        user_id = %user.user_id,
        report_id = %plan.report.id,
        points_awarded,
        "Report submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(ReportResponse {
            report: plan.report,
            points_awarded,
        }),
    ))
}

#[derive(Deserialize)]
struct ReportsQuery {
    status: Option<String>,
}

async fn list_reports(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportsQuery>,
) -> Result<Json<Vec<Report>>> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<ReportStatus>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    Ok(Json(state.db.list_reports(status).await?))
}

async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Report>> {
    state
        .db
        .get_report(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))
}

#[derive(Deserialize, Validate)]
struct CollectRequest {
    #[serde(default)]
    #[validate(length(max = 2000))]
    comments: String,
}

/// Collected report and the collector's credit.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct CollectResponse {
    pub success: bool,
    pub report: Report,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub points_awarded: i64,
}

/// Fulfil a report as the caller. Succeeds once per report.
async fn collect(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(report_id): Path<String>,
    Json(body): Json<CollectRequest>,
) -> Result<Json<CollectResponse>> {
    let body = validated(body)?;

    let plan = match state
        .db
        .collect_report(
            &report_id,
            &user.user_id,
            body.comments,
            state.config.collection_points,
        )
        .await
    {
        Ok(plan) => plan,
        Err(e @ AppError::AlreadyCollected) => {
            tracing::debug!(report_id = %report_id, user_id = %user.user_id, "Report already collected");
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    let points_awarded = plan.posting.as_ref().map_or(0, |p| p.transaction.amount);
    tracing::info!(
        report_id = %report_id,
        collector_id = %user.user_id,
        points_awarded,
        "Report collected"
    );

    Ok(Json(CollectResponse {
        success: true,
        report: plan.report,
        points_awarded,
    }))
}
