// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Every failure carries a stable machine-readable code so the frontend can
//! tell "already checked in" apart from "wrong code" without parsing text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Coarse failure class, independent of transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    /// State already satisfies the request; callers may treat it as benign.
    Conflict,
    InvalidInput,
    ResourceExhausted,
    Upstream,
    Internal,
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Missing required fields: {0}")]
    MissingFields(String),

    #[error("Scanned code does not match the registration")]
    TokenMismatch,

    #[error("User is not registered for this event")]
    NotRegistered,

    #[error("User is already registered for this event")]
    AlreadyRegistered,

    #[error("Attendance already verified")]
    AlreadyVerified,

    #[error("Attendance already verified; registration can no longer be cancelled")]
    AlreadyAttended,

    #[error("Report has already been collected")]
    AlreadyCollected,

    #[error("Insufficient points: {required} required, {available} available")]
    InsufficientPoints { required: i64, available: i64 },

    #[error("Reward is out of stock")]
    OutOfStock,

    #[error("Event is at capacity ({capacity})")]
    CapacityExceeded { capacity: u32 },

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// Failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Unauthorized | AppError::InvalidToken | AppError::Forbidden(_) => {
                ErrorKind::Unauthorized
            }
            AppError::NotFound(_) | AppError::NotRegistered => ErrorKind::NotFound,
            AppError::BadRequest(_) | AppError::MissingFields(_) | AppError::TokenMismatch => {
                ErrorKind::InvalidInput
            }
            AppError::AlreadyRegistered
            | AppError::AlreadyVerified
            | AppError::AlreadyAttended
            | AppError::AlreadyCollected => ErrorKind::Conflict,
            AppError::InsufficientPoints { .. }
            | AppError::OutOfStock
            | AppError::CapacityExceeded { .. } => ErrorKind::ResourceExhausted,
            AppError::Upstream(_) => ErrorKind::Upstream,
            AppError::Database(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::InvalidToken => "invalid_token",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::MissingFields(_) => "missing_fields",
            AppError::TokenMismatch => "token_mismatch",
            AppError::NotRegistered => "not_registered",
            AppError::AlreadyRegistered => "already_registered",
            AppError::AlreadyVerified => "already_verified",
            AppError::AlreadyAttended => "already_attended",
            AppError::AlreadyCollected => "already_collected",
            AppError::InsufficientPoints { .. } => "insufficient_points",
            AppError::OutOfStock => "out_of_stock",
            AppError::CapacityExceeded { .. } => "capacity_exceeded",
            AppError::Upstream(_) => "upstream_error",
            AppError::Database(_) => "database_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::NotRegistered => StatusCode::NOT_FOUND,
            AppError::BadRequest(_)
            | AppError::MissingFields(_)
            | AppError::TokenMismatch
            | AppError::InsufficientPoints { .. }
            | AppError::OutOfStock
            | AppError::CapacityExceeded { .. } => StatusCode::BAD_REQUEST,
            AppError::AlreadyRegistered
            | AppError::AlreadyVerified
            | AppError::AlreadyAttended
            | AppError::AlreadyCollected => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let details = match &self {
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                None
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                None
            }
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Upstream error");
                Some(msg.clone())
            }
            // Never echo anything about the expected token.
            AppError::TokenMismatch => None,
            AppError::Unauthorized | AppError::InvalidToken => None,
            other => Some(other.to_string()),
        };

        let body = ErrorResponse {
            error: self.code().to_string(),
            details,
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
