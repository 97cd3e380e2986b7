// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod event;
pub mod report;
pub mod reward;
pub mod transaction;
pub mod user;

pub use event::{Attendee, Event, EventAttendance, EventRegistration, NewEvent};
pub use report::{CollectedWaste, Report, ReportStatus};
pub use reward::{NewReward, Reward};
pub use transaction::{Transaction, TransactionType};
pub use user::{User, UserProfile};
