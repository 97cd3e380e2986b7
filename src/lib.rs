// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! WasteTrack: community waste reporting, rewards and cleanup events
//!
//! This crate provides the backend API: a points ledger, reward
//! redemption, event registration with capacity limits, and QR-based
//! attendance verification.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use services::{AiProxy, WebhookVerifier};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub ai_proxy: AiProxy,
    pub webhook_verifier: WebhookVerifier,
}

impl AppState {
    /// Build state from config and an already-connected datastore.
    pub fn new(config: Config, db: Db) -> Result<Self, services::WebhookError> {
        let webhook_verifier = WebhookVerifier::new(&config.identity_webhook_secret)?;
        let ai_proxy = AiProxy::new(config.ai_endpoint.clone(), config.ai_api_key.clone());
        Ok(Self {
            config,
            db,
            ai_proxy,
            webhook_verifier,
        })
    }
}
