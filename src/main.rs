// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! WasteTrack API Server
//!
//! Serves the points ledger, reward catalog, waste reports and community
//! events to the web frontend.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wastetrack::{
    config::{Config, DatastoreKind},
    db::{Db, FirestoreDb},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting WasteTrack API");

    let db = match config.datastore {
        DatastoreKind::Firestore => Db::Firestore(FirestoreDb::new(&config.gcp_project_id).await?),
        DatastoreKind::Memory => {
            tracing::warn!("Using in-memory datastore; data is lost on restart");
            Db::in_memory()
        }
    };

    let state = Arc::new(AppState::new(config.clone(), db)?);
    if !state.ai_proxy.is_configured() {
        tracing::info!("AI endpoint not configured; /api/ai/generate will return 502");
    }

    // Build router
    let app = wastetrack::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wastetrack=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
