// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Clustr Map presence snapshot
//!
//! Signs in as `CLUSTR_USER_ID`, loads everything that user's map would
//! show, and prints the rendered pins as JSON.

use clustr_map::{
    config::Config,
    db::FirestoreDb,
    events::EventBus,
    services::PreferenceStore,
    ui::{LogDialog, ProfileIcon},
    MapSession,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    let user_id = config.require_user_id()?.to_string();
    tracing::info!(project = %config.gcp_project_id, user_id = %user_id, "Starting presence snapshot");

    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    let prefs = PreferenceStore::load(&config.store_path);
    tracing::info!(zoom = prefs.map().zoom, "Local preferences loaded");

    let bus = EventBus::new();
    let icon = ProfileIcon::attach(&bus);
    let session = MapSession::new(config, db, bus, LogDialog, prefs);

    session.handle_auth_change(Some(user_id.clone())).await;

    let snapshot = serde_json::json!({
        "userId": user_id,
        "zoom": session.current_zoom(),
        "profileIcon": icon.render(),
        "pins": session.render_pins(),
    });
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Initialize structured JSON logging (on stderr, stdout carries the snapshot).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clustr_map=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
