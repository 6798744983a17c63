// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Race-Guide-Relay API Server
//!
//! Logs in to the upstream sim-racing platform, keeps the session alive,
//! and relays official race listings to the browser.

use race_guide_relay::{
    config::Config,
    db::FirestoreDb,
    services::{
        cache::spawn_purge_task, AuthManager, CredentialStore, RaceCache, RaceFetcher,
        RequestGateway, UpstreamApi, UpstreamClient,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        upstream = %config.upstream_base_url,
        login_cooldown_secs = config.login_cooldown.as_secs(),
        cache_ttl_secs = config.cache_ttl.as_secs(),
        "Starting Race-Guide-Relay API"
    );

    // Optional race archive
    let db = match config.gcp_project_id.as_deref() {
        Some(project_id) => FirestoreDb::new(project_id).await?,
        None => {
            tracing::info!("GCP_PROJECT_ID not set, race archive disabled");
            FirestoreDb::new_mock()
        }
    };

    // Upstream client shared by auth and race fetching
    let upstream: Arc<dyn UpstreamApi> = Arc::new(UpstreamClient::new(&config)?);

    // Process-wide credential store and race page cache
    let store = Arc::new(CredentialStore::new());
    let cache = RaceCache::new(config.cache_ttl);
    spawn_purge_task(cache.clone(), config.cache_purge_interval);
    tracing::info!(
        purge_interval_secs = config.cache_purge_interval.as_secs(),
        "Race cache initialized"
    );

    let auth = Arc::new(AuthManager::new(
        upstream.clone(),
        store,
        config.login_cooldown,
    ));
    let fetcher = RaceFetcher::new(upstream, cache);
    let gateway = RequestGateway::new(auth, fetcher);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        gateway,
    });

    // Build router
    let app = race_guide_relay::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("race_guide_relay=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
