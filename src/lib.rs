// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Race-Guide-Relay: official race listings from the upstream sim-racing API
//!
//! This crate provides the backend API that logs in to the upstream
//! platform, keeps its session cookie alive, and relays paged, cached
//! official race listings to the browser.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::RequestGateway;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub gateway: RequestGateway,
}
