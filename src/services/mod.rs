// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod cache;
pub mod credential_store;
pub mod gateway;
pub mod race_fetcher;
pub mod upstream;

pub use auth::{AuthManager, CredentialLease};
pub use cache::{CacheEntry, CacheKey, RaceCache};
pub use credential_store::CredentialStore;
pub use gateway::{GatewayResponse, RequestGateway};
pub use race_fetcher::RaceFetcher;
pub use upstream::{UpstreamApi, UpstreamClient};
