// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Official race listing routes.

use crate::error::{AppError, Result};
use crate::middleware::session::{session_header_value, SuppliedCredential, SESSION_HEADER};
use crate::models::{ArchivedRace, PageRequest, RaceEntry};
use crate::time_utils::normalize_rfc3339;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MAX_PAGE_SIZE: u32 = 100;
const MAX_ARCHIVE_LIMIT: u32 = 500;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/official-races", get(get_official_races))
        .route("/api/archived-races", get(get_archived_races))
}

// ─── Official Races ──────────────────────────────────────────

#[derive(Deserialize)]
struct OfficialRacesQuery {
    /// Pagination: page number (1-indexed)
    #[serde(default = "default_page")]
    page: u32,
    /// Pagination: items per page
    #[serde(default = "default_page_size", rename = "pageSize")]
    page_size: u32,
}

fn default_page() -> u32 {
    PageRequest::DEFAULT_PAGE
}
fn default_page_size() -> u32 {
    PageRequest::DEFAULT_PAGE_SIZE
}

impl OfficialRacesQuery {
    fn page_request(&self) -> Result<PageRequest> {
        if self.page < 1 {
            return Err(AppError::BadRequest(
                "Page must be greater than 0".to_string(),
            ));
        }
        if self.page_size < 1 {
            return Err(AppError::BadRequest(
                "pageSize must be greater than 0".to_string(),
            ));
        }

        Ok(PageRequest {
            page: self.page,
            page_size: self.page_size.min(MAX_PAGE_SIZE),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficialRacesResponse {
    pub races: Vec<RaceEntry>,
    pub total_count: usize,
    pub page: u32,
    pub page_size: u32,
    /// Upstream session cookie for the client to send on its next request.
    pub cookie: String,
}

/// Get one page of official races.
async fn get_official_races(
    State(state): State<Arc<AppState>>,
    Extension(supplied): Extension<SuppliedCredential>,
    Query(params): Query<OfficialRacesQuery>,
) -> Result<(HeaderMap, Json<OfficialRacesResponse>)> {
    let request = params.page_request()?;

    tracing::debug!(
        page = request.page,
        page_size = request.page_size,
        client_credential = supplied.0.is_some(),
        "Fetching official races"
    );

    let response = state
        .gateway
        .official_races(request, supplied.0)
        .await?;

    if state.db.is_connected() && !response.races.is_empty() {
        archive_in_background(&state, &response.races);
    }

    let mut headers = HeaderMap::new();
    if let Some(value) = session_header_value(&response.credential) {
        headers.insert(SESSION_HEADER, value);
    }

    Ok((
        headers,
        Json(OfficialRacesResponse {
            races: response.races,
            total_count: response.total_count,
            page: request.page,
            page_size: request.page_size,
            cookie: response.credential.value().to_string(),
        }),
    ))
}

/// Persist relayed races without delaying the response.
fn archive_in_background(state: &Arc<AppState>, races: &[RaceEntry]) {
    let now = chrono::Utc::now();
    let records: Vec<ArchivedRace> = races
        .iter()
        .map(|race| ArchivedRace::from_entry(race, now))
        .collect();

    let db = state.db.clone();
    tokio::spawn(async move {
        if let Err(e) = db.upsert_races(&records).await {
            tracing::warn!(error = %e, count = records.len(), "Failed to archive races");
        }
    });
}

// ─── Archived Races ──────────────────────────────────────────

#[derive(Deserialize)]
struct ArchivedRacesQuery {
    /// Only races starting at or after this time (RFC3339)
    from: Option<String>,
    #[serde(default = "default_archive_limit")]
    limit: u32,
}

fn default_archive_limit() -> u32 {
    100
}

#[derive(Serialize)]
pub struct ArchivedRacesResponse {
    pub races: Vec<ArchivedRace>,
}

/// List races previously relayed and archived, ordered by start time.
async fn get_archived_races(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ArchivedRacesQuery>,
) -> Result<Json<ArchivedRacesResponse>> {
    let from = params
        .from
        .as_deref()
        .map(|raw| {
            normalize_rfc3339(raw).ok_or_else(|| {
                AppError::BadRequest(
                    "Invalid 'from' parameter: must be RFC3339 datetime".to_string(),
                )
            })
        })
        .transpose()?;

    let limit = params.limit.clamp(1, MAX_ARCHIVE_LIMIT);
    let races = state.db.list_races(from.as_deref(), limit).await?;

    Ok(Json(ArchivedRacesResponse { races }))
}
