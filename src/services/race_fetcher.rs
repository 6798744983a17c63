// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Paged, cached race guide queries.

use crate::error::AppError;
use crate::models::{Credential, PageRequest, RacePage};
use crate::services::cache::RaceCache;
use crate::services::upstream::UpstreamApi;
use std::sync::Arc;

/// Fetches official race pages, consulting the cache before upstream.
///
/// Never re-authenticates: a rejected cookie surfaces as
/// `AppError::CredentialRejected` for the caller to handle.
#[derive(Clone)]
pub struct RaceFetcher {
    upstream: Arc<dyn UpstreamApi>,
    cache: RaceCache,
}

impl RaceFetcher {
    pub fn new(upstream: Arc<dyn UpstreamApi>, cache: RaceCache) -> Self {
        Self { upstream, cache }
    }

    pub fn cache(&self) -> &RaceCache {
        &self.cache
    }

    pub async fn fetch(
        &self,
        request: PageRequest,
        credential: &Credential,
    ) -> Result<RacePage, AppError> {
        if let Some(entry) = self.cache.get(&request) {
            tracing::debug!(
                page = request.page,
                page_size = request.page_size,
                "Race page cache hit"
            );
            return Ok(RacePage {
                races: entry.races.clone(),
                total_count: entry.total_count,
            });
        }

        let sessions = self
            .upstream
            .race_guide(credential.value(), request)
            .await?;
        let fetched = sessions.len();

        let page = RacePage::from_upstream(sessions, request);
        self.cache
            .put(request, page.races.clone(), page.total_count);

        tracing::info!(
            page = request.page,
            page_size = request.page_size,
            fetched,
            official = page.total_count,
            returned = page.races.len(),
            "Race page fetched from upstream"
        );

        Ok(page)
    }
}
