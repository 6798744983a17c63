// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request gateway: the one place that retries across components.

use crate::error::AppError;
use crate::models::{Credential, PageRequest, RaceEntry};
use crate::services::auth::AuthManager;
use crate::services::race_fetcher::RaceFetcher;
use std::sync::Arc;

/// Races for one page plus the credential to hand back to the client.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub races: Vec<RaceEntry>,
    pub total_count: usize,
    pub credential: Credential,
}

/// Ties the auth lifecycle to race fetching for inbound requests.
#[derive(Clone)]
pub struct RequestGateway {
    auth: Arc<AuthManager>,
    fetcher: RaceFetcher,
}

impl RequestGateway {
    pub fn new(auth: Arc<AuthManager>, fetcher: RaceFetcher) -> Self {
        Self { auth, fetcher }
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    pub fn fetcher(&self) -> &RaceFetcher {
        &self.fetcher
    }

    /// Explicit login (the `POST /api/login` route).
    pub async fn login(&self) -> Result<Credential, AppError> {
        self.auth.login().await
    }

    /// Serve one page of official races.
    ///
    /// A rejection mid-fetch triggers one renewal and one retried fetch; a
    /// second rejection is an `AuthFailure`.
    pub async fn official_races(
        &self,
        request: PageRequest,
        supplied: Option<Credential>,
    ) -> Result<GatewayResponse, AppError> {
        let lease = self.auth.ensure_lease(supplied).await?;

        let (page, credential) = match self.fetcher.fetch(request, &lease.credential).await {
            Ok(page) => (page, lease.credential),
            Err(AppError::CredentialRejected) => {
                tracing::info!(
                    page = request.page,
                    "Credential rejected mid-fetch, renewing once"
                );
                self.auth.discard(&lease.credential).await;
                let renewed = self.auth.renew(lease.generation).await?.credential;

                match self.fetcher.fetch(request, &renewed).await {
                    Ok(page) => (page, renewed),
                    Err(AppError::CredentialRejected) => {
                        self.auth.discard(&renewed).await;
                        return Err(AppError::AuthFailure(
                            "upstream rejected the renewed credential".to_string(),
                        ));
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        };

        Ok(GatewayResponse {
            races: page.races,
            total_count: page.total_count,
            credential,
        })
    }
}
