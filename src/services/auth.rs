// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Upstream session lifecycle: login, verify, renew.
//!
//! Handles:
//! - Login with a global cooldown between attempts
//! - Single-flight renewal so concurrent callers share one login
//! - Probe-based verification of stored or client-supplied cookies
//! - Fail-fast after one re-login (no retry loops)

use crate::error::AppError;
use crate::models::Credential;
use crate::services::credential_store::CredentialStore;
use crate::services::upstream::UpstreamApi;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// A usable credential and the store generation current when it was handed out.
#[derive(Debug, Clone)]
pub struct CredentialLease {
    pub credential: Credential,
    pub generation: u64,
}

/// Owns the login/verify/renew protocol against the upstream identity endpoint.
pub struct AuthManager {
    upstream: Arc<dyn UpstreamApi>,
    store: Arc<CredentialStore>,
    /// Serializes logins process-wide; holders may sleep out the cooldown.
    login_gate: Mutex<()>,
    cooldown: Duration,
}

impl AuthManager {
    pub fn new(
        upstream: Arc<dyn UpstreamApi>,
        store: Arc<CredentialStore>,
        cooldown: Duration,
    ) -> Self {
        Self {
            upstream,
            store,
            login_gate: Mutex::new(()),
            cooldown,
        }
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Log in unconditionally, waiting out the cooldown if needed.
    pub async fn login(&self) -> Result<Credential, AppError> {
        let _guard = self.login_gate.lock().await;
        self.login_locked().await.map(|lease| lease.credential)
    }

    /// Single-flight re-login after a rejection.
    ///
    /// `seen_generation` is the store generation the caller observed when it
    /// obtained the rejected credential. If the store has been replaced since
    /// then, that newer credential is returned; otherwise this logs in.
    pub async fn renew(&self, seen_generation: u64) -> Result<CredentialLease, AppError> {
        let _guard = self.login_gate.lock().await;

        // Re-check after acquiring the gate: another task may have logged in
        // while we were waiting.
        if let (Some(current), generation) = self.store.snapshot().await {
            if generation > seen_generation {
                tracing::debug!(generation, "Credential already renewed by a concurrent caller");
                return Ok(CredentialLease {
                    credential: current,
                    generation,
                });
            }
        }

        self.login_locked().await
    }

    /// Return a credential that upstream currently accepts.
    ///
    /// Probes `candidate` (or the stored credential). On rejection performs
    /// exactly one renewal; every other failure is an `AuthFailure`.
    pub async fn ensure(&self, candidate: Option<Credential>) -> Result<Credential, AppError> {
        self.ensure_lease(candidate)
            .await
            .map(|lease| lease.credential)
    }

    /// Like [`ensure`](Self::ensure), also reporting the store generation
    /// to hand to [`renew`](Self::renew) if the credential is later rejected.
    pub async fn ensure_lease(
        &self,
        candidate: Option<Credential>,
    ) -> Result<CredentialLease, AppError> {
        let (stored, generation) = self.store.snapshot().await;
        let candidate = match candidate.or(stored) {
            Some(candidate) => candidate,
            None => {
                tracing::debug!("No stored credential, logging in");
                return self.renew(generation).await;
            }
        };

        match self.upstream.probe(candidate.value()).await {
            Ok(()) => {
                let verified = candidate.verified_at(Utc::now());
                self.store.mark_verified(&verified).await;
                Ok(CredentialLease {
                    credential: verified,
                    generation,
                })
            }
            Err(AppError::CredentialRejected) => {
                tracing::info!(
                    issued_at = %candidate.issued_at(),
                    "Credential rejected by upstream probe, renewing"
                );
                self.store.clear_if(&candidate).await;
                self.renew(generation).await
            }
            Err(e) => {
                tracing::warn!(error = %e, "Credential probe failed");
                Err(AppError::AuthFailure(format!("credential probe failed: {}", e)))
            }
        }
    }

    /// Drop `credential` from the store after a terminal rejection.
    pub async fn discard(&self, credential: &Credential) {
        if self.store.clear_if(credential).await {
            tracing::info!("Discarded rejected credential");
        }
    }

    /// Perform the login. Caller must hold `login_gate`.
    async fn login_locked(&self) -> Result<CredentialLease, AppError> {
        if let Some(last_attempt) = self.store.last_login_attempt_at().await {
            let ready_at = last_attempt + self.cooldown;
            let now = Instant::now();
            if now < ready_at {
                tracing::info!(wait = ?(ready_at - now), "Login cooldown active, waiting");
                tokio::time::sleep_until(ready_at).await;
            }
        }

        // Failed attempts count against the cooldown too.
        self.store.record_login_attempt(Instant::now()).await;

        let value = self.upstream.authenticate().await.map_err(|e| {
            tracing::error!(error = %e, "Upstream login failed");
            match e {
                AppError::AuthFailure(msg) => AppError::AuthFailure(msg),
                other => AppError::AuthFailure(format!("login failed: {}", other)),
            }
        })?;

        if value.trim().is_empty() {
            return Err(AppError::AuthFailure(
                "login returned no usable credential".to_string(),
            ));
        }

        let credential = Credential::issue(value, Utc::now());
        let generation = self.store.replace(credential.clone()).await;

        tracing::info!(generation, "New upstream credential issued and stored");
        Ok(CredentialLease {
            credential,
            generation,
        })
    }
}
