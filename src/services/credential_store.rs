// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-wide holder of the current upstream session credential.

use crate::models::Credential;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Default)]
struct StoreState {
    current: Option<Credential>,
    /// Bumped on every `replace`; never reset.
    generation: u64,
    last_login_attempt_at: Option<Instant>,
}

/// Current credential plus login bookkeeping.
///
/// Shared by `Arc`; [`AuthManager`](crate::services::AuthManager) is the only
/// writer.
#[derive(Default)]
pub struct CredentialStore {
    state: RwLock<StoreState>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<Credential> {
        self.state.read().await.current.clone()
    }

    /// Current credential together with the generation it was installed at.
    ///
    /// Callers keep the generation to tell later replacements apart from
    /// credentials that were already stored when they looked.
    pub async fn snapshot(&self) -> (Option<Credential>, u64) {
        let state = self.state.read().await;
        (state.current.clone(), state.generation)
    }

    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    pub async fn last_login_attempt_at(&self) -> Option<Instant> {
        self.state.read().await.last_login_attempt_at
    }

    pub(crate) async fn record_login_attempt(&self, at: Instant) {
        self.state.write().await.last_login_attempt_at = Some(at);
    }

    /// Install a newly issued credential, dropping any previous one.
    ///
    /// Returns the new generation.
    pub(crate) async fn replace(&self, credential: Credential) -> u64 {
        let mut state = self.state.write().await;
        state.current = Some(credential);
        state.generation += 1;
        state.generation
    }

    /// Swap in the verified copy if the store still holds that token.
    pub(crate) async fn mark_verified(&self, verified: &Credential) {
        let mut state = self.state.write().await;
        if state
            .current
            .as_ref()
            .is_some_and(|current| current.same_token(verified))
        {
            state.current = Some(verified.clone());
        }
    }

    /// Forget the stored credential if it is the one upstream rejected.
    ///
    /// Returns whether anything was cleared.
    pub(crate) async fn clear_if(&self, rejected: &Credential) -> bool {
        let mut state = self.state.write().await;
        if state
            .current
            .as_ref()
            .is_some_and(|current| current.same_token(rejected))
        {
            state.current = None;
            true
        } else {
            false
        }
    }
}
