// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use race_guide_relay::config::Config;
use race_guide_relay::db::FirestoreDb;
use race_guide_relay::error::AppError;
use race_guide_relay::models::{PageRequest, UpstreamRace};
use race_guide_relay::routes::create_router;
use race_guide_relay::services::{
    AuthManager, CredentialStore, RaceCache, RaceFetcher, RequestGateway, UpstreamApi,
};
use race_guide_relay::AppState;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Build `total` sessions with `official` of them marked official, spread
/// evenly. Series IDs are the index, so order is observable.
#[allow(dead_code)]
pub fn sessions(total: usize, official: usize) -> Vec<UpstreamRace> {
    (0..total)
        .map(|i| {
            let is_official = (i * official) / total != ((i + 1) * official) / total;
            serde_json::from_value(serde_json::json!({
                "series_id": i,
                "series_name": format!("Series {i:02}"),
                "track_name": "Watkins Glen",
                "start_time": format!("2026-10-19T{:02}:{:02}:00Z", i / 60, i % 60),
                "official": is_official,
                "session_id": 9000 + i,
            }))
            .expect("valid session json")
        })
        .collect()
}

/// Series IDs of the official sessions in `sessions`, in order.
#[allow(dead_code)]
pub fn official_ids(sessions: &[UpstreamRace]) -> Vec<u64> {
    sessions
        .iter()
        .filter(|s| s.official)
        .map(|s| s.series_id)
        .collect()
}

/// Scripted stand-in for the upstream platform.
///
/// Logins issue `session=N` cookies which stay valid until revoked.
#[derive(Default)]
pub struct FakeUpstream {
    pub logins: AtomicUsize,
    pub probes: AtomicUsize,
    pub guide_calls: AtomicUsize,
    login_delay: Duration,
    sessions: Mutex<Vec<UpstreamRace>>,
    valid: Mutex<HashSet<String>>,
    /// Upcoming race guide calls to answer with 401 regardless of cookie.
    reject_guides: AtomicUsize,
    fail_logins: AtomicBool,
    probe_outage: AtomicBool,
    guide_outage: AtomicBool,
}

#[allow(dead_code)]
impl FakeUpstream {
    pub fn new(sessions: Vec<UpstreamRace>) -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(sessions),
            ..Default::default()
        })
    }

    /// Logins take `delay` to complete, widening race windows.
    pub fn with_login_delay(sessions: Vec<UpstreamRace>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(sessions),
            login_delay: delay,
            ..Default::default()
        })
    }

    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn guide_calls(&self) -> usize {
        self.guide_calls.load(Ordering::SeqCst)
    }

    /// Accept `cookie` as if upstream had issued it.
    pub fn accept(&self, cookie: &str) {
        self.valid.lock().unwrap().insert(cookie.to_string());
    }

    pub fn revoke(&self, cookie: &str) {
        self.valid.lock().unwrap().remove(cookie);
    }

    pub fn reject_next_guides(&self, n: usize) {
        self.reject_guides.store(n, Ordering::SeqCst);
    }

    pub fn set_fail_logins(&self, fail: bool) {
        self.fail_logins.store(fail, Ordering::SeqCst);
    }

    pub fn set_probe_outage(&self, down: bool) {
        self.probe_outage.store(down, Ordering::SeqCst);
    }

    pub fn set_guide_outage(&self, down: bool) {
        self.guide_outage.store(down, Ordering::SeqCst);
    }

    fn is_valid(&self, cookie: &str) -> bool {
        self.valid.lock().unwrap().contains(cookie)
    }
}

#[async_trait]
impl UpstreamApi for FakeUpstream {
    async fn authenticate(&self) -> Result<String, AppError> {
        let n = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.login_delay.is_zero() {
            tokio::time::sleep(self.login_delay).await;
        }
        if self.fail_logins.load(Ordering::SeqCst) {
            return Err(AppError::UpstreamUnavailable("HTTP 503".to_string()));
        }

        let cookie = format!("session={n}");
        self.accept(&cookie);
        Ok(cookie)
    }

    async fn probe(&self, cookie: &str) -> Result<(), AppError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.probe_outage.load(Ordering::SeqCst) {
            return Err(AppError::UpstreamUnavailable("connection refused".to_string()));
        }
        if self.is_valid(cookie) {
            Ok(())
        } else {
            Err(AppError::CredentialRejected)
        }
    }

    async fn race_guide(
        &self,
        cookie: &str,
        _request: PageRequest,
    ) -> Result<Vec<UpstreamRace>, AppError> {
        self.guide_calls.fetch_add(1, Ordering::SeqCst);
        if self.guide_outage.load(Ordering::SeqCst) {
            return Err(AppError::UpstreamUnavailable("HTTP 502".to_string()));
        }

        let forced_reject = self
            .reject_guides
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if forced_reject || !self.is_valid(cookie) {
            return Err(AppError::CredentialRejected);
        }

        Ok(self.sessions.lock().unwrap().clone())
    }
}

/// Wired-up services around a fake upstream.
#[allow(dead_code)]
pub struct Harness {
    pub upstream: Arc<FakeUpstream>,
    pub store: Arc<CredentialStore>,
    pub auth: Arc<AuthManager>,
    pub cache: RaceCache,
    pub fetcher: RaceFetcher,
    pub gateway: RequestGateway,
}

#[allow(dead_code)]
pub fn harness(upstream: Arc<FakeUpstream>) -> Harness {
    let config = Config::test_default();
    let store = Arc::new(CredentialStore::new());
    let api: Arc<dyn UpstreamApi> = upstream.clone();
    let auth = Arc::new(AuthManager::new(
        api.clone(),
        store.clone(),
        config.login_cooldown,
    ));
    let cache = RaceCache::new(config.cache_ttl);
    let fetcher = RaceFetcher::new(api, cache.clone());
    let gateway = RequestGateway::new(auth.clone(), fetcher.clone());

    Harness {
        upstream,
        store,
        auth,
        cache,
        fetcher,
        gateway,
    }
}

/// Create a test app with an offline archive and the given fake upstream.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(upstream: Arc<FakeUpstream>) -> (axum::Router, Arc<AppState>) {
    let h = harness(upstream);

    let state = Arc::new(AppState {
        config: Config::test_default(),
        db: FirestoreDb::new_mock(),
        gateway: h.gateway,
    });

    (create_router(state.clone()), state)
}
