// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle tests.
//!
//! These tests verify that:
//! 1. Concurrent callers without a credential share a single login
//! 2. A rejected credential is renewed exactly once
//! 3. Logins respect the global cooldown
//! 4. Failures surface as `AuthFailure` without further retries

use chrono::Utc;
use race_guide_relay::error::AppError;
use race_guide_relay::models::Credential;
use std::time::Duration;
use tokio::time::Instant;

mod common;
use common::{harness, FakeUpstream};

#[tokio::test(start_paused = true)]
async fn test_concurrent_ensure_logs_in_once() {
    let upstream = FakeUpstream::with_login_delay(vec![], Duration::from_millis(250));
    let h = harness(upstream.clone());

    let mut handles = vec![];
    for _ in 0..5 {
        let auth = h.auth.clone();
        handles.push(tokio::spawn(async move { auth.ensure(None).await }));
    }

    let mut cookies = vec![];
    for handle in handles {
        let credential = handle
            .await
            .expect("Task join failed")
            .expect("ensure should succeed");
        cookies.push(credential.value().to_string());
    }

    assert_eq!(upstream.logins(), 1, "exactly one login for all callers");
    assert!(cookies.iter().all(|c| c == "session=1"), "{cookies:?}");
    assert_eq!(
        h.store.current().await.map(|c| c.value().to_string()),
        Some("session=1".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_ensure_verifies_stored_credential() {
    let upstream = FakeUpstream::new(vec![]);
    let h = harness(upstream.clone());

    let first = h.auth.ensure(None).await.unwrap();
    assert!(first.last_verified_at().is_none(), "fresh login is not probed");

    let second = h.auth.ensure(None).await.unwrap();
    assert!(second.same_token(&first));
    assert!(second.last_verified_at().is_some());
    assert_eq!(upstream.logins(), 1);
    assert_eq!(upstream.probes(), 1);

    // The store keeps the verified copy
    let stored = h.store.current().await.unwrap();
    assert!(stored.last_verified_at().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_rejected_probe_relogs_once() {
    let upstream = FakeUpstream::new(vec![]);
    let h = harness(upstream.clone());

    let first = h.auth.ensure(None).await.unwrap();
    upstream.revoke(first.value());

    let renewed = h.auth.ensure(None).await.unwrap();
    assert_eq!(renewed.value(), "session=2");
    assert_eq!(upstream.logins(), 2);

    // Verifying the new credential straight away needs no further login
    let verified = h.auth.ensure(Some(renewed.clone())).await.unwrap();
    assert!(verified.same_token(&renewed));
    assert!(verified.last_verified_at().is_some());
    assert_eq!(upstream.logins(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stale_client_credential_triggers_one_login() {
    let upstream = FakeUpstream::new(vec![]);
    let h = harness(upstream.clone());

    h.auth.ensure(None).await.unwrap();

    let stale = Credential::from_client("session=expired");
    let result = h.auth.ensure(Some(stale)).await.unwrap();

    assert_eq!(result.value(), "session=2");
    assert_eq!(upstream.logins(), 2, "exactly one login for the rejection");
}

#[tokio::test(start_paused = true)]
async fn test_rejected_client_credential_never_falls_back_to_dead_stored_one() {
    let upstream = FakeUpstream::new(vec![]);
    let h = harness(upstream.clone());

    let stored = h.auth.ensure(None).await.unwrap();
    upstream.revoke(stored.value());

    let result = h
        .auth
        .ensure(Some(Credential::from_client("session=bogus")))
        .await
        .unwrap();

    assert_eq!(result.value(), "session=2");
    assert_eq!(upstream.logins(), 2);
    assert_eq!(h.store.current().await, Some(result));
}

#[tokio::test(start_paused = true)]
async fn test_login_waits_for_cooldown() {
    let upstream = FakeUpstream::new(vec![]);
    let h = harness(upstream.clone());

    let started = Instant::now();
    h.auth.login().await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));

    h.auth.login().await.unwrap();
    assert!(
        started.elapsed() >= Duration::from_secs(60),
        "second login must wait out the cooldown"
    );
    assert_eq!(upstream.logins(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_one_login_per_cooldown_window() {
    let upstream = FakeUpstream::new(vec![]);
    let h = harness(upstream.clone());

    h.auth.login().await.unwrap();
    let after_first = Instant::now();

    let mut handles = vec![];
    for _ in 0..3 {
        let auth = h.auth.clone();
        handles.push(tokio::spawn(async move {
            auth.login().await.unwrap();
            Instant::now()
        }));
    }

    let mut finished = vec![];
    for handle in handles {
        finished.push(handle.await.unwrap() - after_first);
    }
    finished.sort();

    assert_eq!(upstream.logins(), 4);
    assert!(finished[0] >= Duration::from_secs(60));
    assert!(finished[1] >= Duration::from_secs(120));
    assert!(finished[2] >= Duration::from_secs(180));
}

#[tokio::test(start_paused = true)]
async fn test_failed_login_is_auth_failure() {
    let upstream = FakeUpstream::new(vec![]);
    upstream.set_fail_logins(true);
    let h = harness(upstream.clone());

    let err = h.auth.ensure(None).await.unwrap_err();
    assert!(matches!(err, AppError::AuthFailure(_)), "{err:?}");
    assert_eq!(upstream.logins(), 1);
    assert!(h.store.current().await.is_none());

    // The failed attempt still counts against the cooldown
    assert!(h.store.last_login_attempt_at().await.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_probe_outage_does_not_login() {
    let upstream = FakeUpstream::new(vec![]);
    let h = harness(upstream.clone());
    h.auth.ensure(None).await.unwrap();

    upstream.set_probe_outage(true);
    let err = h.auth.ensure(None).await.unwrap_err();

    assert!(matches!(err, AppError::AuthFailure(_)), "{err:?}");
    assert_eq!(upstream.logins(), 1);
    assert!(h.store.current().await.is_some(), "outage is not a rejection");
}

#[tokio::test(start_paused = true)]
async fn test_renew_after_concurrent_renewal_returns_replacement() {
    let upstream = FakeUpstream::new(vec![]);
    let h = harness(upstream.clone());

    let first = h.auth.ensure_lease(None).await.unwrap();
    let second = h.auth.renew(first.generation).await.unwrap();
    assert_eq!(second.credential.value(), "session=2");
    assert!(second.generation > first.generation);

    // A late caller still holding the first credential gets the replacement
    let late = h.auth.renew(first.generation).await.unwrap();
    assert!(late.credential.same_token(&second.credential));
    assert_eq!(late.generation, second.generation);
    assert_eq!(upstream.logins(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_renew_ignores_credential_stored_before_rejection() {
    let upstream = FakeUpstream::new(vec![]);
    let h = harness(upstream.clone());

    let lease = h.auth.ensure_lease(None).await.unwrap();

    // Same generation: the stored credential is the one that was rejected
    let renewed = h.auth.renew(lease.generation).await.unwrap();
    assert_eq!(renewed.credential.value(), "session=2");
    assert_eq!(upstream.logins(), 2);
}

#[tokio::test]
async fn test_discard_only_drops_matching_credential() {
    let upstream = FakeUpstream::new(vec![]);
    let h = harness(upstream.clone());
    let stored = h.auth.ensure(None).await.unwrap();

    h.auth
        .discard(&Credential::issue("session=other", Utc::now()))
        .await;
    assert!(h.store.current().await.is_some());

    h.auth.discard(&stored).await;
    assert!(h.store.current().await.is_none());
}
