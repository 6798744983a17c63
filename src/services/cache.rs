// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Time-bounded race page cache.

use crate::models::{PageRequest, RaceEntry};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Cache key: the paging parameters of the request.
pub type CacheKey = PageRequest;

/// One cached page. Immutable once stored; `put` replaces the whole `Arc`.
#[derive(Debug)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub races: Vec<RaceEntry>,
    pub total_count: usize,
    pub fetched_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// Race page cache shared across requests.
#[derive(Clone)]
pub struct RaceCache {
    entries: Arc<DashMap<CacheKey, Arc<CacheEntry>>>,
    ttl: Duration,
}

impl RaceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Live entry for `key`, or `None` if missing or past the TTL.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        let entry = self.entries.get(key)?;
        if entry.is_live(Instant::now(), self.ttl) {
            Some(Arc::clone(entry.value()))
        } else {
            None
        }
    }

    /// Store a page stamped with the current time, replacing any previous one.
    pub fn put(&self, key: CacheKey, races: Vec<RaceEntry>, total_count: usize) -> Arc<CacheEntry> {
        let entry = Arc::new(CacheEntry {
            key,
            races,
            total_count,
            fetched_at: Instant::now(),
        });
        self.entries.insert(key, Arc::clone(&entry));
        entry
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now, self.ttl));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Spawn the periodic expiry sweep.
pub fn spawn_purge_task(cache: RaceCache, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // First tick completes immediately; nothing to purge yet.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = cache.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, remaining = cache.len(), "Purged expired race pages");
            }
        }
    })
}
