// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Race listing models: upstream payload, normalized entries, and pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One session as the upstream race guide reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamRace {
    pub series_id: u64,
    #[serde(default)]
    pub series_name: String,
    #[serde(default)]
    pub track_name: String,
    pub start_time: DateTime<Utc>,
    /// Official sessions count towards license and rating; only these are relayed.
    #[serde(default)]
    pub official: bool,
    /// Everything else, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Race guide payload behind the indirection link.
#[derive(Debug, Clone, Deserialize)]
pub struct RaceGuidePayload {
    #[serde(alias = "races")]
    pub sessions: Vec<UpstreamRace>,
}

/// A normalized, relayable race.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceEntry {
    pub series_id: u64,
    pub series_name: String,
    pub track_name: String,
    pub start_time: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<UpstreamRace> for RaceEntry {
    fn from(race: UpstreamRace) -> Self {
        Self {
            series_id: race.series_id,
            series_name: race.series_name,
            track_name: race.track_name,
            start_time: race.start_time,
            extra: race.extra,
        }
    }
}

/// Validated paging parameters (1-indexed page).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_PAGE_SIZE: u32 = 10;

    /// Offset of the first entry on this page, `None` on overflow.
    pub fn offset(&self) -> Option<usize> {
        (self.page as usize)
            .checked_sub(1)?
            .checked_mul(self.page_size as usize)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of official races plus the size of the whole filtered set.
#[derive(Debug, Clone, PartialEq)]
pub struct RacePage {
    pub races: Vec<RaceEntry>,
    pub total_count: usize,
}

impl RacePage {
    /// Keep official sessions and cut out the requested page.
    pub fn from_upstream(sessions: Vec<UpstreamRace>, request: PageRequest) -> Self {
        let official: Vec<RaceEntry> = sessions
            .into_iter()
            .filter(|race| race.official)
            .map(RaceEntry::from)
            .collect();
        let total_count = official.len();

        let races = match request.offset() {
            Some(start) if start < total_count => {
                let end = start
                    .saturating_add(request.page_size as usize)
                    .min(total_count);
                official[start..end].to_vec()
            }
            _ => vec![],
        };

        Self { races, total_count }
    }
}
