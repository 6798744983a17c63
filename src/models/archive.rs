//! Persisted race record for the optional archive.

use crate::models::RaceEntry;
use crate::time_utils::format_utc_rfc3339;
use serde::{Deserialize, Serialize};

/// Race stored in Firestore, keyed by its natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedRace {
    pub series_id: u64,
    pub series_name: String,
    pub track_name: String,
    /// Start time (RFC3339, `Z` suffix so lexical order is chronological)
    pub start_time: String,
    /// When this record was last written
    pub archived_at: String,
}

impl ArchivedRace {
    pub fn from_entry(race: &RaceEntry, archived_at: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            series_id: race.series_id,
            series_name: race.series_name.clone(),
            track_name: race.track_name.clone(),
            start_time: format_utc_rfc3339(race.start_time),
            archived_at: format_utc_rfc3339(archived_at),
        }
    }

    /// Document ID built from series name, track, and start time.
    pub fn natural_key(&self) -> String {
        format!(
            "{}_{}_{}",
            urlencoding::encode(&self.series_name),
            urlencoding::encode(&self.track_name),
            urlencoding::encode(&self.start_time)
        )
    }
}
