//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    /// Relayed official races (keyed by series name, track, start time)
    pub const OFFICIAL_RACES: &str = "official_races";
}
