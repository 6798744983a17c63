// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod archive;
pub mod credential;
pub mod race;

pub use archive::ArchivedRace;
pub use credential::Credential;
pub use race::{PageRequest, RaceEntry, RaceGuidePayload, RacePage, UpstreamRace};
