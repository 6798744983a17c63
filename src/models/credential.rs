// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Upstream session credential.

use chrono::{DateTime, Utc};
use std::fmt;

/// Opaque session cookie issued by the upstream identity endpoint.
///
/// Never mutated after issue: verification produces a new value via
/// [`Credential::verified_at`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    value: String,
    issued_at: DateTime<Utc>,
    last_verified_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Issue a freshly obtained credential.
    pub fn issue(value: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            issued_at,
            last_verified_at: None,
        }
    }

    /// Wrap a cookie handed back by a client. Its issue time is unknown, so
    /// the time it was presented stands in.
    pub fn from_client(value: impl Into<String>) -> Self {
        Self::issue(value, Utc::now())
    }

    /// The cookie string sent upstream in the `Cookie` header.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn last_verified_at(&self) -> Option<DateTime<Utc>> {
        self.last_verified_at
    }

    /// Copy of this credential marked as verified at `at`.
    pub fn verified_at(&self, at: DateTime<Utc>) -> Self {
        Self {
            value: self.value.clone(),
            issued_at: self.issued_at,
            last_verified_at: Some(at),
        }
    }

    /// True when both carry the same cookie, regardless of bookkeeping.
    pub fn same_token(&self, other: &Credential) -> bool {
        self.value == other.value
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("value", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("last_verified_at", &self.last_verified_at)
            .finish()
    }
}
