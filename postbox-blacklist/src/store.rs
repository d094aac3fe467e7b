//! The service-side blacklist store: a Bloom filter in front of an exact
//! entry map.
//!
//! URLs are compared by exact trimmed match. No normalization (scheme case,
//! trailing slash, query order) is performed; that is the behavioral
//! contract of the protocol, not an oversight.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One blacklisted URL with its bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub url: String,
    pub added_by: Option<String>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Verdict pair for a check: whether the filter may contain the URL, and
/// whether the exact store confirms it. Both must hold for the URL to be
/// reported as blacklisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckVerdict {
    pub in_filter: bool,
    pub confirmed: bool,
}

/// Shared state of the blacklist service.
#[derive(Debug)]
pub struct BlacklistStore {
    filter: RwLock<crate::BloomFilter>,
    entries: RwLock<HashMap<String, BlacklistEntry>>,
}

impl BlacklistStore {
    #[must_use]
    pub fn new(filter_bits: usize, filter_hashes: u32) -> Self {
        Self {
            filter: RwLock::new(crate::BloomFilter::new(filter_bits, filter_hashes)),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a URL. Returns `false` if it was already present.
    pub fn add(&self, url: &str, added_by: Option<String>, reason: Option<String>) -> bool {
        let url = url.trim().to_string();

        self.filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(&url);

        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(&url) {
            return false;
        }
        entries.insert(
            url.clone(),
            BlacklistEntry {
                url,
                added_by,
                reason,
                created_at: Utc::now(),
            },
        );
        true
    }

    /// Check a URL against the filter and the exact store.
    #[must_use]
    pub fn check(&self, url: &str) -> CheckVerdict {
        let url = url.trim();

        let in_filter = self
            .filter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .possibly_contains(url);

        // The filter never forgets, so a removed URL still hits it; only the
        // exact store decides.
        let confirmed = in_filter
            && self
                .entries
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains_key(url);

        CheckVerdict {
            in_filter,
            confirmed,
        }
    }

    /// Remove a URL from the exact store. Returns `false` if it was absent.
    pub fn remove(&self, url: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(url.trim())
            .is_some()
    }

    /// Number of confirmed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the exact store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
