//! Search tuning constants and the runtime cache configuration.
//!
//! Weights, vocabularies and the stop-set are compile-time constants living
//! next to the code that uses them. Only the result cache is configurable at
//! runtime.

use crate::lenient;
use serde::{Deserialize, Serialize};

/// Upper bound on ids returned by an index lookup.
pub const MAX_CANDIDATES: usize = 100;

/// Results returned per search after ranking.
pub const MAX_RESULTS: usize = 50;

pub const DEFAULT_CACHE_CAPACITY: usize = 200;
pub const DEFAULT_CACHE_TTL_MS: u64 = 30_000;

/// Partial cache settings. Unset, non-numeric or non-positive values leave the
/// current setting in place; each field is judged on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfig {
    #[serde(deserialize_with = "lenient::whole_number")]
    pub max_entries: Option<i64>,
    #[serde(deserialize_with = "lenient::whole_number")]
    pub ttl_ms: Option<i64>,
}

impl CacheConfig {
    pub fn new(max_entries: i64, ttl_ms: i64) -> Self {
        Self { max_entries: Some(max_entries), ttl_ms: Some(ttl_ms) }
    }

    pub(crate) fn capacity(&self) -> Option<usize> {
        self.max_entries.filter(|&n| n > 0).and_then(|n| usize::try_from(n).ok())
    }

    pub(crate) fn ttl_ms(&self) -> Option<u64> {
        self.ttl_ms.filter(|&n| n > 0).and_then(|n| u64::try_from(n).ok())
    }
}
