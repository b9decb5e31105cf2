//! In-memory verdict cache with lazy expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use sbguard_core::types::ThreatMatch;

use crate::clock::{Clock, SystemClock};

/// Cache entry with an absolute expiry.
#[derive(Clone)]
struct CacheEntry {
    verdict: ThreatMatch,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_valid(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Cache of Safe Browsing verdicts keyed by exact URL.
///
/// Keys are case-sensitive and not normalized. An entry is served while
/// `now < expires_at`; an expired entry is removed the next time it is read.
///
/// All operations take a single lock for their duration, so lazy eviction
/// (a read that deletes) is safe under concurrent callers.
pub struct VerdictCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl VerdictCache {
    /// Creates an empty cache on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty cache on a custom clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Gets the verdict for a URL.
    ///
    /// Returns None if not cached or expired; an expired entry is dropped.
    pub fn get(&self, url: &str) -> Option<ThreatMatch> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        lookup(&mut entries, url, now)
    }

    /// Gets the verdicts for several URLs.
    ///
    /// Misses are skipped, so the result may be shorter than the input.
    /// Hits come back in input order.
    pub fn get_many<I, S>(&self, urls: I) -> Vec<ThreatMatch>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        urls.into_iter()
            .filter_map(|url| lookup(&mut entries, url.as_ref(), now))
            .collect()
    }

    /// Caches a verdict for `ttl_seconds`.
    ///
    /// A non-positive TTL stores nothing. An existing entry is overwritten.
    pub fn store(&self, url: &str, verdict: ThreatMatch, ttl_seconds: i64) {
        if ttl_seconds <= 0 {
            return;
        }

        let now = self.clock.now();
        let Some(expires_at) = now.checked_add(Duration::from_secs(ttl_seconds.unsigned_abs()))
        else {
            debug!(url, ttl_seconds, "TTL out of range, not caching");
            return;
        };

        self.entries.lock().insert(
            url.to_string(),
            CacheEntry {
                verdict,
                expires_at,
            },
        );
    }

    /// Clears all cached entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Returns the number of stored entries, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.entries.lock();
        let valid = entries.values().filter(|e| e.is_valid(now)).count();

        CacheStats {
            total_entries: entries.len(),
            expired_entries: entries.len() - valid,
            valid_entries: valid,
        }
    }
}

impl Default for VerdictCache {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup(entries: &mut HashMap<String, CacheEntry>, url: &str, now: Instant) -> Option<ThreatMatch> {
    match entries.get(url) {
        Some(entry) if entry.is_valid(now) => Some(entry.verdict.clone()),
        Some(_) => {
            entries.remove(url);
            debug!(url, "Evicted expired verdict");
            None
        }
        None => None,
    }
}

/// Cache statistics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Total entries (including expired)
    pub total_entries: usize,
    /// Expired entries awaiting lazy eviction
    pub expired_entries: usize,
    /// Valid (non-expired) entries
    pub valid_entries: usize,
}
