//! In-memory response cache with a fixed TTL
//!
//! Stores serializable data as JSON values alongside the time they were
//! stored. A read only returns data while `now - stored_at < ttl`; expired
//! entries are treated as absent but stay in memory until overwritten or
//! explicitly swept.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::debug;

use super::clock::{Clock, SystemClock};

/// Default time-to-live for cached responses in seconds
pub const DEFAULT_TTL_SECS: u64 = 300;

/// A stored value and when it was stored
#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    stored_at: DateTime<Utc>,
}

/// Entry counts for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub active_entries: usize,
    pub expired_entries: usize,
}

/// Thread-safe response cache keyed by call type
///
/// Uses DashMap for concurrent access without external locking. Concurrent
/// writers to the same key race; the last write wins.
#[derive(Debug)]
pub struct ResponseCache<C: Clock = SystemClock> {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    clock: C,
}

impl ResponseCache<SystemClock> {
    /// Creates a cache with the given TTL using wall-clock time
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }

    /// Creates a cache with a 5-minute TTL
    pub fn with_default_ttl() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TTL_SECS))
    }
}

impl Default for ResponseCache<SystemClock> {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}

impl<C: Clock> ResponseCache<C> {
    /// Creates a cache with the given TTL and time source
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// Returns the configured TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        // A clock that moved backwards yields a negative age; count it as fresh.
        match (now - entry.stored_at).to_std() {
            Ok(age) => age < self.ttl,
            Err(_) => true,
        }
    }

    /// Reads a value if present and not expired
    ///
    /// Returns `None` when the key is missing, expired, or holds data of a
    /// different shape than `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = self.entries.get(key)?;
        if !self.is_fresh(&entry, self.clock.now()) {
            debug!(key, "Cache entry expired");
            return None;
        }
        serde_json::from_value(entry.value.clone()).ok()
    }

    /// Stores a value under `key` with the current time, replacing any prior entry
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: self.clock.now(),
            },
        );
        Ok(())
    }

    /// Removes a single entry
    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Removes every entry
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drops expired entries and returns how many were removed
    ///
    /// Never called automatically.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| self.is_fresh(entry, now));
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, including expired ones
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counts fresh and expired entries
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let mut total = 0;
        let mut expired = 0;

        for entry in self.entries.iter() {
            total += 1;
            if !self.is_fresh(entry.value(), now) {
                expired += 1;
            }
        }

        CacheStats {
            total_entries: total,
            active_entries: total - expired,
            expired_entries: expired,
        }
    }
}
