//! Rate table caching with TTL support.

use convrelay_common::{constants, is_fresh, CurrencyCode};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::rates::RateTable;

/// Cached table with the instant it was fetched.
#[derive(Debug, Clone)]
struct CacheEntry {
    table: Arc<RateTable>,
    fetched_at: Instant,
}

/// Configuration for rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// How long a table stays fresh after it was fetched.
    pub ttl: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            ttl: constants::rate_cache_ttl(),
        }
    }
}

/// Thread-safe rate table cache keyed by base currency.
///
/// Stale entries are never removed by `get`; they are skipped and later
/// overwritten by `put`. There is no eviction, one entry per base ever
/// requested.
#[derive(Debug)]
pub struct RateCache {
    entries: DashMap<CurrencyCode, CacheEntry>,
    config: RateCacheConfig,
}

impl RateCache {
    /// Create a new rate cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(RateCacheConfig::default())
    }

    /// Create a new rate cache with custom configuration.
    pub fn with_config(config: RateCacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    /// Get the table for `base` if it was fetched less than one TTL before `now`.
    pub fn get(&self, base: &CurrencyCode, now: Instant) -> Option<Arc<RateTable>> {
        match self.entries.get(base) {
            Some(entry) if is_fresh(entry.fetched_at, now, self.config.ttl) => {
                debug!(base = %base, "Cache hit");
                Some(entry.table.clone())
            }
            Some(_) => {
                debug!(base = %base, "Cache entry stale");
                None
            }
            None => {
                debug!(base = %base, "Cache miss");
                None
            }
        }
    }

    /// Store a freshly fetched table, replacing any previous entry.
    pub fn put(&self, base: &CurrencyCode, table: RateTable, now: Instant) -> Arc<RateTable> {
        let table = Arc::new(table);
        self.entries.insert(
            base.clone(),
            CacheEntry {
                table: table.clone(),
                fetched_at: now,
            },
        );
        table
    }

    /// Age of the entry for `base`, fresh or not.
    pub fn age(&self, base: &CurrencyCode, now: Instant) -> Option<Duration> {
        self.entries
            .get(base)
            .map(|entry| now.saturating_duration_since(entry.fetched_at))
    }

    /// Remove the entry for a base.
    pub fn remove(&self, base: &CurrencyCode) {
        self.entries.remove(base);
    }

    /// Clear all cached tables.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Get the number of entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Get cache statistics as of `now`.
    pub fn stats(&self, now: Instant) -> CacheStats {
        let total = self.entries.len();
        let fresh = self
            .entries
            .iter()
            .filter(|e| is_fresh(e.fetched_at, now, self.config.ttl))
            .count();

        CacheStats {
            total_entries: total,
            fresh_entries: fresh,
            stale_entries: total - fresh,
        }
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub stale_entries: usize,
}

/// Shared rate cache.
pub type SharedRateCache = Arc<RateCache>;
