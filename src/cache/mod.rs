//! In-memory result cache with lazy expiration
//!
//! Entries are keyed by source id and case-folded query and expire after a
//! fixed TTL (3 hours by default). Expired entries are treated as misses on
//! read and overwritten by the next write; nothing sweeps in the background.

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use crate::record::ResultRecord;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Default lifetime of a cached per-source result
pub const DEFAULT_TTL: Duration = Duration::from_secs(3 * 60 * 60);

/// Cached results for one source and query
///
/// An empty `results` is a real entry: the source was tried and yielded
/// nothing, and will not be tried again until the entry expires.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub results: Vec<ResultRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// How long ago the results were stored (zero if the clock went backwards)
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or_default()
    }

    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) >= ttl
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source_id: String,
    query: String,
}

impl CacheKey {
    fn new(source_id: &str, query: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            query: normalize_query(query),
        }
    }
}

/// Case-folds and trims a query for use as a cache key
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Thread-safe per-source result cache
#[derive(Debug)]
pub struct ResultCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached results, or None if absent or expired
    pub fn get(&self, source_id: &str, query: &str) -> Option<Vec<ResultRecord>> {
        let now = self.clock.now();
        let entries = self.lock();

        entries
            .get(&CacheKey::new(source_id, query))
            .filter(|entry| !entry.is_stale(now, self.ttl))
            .map(|entry| entry.results.clone())
    }

    /// Stores results, replacing any previous entry for the key
    pub fn put(&self, source_id: &str, query: &str, results: Vec<ResultRecord>) {
        let entry = CacheEntry {
            results,
            fetched_at: self.clock.now(),
        };
        self.lock().insert(CacheKey::new(source_id, query), entry);
    }

    /// Drops expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_stale(now, self.ttl));
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet overwritten
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn record(name: &str) -> ResultRecord {
        ResultRecord::new("apollo", name, "10".to_string(), None)
    }

    fn cache_with_clock() -> (ResultCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = ResultCache::with_clock(DEFAULT_TTL, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_miss_then_hit() {
        let (cache, _) = cache_with_clock();
        assert_eq!(cache.get("apollo", "dolo"), None);

        cache.put("apollo", "dolo", vec![record("Dolo 650")]);
        assert_eq!(cache.get("apollo", "dolo"), Some(vec![record("Dolo 650")]));
    }

    #[test]
    fn test_query_case_folded() {
        let (cache, _) = cache_with_clock();
        cache.put("apollo", "Paracetamol", vec![record("Paracetamol 500")]);

        assert!(cache.get("apollo", "paracetamol").is_some());
        assert!(cache.get("apollo", "  PARACETAMOL ").is_some());
        assert!(cache.get("netmeds", "paracetamol").is_none());
    }

    #[test]
    fn test_empty_result_is_cached() {
        let (cache, _) = cache_with_clock();
        cache.put("apollo", "xyz", Vec::new());
        assert_eq!(cache.get("apollo", "xyz"), Some(Vec::new()));
    }

    #[test]
    fn test_entry_expires_at_ttl() {
        let (cache, clock) = cache_with_clock();
        cache.put("apollo", "dolo", vec![record("Dolo 650")]);

        clock.advance(ChronoDuration::hours(3) - ChronoDuration::seconds(1));
        assert!(cache.get("apollo", "dolo").is_some());

        clock.advance(ChronoDuration::seconds(1));
        assert!(cache.get("apollo", "dolo").is_none());
    }

    #[test]
    fn test_stale_entry_overwritten_by_put() {
        let (cache, clock) = cache_with_clock();
        cache.put("apollo", "dolo", vec![record("Old")]);
        clock.advance(ChronoDuration::hours(4));

        cache.put("apollo", "dolo", vec![record("New")]);
        assert_eq!(cache.get("apollo", "dolo"), Some(vec![record("New")]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_purge_expired() {
        let (cache, clock) = cache_with_clock();
        cache.put("apollo", "a", Vec::new());
        clock.advance(ChronoDuration::hours(2));
        cache.put("apollo", "b", Vec::new());
        clock.advance(ChronoDuration::hours(2));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("apollo", "b").is_some());
    }

    #[test]
    fn test_clock_going_backwards_keeps_entry() {
        let (cache, clock) = cache_with_clock();
        cache.put("apollo", "dolo", Vec::new());
        clock.advance(ChronoDuration::hours(-1));
        assert!(cache.get("apollo", "dolo").is_some());
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(ResultCache::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    let source = format!("source-{}", i);
                    cache.put(&source, "dolo", vec![record("Dolo")]);
                    cache.get(&source, "dolo")
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_some());
        }
        assert_eq!(cache.len(), 8);
    }
}
