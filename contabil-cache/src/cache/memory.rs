//! In-memory application cache with priority-weighted eviction.

use crate::cache::config::CacheManagerConfig;
use crate::cache::entry::CacheEntry;
use crate::cache::stats::{CacheStatistics, CacheStats};
use crate::cache::types::{CacheError, CacheOptions};
use crate::clock::{Clock, SystemClock};
use crate::log::{Logger, NoOpLogger};
use crate::{log_debug, log_warn};
use parking_lot::Mutex;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// A fetch that started while its key was uncached.
///
/// Invalidations that would have removed the key mark the fetch stale so
/// its late result is not written back.
#[derive(Debug)]
struct InFlight {
    key: String,
    tags: BTreeSet<String>,
    stale: bool,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
    in_flight: HashMap<u64, InFlight>,
    next_ticket: u64,
}

impl Inner {
    fn mark_in_flight_stale<F>(&mut self, mut matches: F)
    where
        F: FnMut(&InFlight) -> bool,
    {
        for fetch in self.in_flight.values_mut() {
            if matches(fetch) {
                fetch.stale = true;
            }
        }
    }
}

/// Keyed store of JSON values with priority-based TTL and tag invalidation.
///
/// Reads expire lazily: an entry past its TTL is removed when it is next
/// read, never by a background sweep. When a new key is inserted at
/// capacity, exactly one entry is evicted first: the one with the highest
/// score `age * weight + idle * 2 - hits * 1000`, where low priority weighs 4
/// and critical weighs 1. This is a priority-biased recency/frequency policy,
/// not strict LRU.
///
/// # Example
///
/// ```
/// use contabil_cache::cache::{CacheManager, CacheManagerConfig, CacheOptions, Priority};
/// use serde_json::json;
///
/// let cache = CacheManager::new(CacheManagerConfig::new("user1")).unwrap();
/// cache.set(
///     "user1:empresas:42",
///     json!({"razao_social": "ACME LTDA"}),
///     CacheOptions::new().with_priority(Priority::High).with_tag("empresas"),
/// );
///
/// assert!(cache.get("user1:empresas:42").is_some());
/// assert_eq!(cache.invalidate_by_tag("empresas"), 1);
/// assert!(cache.get("user1:empresas:42").is_none());
/// ```
pub struct CacheManager {
    config: CacheManagerConfig,
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
    logger: Arc<dyn Logger>,
}

impl fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManager")
            .field("config", &self.config)
            .field("entries", &self.entry_count())
            .finish()
    }
}

impl CacheManager {
    /// Create a cache using the system clock and no logging.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfig`] if the configuration is rejected
    /// by [`CacheManagerConfig::validate`].
    pub fn new(config: CacheManagerConfig) -> Result<Self, CacheError> {
        Self::with_parts(config, Arc::new(SystemClock), Arc::new(NoOpLogger))
    }

    /// Create a cache with an explicit clock and logger.
    pub fn with_parts(
        config: CacheManagerConfig,
        clock: Arc<dyn Clock>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self, CacheError> {
        config.validate()?;
        Ok(Self {
            config,
            inner: Mutex::new(Inner::default()),
            clock,
            logger,
        })
    }

    pub fn config(&self) -> &CacheManagerConfig {
        &self.config
    }

    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    pub(crate) fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Insert or overwrite an entry.
    pub fn set(&self, key: impl Into<String>, data: Value, options: CacheOptions) {
        let key = key.into();
        let mut inner = self.inner.lock();
        self.insert_locked(&mut inner, key, data, &options);
    }

    fn insert_locked(&self, inner: &mut Inner, key: String, data: Value, options: &CacheOptions) {
        let now = self.clock.now_ms();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.config.max_entries {
            self.evict_one_locked(inner, now);
        }

        let priority = options.priority();
        let ttl = options
            .ttl
            .unwrap_or_else(|| self.config.ttl.for_priority(priority));
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let tags = options.resolved_tags(&self.config.user_id);

        inner
            .entries
            .insert(key, CacheEntry::new(data, now, ttl_ms, priority, tags));
    }

    /// Remove the single entry with the highest eviction score.
    fn evict_one_locked(&self, inner: &mut Inner, now: i64) {
        let victim = inner
            .entries
            .iter()
            .max_by_key(|(_, entry)| entry.eviction_score(now))
            .map(|(key, _)| key.clone());

        if let Some(key) = victim {
            inner.entries.remove(&key);
            inner.stats.record_eviction();
            log_debug!(self.logger, "Cache eviction: removed '{}' at capacity", key);
        }
    }

    /// Read an entry.
    ///
    /// Returns `None` on a miss or when the entry has outlived its TTL, in
    /// which case it is removed.
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now_ms();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let expired = inner.entries.get(key).map(|entry| entry.is_expired(now));
        match expired {
            Some(false) => {
                let entry = inner.entries.get_mut(key)?;
                entry.touch(now);
                inner.stats.record_hit();
                Some(entry.data.clone())
            }
            Some(true) => {
                inner.entries.remove(key);
                inner.stats.record_expiration();
                inner.stats.record_miss();
                None
            }
            None => {
                inner.stats.record_miss();
                None
            }
        }
    }

    /// Whether a live entry exists, without touching stats or access times.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Delete every entry carrying `tag`. Returns how many were removed.
    pub fn invalidate_by_tag(&self, tag: &str) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.tags.contains(tag));
        let removed = before - inner.entries.len();

        inner.mark_in_flight_stale(|fetch| fetch.tags.contains(tag));
        inner.stats.record_invalidations(removed);
        drop(inner);

        log_debug!(self.logger, "Invalidated {} entries by tag '{}'", removed, tag);
        removed
    }

    /// Delete every entry whose key matches `pattern` (a regular expression,
    /// matched anywhere in the key). Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidPattern`] without removing anything if
    /// `pattern` does not compile.
    pub fn invalidate_by_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let regex = Regex::new(pattern).map_err(|source| CacheError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|key, _| !regex.is_match(key));
        let removed = before - inner.entries.len();

        inner.mark_in_flight_stale(|fetch| regex.is_match(&fetch.key));
        inner.stats.record_invalidations(removed);
        drop(inner);

        log_debug!(
            self.logger,
            "Invalidated {} entries by pattern '{}'",
            removed,
            pattern
        );
        Ok(removed)
    }

    /// Remove every entry and reset all counters.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.stats = CacheStats::new();
        inner.mark_in_flight_stale(|_| true);
    }

    /// Drop every expired entry now. Returns how many were removed.
    ///
    /// The cache never calls this itself.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - inner.entries.len();
        for _ in 0..removed {
            inner.stats.record_expiration();
        }
        removed
    }

    /// Number of stored entries, including expired ones not yet read.
    pub fn entry_count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Snapshot of counters plus entry count and serialized size.
    ///
    /// Serializes every entry to measure size, so cost grows with the cache.
    pub fn stats(&self) -> CacheStatistics {
        let inner = self.inner.lock();
        let total_size: usize = inner
            .entries
            .iter()
            .map(|(key, entry)| key.len() + serde_json::to_vec(entry).map_or(0, |b| b.len()))
            .sum();
        CacheStatistics::from_stats(&inner.stats, inner.entries.len(), total_size)
    }

    /// Count a background failure that was logged rather than raised.
    pub(crate) fn record_suppressed_failure(&self) {
        self.inner.lock().stats.record_suppressed_failure();
    }

    /// Register a fetch for `key` that will be stored with `options`.
    pub(crate) fn begin_fetch(&self, key: &str, options: &CacheOptions) -> FetchTicket<'_> {
        let mut inner = self.inner.lock();
        let id = inner.next_ticket;
        inner.next_ticket = inner.next_ticket.wrapping_add(1);
        inner.in_flight.insert(
            id,
            InFlight {
                key: key.to_string(),
                tags: options.resolved_tags(&self.config.user_id),
                stale: false,
            },
        );
        FetchTicket { cache: self, id }
    }

    /// Store a fetch result unless an invalidation hit it while in flight.
    /// Returns whether the value was stored.
    fn complete_fetch(&self, id: u64, data: Value, options: &CacheOptions) -> bool {
        let mut inner = self.inner.lock();
        let Some(fetch) = inner.in_flight.remove(&id) else {
            return false;
        };
        if fetch.stale {
            drop(inner);
            log_warn!(
                self.logger,
                "Discarded result for '{}': invalidated while fetching",
                fetch.key
            );
            return false;
        }
        self.insert_locked(&mut inner, fetch.key, data, options);
        true
    }

    fn abandon_fetch(&self, id: u64) {
        self.inner.lock().in_flight.remove(&id);
    }
}

/// Registration of an in-flight fetch. Dropping it without calling
/// [`FetchTicket::complete`] forgets the fetch.
pub(crate) struct FetchTicket<'a> {
    cache: &'a CacheManager,
    id: u64,
}

impl FetchTicket<'_> {
    /// Store `data` if still valid. Returns whether it was stored.
    pub fn complete(self, data: Value, options: &CacheOptions) -> bool {
        let stored = self.cache.complete_fetch(self.id, data, options);
        std::mem::forget(self);
        stored
    }
}

impl Drop for FetchTicket<'_> {
    fn drop(&mut self) {
        self.cache.abandon_fetch(self.id);
    }
}
