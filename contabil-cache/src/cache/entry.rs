//! Cache entry and its eviction score.

use crate::cache::types::Priority;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// One cached value with its bookkeeping.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CacheEntry {
    pub data: Value,
    /// Creation time, epoch ms
    pub timestamp: i64,
    /// Lifetime in ms
    #[serde(rename = "ttl")]
    pub ttl_ms: i64,
    pub priority: Priority,
    pub tags: BTreeSet<String>,
    pub hit_count: u64,
    /// Last read, epoch ms
    pub last_accessed: i64,
}

impl CacheEntry {
    pub fn new(
        data: Value,
        now_ms: i64,
        ttl_ms: i64,
        priority: Priority,
        tags: BTreeSet<String>,
    ) -> Self {
        Self {
            data,
            timestamp: now_ms,
            ttl_ms,
            priority,
            tags,
            hit_count: 0,
            last_accessed: now_ms,
        }
    }

    /// Strictly older than its TTL.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms - self.timestamp > self.ttl_ms
    }

    /// Record a successful read.
    pub fn touch(&mut self, now_ms: i64) {
        self.hit_count += 1;
        self.last_accessed = now_ms;
    }

    /// `age * priority_weight + idle * 2 - hits * 1000`; the highest score is
    /// evicted first.
    pub fn eviction_score(&self, now_ms: i64) -> i64 {
        let age = now_ms - self.timestamp;
        let idle = now_ms - self.last_accessed;
        let hits = i64::try_from(self.hit_count).unwrap_or(i64::MAX);

        age.saturating_mul(self.priority.eviction_weight())
            .saturating_add(idle.saturating_mul(2))
            .saturating_sub(hits.saturating_mul(1000))
    }
}
