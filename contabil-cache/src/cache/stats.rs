//! Cache statistics tracking and reporting.

use serde::Serialize;

/// Running counters kept by the cache manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries removed by tag or pattern invalidation
    pub invalidations: u64,
    /// Entries removed under capacity pressure
    pub evictions: u64,
    /// Entries dropped on read because their TTL had passed
    pub expirations: u64,
    /// Background failures that were logged instead of raised
    pub suppressed_failures: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hit rate in percent (0.0 to 100.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }

    /// Miss rate in percent (0.0 to 100.0).
    pub fn miss_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.misses as f64 / total as f64 * 100.0
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_invalidations(&mut self, count: usize) {
        self.invalidations += count as u64;
    }

    pub fn record_suppressed_failure(&mut self) {
        self.suppressed_failures += 1;
    }
}

/// Point-in-time view of the cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatistics {
    pub total_entries: usize,
    /// Serialized JSON size of all entries, in bytes
    pub total_size: usize,
    /// Percent
    pub hit_rate: f64,
    /// Percent
    pub miss_rate: f64,
    pub invalidations: u64,
    /// `total_size` in KiB
    pub memory_usage: f64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub suppressed_failures: u64,
}

impl CacheStatistics {
    /// Build a snapshot from counters plus the measured entry count and size.
    pub fn from_stats(stats: &CacheStats, total_entries: usize, total_size: usize) -> Self {
        Self {
            total_entries,
            total_size,
            hit_rate: stats.hit_rate(),
            miss_rate: stats.miss_rate(),
            invalidations: stats.invalidations,
            memory_usage: total_size as f64 / 1024.0,
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            suppressed_failures: stats.suppressed_failures,
        }
    }

    /// Human-readable report.
    pub fn format(&self) -> String {
        format!(
            r#"Application Cache Statistics

ENTRIES
  Count:        {}
  Size:         {} bytes ({:.2} KiB)

ACCESS
  Hits:         {}
  Misses:       {}
  Hit Rate:     {:.1}%
  Miss Rate:    {:.1}%

REMOVALS
  Invalidated:  {}
  Evicted:      {}
  Expired:      {}

BACKGROUND
  Suppressed failures: {}
"#,
            self.total_entries,
            self.total_size,
            self.memory_usage,
            self.hits,
            self.misses,
            self.hit_rate,
            self.miss_rate,
            self.invalidations,
            self.evictions,
            self.expirations,
            self.suppressed_failures,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        let snapshot = CacheStatistics::from_stats(&stats, 2, 2048);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["totalEntries"], 2);
        assert_eq!(json["hitRate"], 50.0);
        assert_eq!(json["memoryUsage"], 2.0);
        assert_eq!(json["suppressedFailures"], 0);
    }

    #[test]
    fn test_rates_with_no_traffic_are_zero() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.miss_rate(), 0.0);
    }

    #[test]
    fn test_hit_and_miss_rates() {
        let mut stats = CacheStats::new();
        for _ in 0..3 {
            stats.record_hit();
        }
        stats.record_miss();

        assert!((stats.hit_rate() - 75.0).abs() < 1e-9);
        assert!((stats.miss_rate() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalidations_accumulate_counts() {
        let mut stats = CacheStats::new();
        stats.record_invalidations(3);
        stats.record_invalidations(0);
        stats.record_invalidations(2);
        assert_eq!(stats.invalidations, 5);
    }

    #[test]
    fn test_snapshot_memory_usage_in_kib() {
        let stats = CacheStats::new();
        let snapshot = CacheStatistics::from_stats(&stats, 2, 2048);
        assert_eq!(snapshot.total_entries, 2);
        assert!((snapshot.memory_usage - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_contains_sections() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_suppressed_failure();
        let report = CacheStatistics::from_stats(&stats, 1, 100).format();

        assert!(report.contains("Hit Rate:     100.0%"));
        assert!(report.contains("Suppressed failures: 1"));
    }
}
