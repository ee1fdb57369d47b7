//! Interception counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters shared with background revalidation tasks.
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Requests answered from Cache Storage
    cache_hits: AtomicU64,
    /// Network fetches attempted, foreground and background
    network_fetches: AtomicU64,
    /// Background refreshes that replaced a cached response
    revalidations: AtomicU64,
    /// Requests answered with cached `/` or the offline page
    offline_fallbacks: AtomicU64,
    /// Requests answered with a bare 503
    unavailable: AtomicU64,
    /// Requests left to the browser
    passthrough: AtomicU64,
    /// Failures logged instead of raised (install, revalidation)
    suppressed_failures: AtomicU64,
}

/// Point-in-time copy of [`WorkerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerStatistics {
    pub cache_hits: u64,
    pub network_fetches: u64,
    pub revalidations: u64,
    pub offline_fallbacks: u64,
    pub unavailable: u64,
    pub passthrough: u64,
    pub suppressed_failures: u64,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_network_fetch(&self) {
        self.network_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_revalidation(&self) {
        self.revalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_offline_fallback(&self) {
        self.offline_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unavailable(&self) {
        self.unavailable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_passthrough(&self) {
        self.passthrough.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_suppressed_failure(&self) {
        self.suppressed_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> WorkerStatistics {
        WorkerStatistics {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            network_fetches: self.network_fetches.load(Ordering::Relaxed),
            revalidations: self.revalidations.load(Ordering::Relaxed),
            offline_fallbacks: self.offline_fallbacks.load(Ordering::Relaxed),
            unavailable: self.unavailable.load(Ordering::Relaxed),
            passthrough: self.passthrough.load(Ordering::Relaxed),
            suppressed_failures: self.suppressed_failures.load(Ordering::Relaxed),
        }
    }
}

impl WorkerStatistics {
    /// One-line summary for logs and the CLI.
    pub fn format(&self) -> String {
        format!(
            "hits={} fetches={} revalidated={} offline={} 503={} passthrough={} suppressed={}",
            self.cache_hits,
            self.network_fetches,
            self.revalidations,
            self.offline_fallbacks,
            self.unavailable,
            self.passthrough,
            self.suppressed_failures
        )
    }
}
