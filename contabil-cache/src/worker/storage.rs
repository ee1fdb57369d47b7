//! Named-bucket response storage.
//!
//! Mirrors the browser Cache Storage surface the worker depends on: buckets
//! addressed by name, each mapping a request URL to a stored response. Writes
//! are last-write-wins; entries never expire on their own.

use crate::worker::request::Response;
use dashmap::DashMap;
use std::collections::HashMap;

/// Bucketed response store shared by every strategy.
pub trait CacheStorage: Send + Sync {
    /// Create the bucket if it does not exist.
    fn open(&self, bucket: &str);

    /// Response stored under `url` in `bucket`.
    fn match_in(&self, bucket: &str, url: &str) -> Option<Response>;

    /// Response stored under `url` in any bucket, searched in name order.
    fn match_any(&self, url: &str) -> Option<Response> {
        self.bucket_names()
            .iter()
            .find_map(|bucket| self.match_in(bucket, url))
    }

    /// Store `response` under `url`, creating the bucket if needed.
    fn put(&self, bucket: &str, url: &str, response: Response);

    /// Remove a whole bucket. Returns whether it existed.
    fn delete_bucket(&self, bucket: &str) -> bool;

    /// Existing bucket names, sorted.
    fn bucket_names(&self) -> Vec<String>;

    fn has_bucket(&self, bucket: &str) -> bool;

    /// Number of responses in `bucket` (0 if absent).
    fn len(&self, bucket: &str) -> usize;
}

/// In-process [`CacheStorage`].
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    buckets: DashMap<String, HashMap<String, Response>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStorage for MemoryCacheStorage {
    fn open(&self, bucket: &str) {
        self.buckets.entry(bucket.to_string()).or_default();
    }

    fn match_in(&self, bucket: &str, url: &str) -> Option<Response> {
        self.buckets
            .get(bucket)
            .and_then(|entries| entries.get(url).cloned())
    }

    fn put(&self, bucket: &str, url: &str, response: Response) {
        self.buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(url.to_string(), response);
    }

    fn delete_bucket(&self, bucket: &str) -> bool {
        self.buckets.remove(bucket).is_some()
    }

    fn bucket_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buckets.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets.contains_key(bucket)
    }

    fn len(&self, bucket: &str) -> usize {
        self.buckets.get(bucket).map(|e| e.len()).unwrap_or(0)
    }
}
