//! Predictive preloading of well-known keys.

use crate::cache::memory::CacheManager;
use crate::cache::types::{cache_key, CacheOptions, Priority, PREDICTIVE_TAG};
use crate::log_warn;
use futures::future::join_all;
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;

/// Keys a signed-in user is likely to need next.
pub fn default_preload_patterns(user_id: &str) -> Vec<String> {
    vec![
        format!("{}:dashboard", user_id),
        cache_key(user_id, "documentos", "recent"),
        cache_key(user_id, "calculos", "pending"),
        cache_key(user_id, "prazos", "upcoming"),
    ]
}

/// Outcome of a preload batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadReport {
    /// Keys fetched and stored
    pub loaded: Vec<String>,
    /// Keys whose fetch failed, with the error message
    pub failed: Vec<(String, String)>,
    /// Keys fetched but not stored because an invalidation matched them
    /// while the fetch was in flight
    pub discarded: Vec<String>,
}

impl PreloadReport {
    /// Whether every pattern ended up cached.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.discarded.is_empty()
    }
}

impl CacheManager {
    /// Fetch every pattern concurrently and cache each success with
    /// `priority: medium` and the `predictive` tag.
    ///
    /// A failed fetch is logged, counted as a suppressed failure and
    /// reported; it never cancels the rest of the batch.
    pub async fn predictive_preload<F, Fut, E>(
        &self,
        patterns: &[String],
        fetcher: F,
    ) -> PreloadReport
    where
        F: Fn(&str) -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: Display,
    {
        let options = CacheOptions::new()
            .with_priority(Priority::Medium)
            .with_tag(PREDICTIVE_TAG);

        let fetches = patterns.iter().map(|pattern| {
            let ticket = self.begin_fetch(pattern, &options);
            let fetch = fetcher(pattern.as_str());
            async move { (pattern, ticket, fetch.await) }
        });

        let mut report = PreloadReport::default();
        for (pattern, ticket, result) in join_all(fetches).await {
            match result {
                Ok(value) => {
                    if ticket.complete(value, &options) {
                        report.loaded.push(pattern.clone());
                    } else {
                        report.discarded.push(pattern.clone());
                    }
                }
                Err(e) => {
                    drop(ticket);
                    self.record_suppressed_failure();
                    log_warn!(
                        self.logger(),
                        "Predictive preload failed for '{}': {}",
                        pattern,
                        e
                    );
                    report.failed.push((pattern.clone(), e.to_string()));
                }
            }
        }
        report
    }
}
