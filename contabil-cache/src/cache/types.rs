//! Core types for the application cache.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Tag added to every entry.
pub const AUTO_TAG: &str = "auto";

/// Tag added to entries stored by predictive preload.
pub const PREDICTIVE_TAG: &str = "predictive";

/// Build a namespaced cache key: `"{user}:{resource_type}:{resource_id}"`.
pub fn cache_key(user_id: &str, resource_type: &str, resource_id: &str) -> String {
    format!("{}:{}:{}", user_id, resource_type, resource_id)
}

/// Tag identifying every entry owned by a user.
pub fn user_tag(user_id: &str) -> String {
    format!("user:{}", user_id)
}

/// Declared importance of an entry.
///
/// Drives both the default TTL and how fast the entry accrues eviction
/// pressure.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    /// All priorities, lowest first.
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    /// Multiplier applied to entry age in the eviction score.
    pub fn eviction_weight(self) -> i64 {
        match self {
            Priority::Low => 4,
            Priority::Medium => 3,
            Priority::High => 2,
            Priority::Critical => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown priority '{}'",
                other
            ))),
        }
    }
}

/// Default time-to-live per priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlTable {
    pub low: Duration,
    pub medium: Duration,
    pub high: Duration,
    pub critical: Duration,
}

impl Default for TtlTable {
    fn default() -> Self {
        Self {
            low: Duration::from_secs(5 * 60),
            medium: Duration::from_secs(10 * 60),
            high: Duration::from_secs(30 * 60),
            critical: Duration::from_secs(60 * 60),
        }
    }
}

impl TtlTable {
    /// TTL for the given priority.
    pub fn for_priority(&self, priority: Priority) -> Duration {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::High => self.high,
            Priority::Critical => self.critical,
        }
    }
}

/// Per-insert options.
///
/// Unset fields fall back to `Priority::Medium`, the priority's TTL from the
/// cache's [`TtlTable`], and no extra tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheOptions {
    pub priority: Option<Priority>,
    pub ttl: Option<Duration>,
    pub tags: Vec<String>,
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Resolve the effective priority.
    pub fn priority(&self) -> Priority {
        self.priority.unwrap_or_default()
    }

    /// Final tag set: caller tags plus `user:<id>` and `auto`.
    pub(crate) fn resolved_tags(&self, user_id: &str) -> BTreeSet<String> {
        let mut tags: BTreeSet<String> = self.tags.iter().cloned().collect();
        tags.insert(user_tag(user_id));
        tags.insert(AUTO_TAG.to_string());
        tags
    }
}

/// Cache-related errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Invalidation pattern is not a valid regular expression
    #[error("Invalid invalidation pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Realtime subscription could not be established
    #[error("Change subscription failed: {0}")]
    Subscription(String),

    /// Invalid cache configuration
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_format() {
        assert_eq!(cache_key("u1", "empresas", "42"), "u1:empresas:42");
    }

    #[test]
    fn test_default_ttl_table() {
        let table = TtlTable::default();
        assert_eq!(table.for_priority(Priority::Low), Duration::from_secs(300));
        assert_eq!(table.for_priority(Priority::Medium), Duration::from_secs(600));
        assert_eq!(table.for_priority(Priority::High), Duration::from_secs(1800));
        assert_eq!(
            table.for_priority(Priority::Critical),
            Duration::from_secs(3600)
        );
    }

    #[test]
    fn test_eviction_weights_favor_low_priority() {
        assert_eq!(Priority::Low.eviction_weight(), 4);
        assert_eq!(Priority::Medium.eviction_weight(), 3);
        assert_eq!(Priority::High.eviction_weight(), 2);
        assert_eq!(Priority::Critical.eviction_weight(), 1);
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" low ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_options_default_priority_is_medium() {
        assert_eq!(CacheOptions::default().priority(), Priority::Medium);
    }

    #[test]
    fn test_resolved_tags_include_automatic_tags() {
        let options = CacheOptions::new().with_tags(["documentos", "fiscal"]);
        let tags = options.resolved_tags("u1");

        assert!(tags.contains("documentos"));
        assert!(tags.contains("fiscal"));
        assert!(tags.contains("user:u1"));
        assert!(tags.contains(AUTO_TAG));
        assert_eq!(tags.len(), 4);
    }
}
