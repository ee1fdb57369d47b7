//! Configuration for the application cache manager.

use crate::cache::types::{CacheError, TtlTable};

/// Default entry limit.
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Construction-time settings for a [`CacheManager`](crate::cache::CacheManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheManagerConfig {
    /// Owner of the cache; added to every entry as the `user:<id>` tag
    pub user_id: String,
    /// Maximum number of live entries
    pub max_entries: usize,
    /// Default TTL per priority
    pub ttl: TtlTable,
}

impl CacheManagerConfig {
    /// Defaults for the given user.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            max_entries: DEFAULT_MAX_ENTRIES,
            ttl: TtlTable::default(),
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_ttl_table(mut self, ttl: TtlTable) -> Self {
        self.ttl = ttl;
        self
    }

    /// Reject settings the manager cannot honour.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.max_entries == 0 {
            return Err(CacheError::InvalidConfig(
                "max_entries must be at least 1".to_string(),
            ));
        }
        if self.user_id.trim().is_empty() {
            return Err(CacheError::InvalidConfig(
                "user_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
