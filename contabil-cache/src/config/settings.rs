//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{CacheManagerConfig, TtlTable};
use crate::worker::WorkerConfig;

/// Complete configuration loaded from cache.ini.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub cache: CacheSettings,
    pub worker: WorkerSettings,
    pub logging: LoggingSettings,
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Capacity of the application cache
    pub max_entries: usize,
    /// TTL per priority, in seconds
    pub ttl_low: u64,
    pub ttl_medium: u64,
    pub ttl_high: u64,
    pub ttl_critical: u64,
}

/// `[worker]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Bucket version suffix
    pub version: String,
    pub static_assets: Vec<String>,
    pub optional_assets: Vec<String>,
    pub app_routes: Vec<String>,
    pub api_patterns: Vec<String>,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

impl CacheSettings {
    pub fn ttl_table(&self) -> TtlTable {
        TtlTable {
            low: Duration::from_secs(self.ttl_low),
            medium: Duration::from_secs(self.ttl_medium),
            high: Duration::from_secs(self.ttl_high),
            critical: Duration::from_secs(self.ttl_critical),
        }
    }
}

impl ConfigFile {
    /// Cache manager configuration for `user_id`.
    pub fn cache_config(&self, user_id: impl Into<String>) -> CacheManagerConfig {
        CacheManagerConfig::new(user_id)
            .with_max_entries(self.cache.max_entries)
            .with_ttl_table(self.cache.ttl_table())
    }

    /// Interception layer configuration.
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            version: self.worker.version.clone(),
            static_assets: self.worker.static_assets.clone(),
            optional_assets: self.worker.optional_assets.clone(),
            app_routes: self.worker.app_routes.clone(),
            api_patterns: self.worker.api_patterns.clone(),
        }
    }
}
