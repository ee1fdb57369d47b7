//! Default values and constants for all configuration settings.
//!
//! Contains the `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation. Defaults mirror the in-code defaults of
//! [`CacheManagerConfig`](crate::cache::CacheManagerConfig) and
//! [`WorkerConfig`](crate::worker::WorkerConfig).

use std::path::PathBuf;

use super::settings::*;
use crate::cache::DEFAULT_MAX_ENTRIES as CACHE_MAX_ENTRIES;
use crate::logging::{default_log_dir, default_log_file};
use crate::worker::WorkerConfig;

// =============================================================================
// [cache]
// =============================================================================

pub const DEFAULT_MAX_ENTRIES: usize = CACHE_MAX_ENTRIES;

pub const DEFAULT_TTL_LOW_SECS: u64 = 5 * 60;

pub const DEFAULT_TTL_MEDIUM_SECS: u64 = 10 * 60;

pub const DEFAULT_TTL_HIGH_SECS: u64 = 30 * 60;

pub const DEFAULT_TTL_CRITICAL_SECS: u64 = 60 * 60;

// =============================================================================
// Paths
// =============================================================================

/// Directory under the home directory holding cache.ini.
pub const CONFIG_DIR_NAME: &str = ".contabilidadepro";

pub const CONFIG_FILE_NAME: &str = "cache.ini";

/// Default log file path (`logs/contabil-cache.log`).
pub fn default_log_path() -> PathBuf {
    PathBuf::from(default_log_dir()).join(default_log_file())
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            ttl_low: DEFAULT_TTL_LOW_SECS,
            ttl_medium: DEFAULT_TTL_MEDIUM_SECS,
            ttl_high: DEFAULT_TTL_HIGH_SECS,
            ttl_critical: DEFAULT_TTL_CRITICAL_SECS,
        }
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        let worker = WorkerConfig::default();
        Self {
            version: worker.version,
            static_assets: worker.static_assets,
            optional_assets: worker.optional_assets,
            app_routes: worker.app_routes,
            api_patterns: worker.api_patterns,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: default_log_path(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            worker: WorkerSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlTable;

    #[test]
    fn test_ttl_defaults_match_cache_table() {
        assert_eq!(CacheSettings::default().ttl_table(), TtlTable::default());
    }

    #[test]
    fn test_worker_defaults_match_worker_config() {
        let config = ConfigFile::default();
        assert_eq!(config.worker_config(), WorkerConfig::default());
    }

    #[test]
    fn test_default_log_path() {
        assert_eq!(
            default_log_path(),
            PathBuf::from("logs").join("contabil-cache.log")
        );
    }
}
