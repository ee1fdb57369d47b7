//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! Produces the commented representation written to `cache.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[cache]
; Maximum number of entries kept by the application cache (default: 1000)
; Inserting a new key at capacity evicts the entry with the highest
; priority-weighted age score.
max_entries = {}
; Time to live per priority, in seconds
; (defaults: low 300, medium 600, high 1800, critical 3600)
ttl_low = {}
ttl_medium = {}
ttl_high = {}
ttl_critical = {}

[worker]
; Cache Storage version suffix. Changing it drops every bucket of the
; previous version on the next activation.
version = {}
; One entry per line; repeat the key for each item.
; Pre-cached on install as a single batch (all or nothing)
{}; Pre-cached on install one by one; failures are skipped
{}; Route prefixes served network-first with offline fallback
{}; Regular expressions matched against the request URL or path
{}
[logging]
; Log file path
file = {}
"#,
        config.cache.max_entries,
        config.cache.ttl_low,
        config.cache.ttl_medium,
        config.cache.ttl_high,
        config.cache.ttl_critical,
        config.worker.version,
        list_lines("static_assets", &config.worker.static_assets),
        list_lines("optional_assets", &config.worker.optional_assets),
        list_lines("app_routes", &config.worker.app_routes),
        list_lines("api_patterns", &config.worker.api_patterns),
        path_to_string(&config.logging.file),
    )
}

/// One `key = item` line per item; an empty list is written as a bare key.
fn list_lines(key: &str, items: &[String]) -> String {
    if items.is_empty() {
        return format!("{} =\n", key);
    }
    items
        .iter()
        .map(|item| format!("{} = {}\n", key, item))
        .collect()
}

/// Convert path to string, collapsing home dir to ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::super::settings::ConfigFile;
    use super::to_config_string;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cache.ini");

        let mut config = ConfigFile::default();
        config.cache.max_entries = 42;
        config.cache.ttl_high = 900;
        config.worker.version = "v1.3.0".to_string();
        config.worker.optional_assets.clear();
        config.logging.file = temp_dir.path().join("contabil.log");

        config.save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_default_round_trip_keeps_api_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cache.ini");

        ConfigFile::default().save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded.worker.api_patterns, ConfigFile::default().worker.api_patterns);
    }

    #[test]
    fn test_patterns_with_commas_survive_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cache.ini");

        let mut config = ConfigFile::default();
        config.worker.api_patterns = vec![
            "^/api/v[0-9]{1,2}/".to_string(),
            "^/export/[^,;]+,csv$".to_string(),
        ];
        config.save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded.worker.api_patterns, config.worker.api_patterns);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_empty_list_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cache.ini");

        let mut config = ConfigFile::default();
        config.worker.app_routes.clear();
        config.worker.api_patterns.clear();
        config.save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert!(loaded.worker.app_routes.is_empty());
        assert!(loaded.worker.api_patterns.is_empty());
    }

    #[test]
    fn test_lists_are_written_one_item_per_line() {
        let content = to_config_string(&ConfigFile::default());
        assert!(content.contains("app_routes = /\napp_routes = /dashboard\n"));
    }

    #[test]
    fn test_output_is_commented() {
        let content = to_config_string(&ConfigFile::default());
        assert!(content.contains("[cache]"));
        assert!(content.contains("max_entries = 1000"));
        assert!(content.contains("version = v1.2.0"));
        assert!(content.contains("; Log file path"));
    }
}
