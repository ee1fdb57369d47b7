//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::{Ini, ParseOption, Properties};
use regex::Regex;
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Read options: backslashes are literal so regex patterns survive.
pub(super) fn parse_options() -> ParseOption {
    ParseOption {
        enabled_escape: false,
        ..ParseOption::default()
    }
}

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("max_entries") {
            config.cache.max_entries = parse_positive(v).ok_or_else(|| {
                invalid("cache", "max_entries", v, "must be a positive integer")
            })? as usize;
        }
        for (key, field) in [
            ("ttl_low", &mut config.cache.ttl_low),
            ("ttl_medium", &mut config.cache.ttl_medium),
            ("ttl_high", &mut config.cache.ttl_high),
            ("ttl_critical", &mut config.cache.ttl_critical),
        ] {
            if let Some(v) = section.get(key) {
                *field = parse_positive(v).ok_or_else(|| {
                    invalid("cache", key, v, "must be a positive integer (seconds)")
                })?;
            }
        }
    }

    // [worker] section
    if let Some(section) = ini.section(Some("worker")) {
        if let Some(v) = section.get("version") {
            let v = v.trim();
            if v.is_empty() || v.contains(char::is_whitespace) {
                return Err(invalid(
                    "worker",
                    "version",
                    v,
                    "must be a non-empty token without spaces",
                ));
            }
            config.worker.version = v.to_string();
        }
        if let Some(list) = parse_list(section, "static_assets") {
            config.worker.static_assets = list;
        }
        if let Some(list) = parse_list(section, "optional_assets") {
            config.worker.optional_assets = list;
        }
        if let Some(list) = parse_list(section, "app_routes") {
            config.worker.app_routes = list;
        }
        if let Some(list) = parse_lines(section, "api_patterns") {
            for pattern in &list {
                if let Err(e) = Regex::new(pattern) {
                    return Err(invalid("worker", "api_patterns", pattern, &e.to_string()));
                }
            }
            config.worker.api_patterns = list;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_positive(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|n| *n > 0)
}

/// Path list: the key may repeat and each value may hold comma-separated
/// items. Blank items are dropped.
pub(super) fn parse_list(section: &Properties, key: &str) -> Option<Vec<String>> {
    section.contains_key(key).then(|| {
        section
            .get_all(key)
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
}

/// One item per occurrence of the key, taken verbatim apart from
/// surrounding whitespace. Blank values are dropped.
pub(super) fn parse_lines(section: &Properties, key: &str) -> Option<Vec<String>> {
    section.contains_key(key).then(|| {
        section
            .get_all(key)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str_opt(content, parse_options()).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_cache_section() {
        let config = parse(
            "[cache]\nmax_entries = 250\nttl_low = 60\nttl_critical = 7200\n",
        )
        .unwrap();

        assert_eq!(config.cache.max_entries, 250);
        assert_eq!(config.cache.ttl_low, 60);
        assert_eq!(config.cache.ttl_medium, DEFAULT_TTL_MEDIUM_SECS);
        assert_eq!(config.cache.ttl_critical, 7200);

        let cache_config = config.cache_config("u1");
        assert_eq!(cache_config.max_entries, 250);
        assert_eq!(cache_config.ttl.low, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_max_entries() {
        for value in ["0", "-1", "lots"] {
            let err = parse(&format!("[cache]\nmax_entries = {}\n", value)).unwrap_err();
            match err {
                ConfigFileError::InvalidValue { section, key, .. } => {
                    assert_eq!(section, "cache");
                    assert_eq!(key, "max_entries");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_invalid_ttl() {
        let err = parse("[cache]\nttl_high = 30m\n").unwrap_err();
        assert!(err.to_string().contains("cache.ttl_high"));
    }

    #[test]
    fn test_worker_lists() {
        let config = parse(
            "[worker]\nversion = v2.0.0\nstatic_assets = /manifest.json, /app.webmanifest ,\napp_routes =\n",
        )
        .unwrap();

        assert_eq!(config.worker.version, "v2.0.0");
        assert_eq!(
            config.worker.static_assets,
            vec!["/manifest.json", "/app.webmanifest"]
        );
        assert!(config.worker.app_routes.is_empty());
        assert_eq!(config.worker_config().bucket_name(crate::worker::Bucket::Api), "api-v2.0.0");
    }

    #[test]
    fn test_repeated_list_keys_accumulate() {
        let config = parse(
            "[worker]\napp_routes = /\napp_routes = /dashboard, /clientes\n\
             api_patterns = ^/api/v[0-9]{1,2}/\napi_patterns = ^/rpc/\n",
        )
        .unwrap();

        assert_eq!(config.worker.app_routes, vec!["/", "/dashboard", "/clientes"]);
        assert_eq!(
            config.worker.api_patterns,
            vec!["^/api/v[0-9]{1,2}/", "^/rpc/"]
        );
    }

    #[test]
    fn test_invalid_api_pattern() {
        let err = parse("[worker]\napi_patterns = ^/api/\napi_patterns = ([\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue { key, value, .. } => {
                assert_eq!(key, "api_patterns");
                assert_eq!(value, "([");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_backslashes_are_kept() {
        let config = parse("[worker]\napi_patterns = ^https://api\\.example\\.com/\n").unwrap();
        assert_eq!(config.worker.api_patterns, vec![r"^https://api\.example\.com/"]);
    }

    #[test]
    fn test_invalid_version() {
        assert!(parse("[worker]\nversion = v1 beta\n").is_err());
    }

    #[test]
    fn test_logging_file() {
        let config = parse("[logging]\nfile = /var/log/contabil.log\n").unwrap();
        assert_eq!(config.logging.file, PathBuf::from("/var/log/contabil.log"));

        let config = parse("[logging]\nfile =\n").unwrap();
        assert_eq!(config.logging.file, default_log_path());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.ini");
        std::fs::write(&path, "[cache]\nmax_entries = 5\n").unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.cache.max_entries, 5);
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/logs/x.log"), home.join("logs/x.log"));
        }
        assert_eq!(expand_tilde("logs/x.log"), PathBuf::from("logs/x.log"));
    }
}
