//! Configuration for the network interception layer.

use std::fmt;

/// Cache version suffix; bump to drop every bucket on the next activation.
pub const DEFAULT_CACHE_VERSION: &str = "v1.2.0";

/// Extensions served cache-first.
pub const STATIC_EXTENSIONS: [&str; 11] = [
    ".js", ".css", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".avif", ".woff", ".woff2",
];

/// Named Cache Storage bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// Static assets
    Static,
    /// App routes and fallback responses
    Dynamic,
    /// Backend API responses
    Api,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Static, Bucket::Dynamic, Bucket::Api];

    pub fn prefix(self) -> &'static str {
        match self {
            Bucket::Static => "static",
            Bucket::Dynamic => "dynamic",
            Bucket::Api => "api",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// What the worker caches and how it recognizes requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Version suffix of every bucket name
    pub version: String,
    /// Pre-cached at install as one batch
    pub static_assets: Vec<String>,
    /// Pre-cached at install one by one; failures are skipped
    pub optional_assets: Vec<String>,
    /// Route prefixes served network-first with offline fallback
    pub app_routes: Vec<String>,
    /// Regular expressions identifying API requests (URL or path)
    pub api_patterns: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_CACHE_VERSION.to_string(),
            static_assets: to_strings(&["/manifest.json", "/favicon.ico"]),
            optional_assets: to_strings(&[
                "/icons/icon-192x192.png",
                "/icons/icon-512x512.png",
                "/images/logo.svg",
            ]),
            app_routes: to_strings(&[
                "/",
                "/dashboard",
                "/clientes",
                "/documentos",
                "/calculos",
                "/prazos",
                "/relatorios",
            ]),
            api_patterns: to_strings(&[r"^https://[a-z0-9-]+\.supabase\.co/rest/v1/", r"^/api/"]),
        }
    }
}

impl WorkerConfig {
    /// Full bucket name, e.g. `static-v1.2.0`.
    pub fn bucket_name(&self, bucket: Bucket) -> String {
        format!("{}-{}", bucket.prefix(), self.version)
    }

    /// Names of the three current buckets.
    pub fn current_bucket_names(&self) -> Vec<String> {
        Bucket::ALL.iter().map(|b| self.bucket_name(*b)).collect()
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bucket_names() {
        let config = WorkerConfig::default();
        assert_eq!(
            config.current_bucket_names(),
            vec!["static-v1.2.0", "dynamic-v1.2.0", "api-v1.2.0"]
        );
    }

    #[test]
    fn test_version_bump_renames_buckets() {
        let config = WorkerConfig::default().with_version("v1.3.0");
        assert_eq!(config.bucket_name(Bucket::Api), "api-v1.3.0");
    }

    #[test]
    fn test_root_is_an_app_route_not_a_static_asset() {
        let config = WorkerConfig::default();
        assert!(config.app_routes.contains(&"/".to_string()));
        assert!(!config.static_assets.contains(&"/".to_string()));
    }
}
