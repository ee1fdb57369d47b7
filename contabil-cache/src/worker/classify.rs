//! Request classification and strategy selection.

use crate::worker::config::{Bucket, WorkerConfig, STATIC_EXTENSIONS};
use crate::worker::request::Request;
use crate::worker::WorkerError;
use regex::RegexSet;
use std::fmt;

/// Kind of request, in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    StaticAsset,
    Api,
    AppRoute,
    Other,
}

/// Caching strategy applied to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    NetworkFirstWithFallback,
    StaleWhileRevalidate,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkFirst => "network-first",
            Strategy::NetworkFirstWithFallback => "network-first-with-fallback",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
        };
        f.write_str(name)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestKind::StaticAsset => "static asset",
            RequestKind::Api => "api",
            RequestKind::AppRoute => "app route",
            RequestKind::Other => "other",
        };
        f.write_str(name)
    }
}

impl RequestKind {
    /// Strategy and bucket for this kind.
    pub fn route(self) -> (Strategy, Bucket) {
        match self {
            RequestKind::StaticAsset => (Strategy::CacheFirst, Bucket::Static),
            RequestKind::Api => (Strategy::StaleWhileRevalidate, Bucket::Api),
            RequestKind::AppRoute => (Strategy::NetworkFirstWithFallback, Bucket::Dynamic),
            RequestKind::Other => (Strategy::NetworkFirst, Bucket::Dynamic),
        }
    }
}

/// Compiled classification rules.
#[derive(Debug, Clone)]
pub struct RequestClassifier {
    static_assets: Vec<String>,
    app_routes: Vec<String>,
    api_patterns: RegexSet,
}

impl RequestClassifier {
    /// Compile the rules in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::InvalidPattern`] if an API pattern does not
    /// compile.
    pub fn new(config: &WorkerConfig) -> Result<Self, WorkerError> {
        let api_patterns = RegexSet::new(&config.api_patterns)
            .map_err(|e| WorkerError::InvalidPattern(e.to_string()))?;
        Ok(Self {
            static_assets: config.static_assets.clone(),
            app_routes: config.app_routes.clone(),
            api_patterns,
        })
    }

    /// Classify a request; first match wins.
    pub fn classify(&self, request: &Request) -> RequestKind {
        let path = request.path();

        if self.is_static_asset(path) {
            RequestKind::StaticAsset
        } else if self.api_patterns.is_match(&request.url) || self.api_patterns.is_match(path) {
            RequestKind::Api
        } else if self.is_app_route(request, path) {
            RequestKind::AppRoute
        } else {
            RequestKind::Other
        }
    }

    fn is_static_asset(&self, path: &str) -> bool {
        let lower = path.to_ascii_lowercase();
        STATIC_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
            || self.static_assets.iter().any(|asset| asset == path)
    }

    fn is_app_route(&self, request: &Request, path: &str) -> bool {
        path == "/"
            || self
                .app_routes
                .iter()
                .filter(|route| route.as_str() != "/")
                .any(|route| path.starts_with(route.as_str()))
            || request.is_path_like()
    }
}
