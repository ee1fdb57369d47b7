//! Worker lifecycle and fetch dispatch.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::info;

use crate::log::{Logger, TracingLogger};
use crate::worker::classify::{RequestClassifier, RequestKind, Strategy};
use crate::worker::clients::ClientRegistry;
use crate::worker::config::{Bucket, WorkerConfig};
use crate::worker::network::Network;
use crate::worker::offline::offline_response;
use crate::worker::request::{Method, Request, Response};
use crate::worker::stats::{WorkerStatistics, WorkerStats};
use crate::worker::storage::CacheStorage;
use crate::worker::WorkerError;
use crate::{log_debug, log_info, log_warn};

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
}

/// Where a handled response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Network,
    Cache,
    /// Cached root document served for a failed app route
    RootFallback,
    OfflinePage,
    /// Bare 503 after an unrecoverable failure
    Unavailable,
}

/// A response together with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: Response,
    pub source: Source,
}

impl Served {
    pub(crate) fn new(response: Response, source: Source) -> Self {
        Self { response, source }
    }
}

/// Result of dispatching one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the browser handles it.
    Passthrough,
    Handled {
        kind: RequestKind,
        strategy: Strategy,
        served: Served,
    },
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Passthrough => None,
            FetchOutcome::Handled { served, .. } => Some(&served.response),
        }
    }

    pub fn source(&self) -> Option<Source> {
        match self {
            FetchOutcome::Passthrough => None,
            FetchOutcome::Handled { served, .. } => Some(served.source),
        }
    }

    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            FetchOutcome::Passthrough => None,
            FetchOutcome::Handled { strategy, .. } => Some(*strategy),
        }
    }
}

/// What the install step managed to cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Whether the mandatory static batch was stored
    pub static_batch_cached: bool,
    /// Why the mandatory batch was dropped
    pub static_batch_error: Option<String>,
    pub optional_cached: Vec<String>,
    pub optional_failed: Vec<(String, String)>,
    pub routes_cached: Vec<String>,
    pub routes_failed: Vec<(String, String)>,
    /// Always set; the worker never waits for old tabs to close
    pub skip_waiting: bool,
}

impl InstallReport {
    /// Every asset and route was cached.
    pub fn is_complete(&self) -> bool {
        self.static_batch_cached && self.optional_failed.is_empty() && self.routes_failed.is_empty()
    }
}

/// Network interception layer for one origin.
pub struct ServiceWorker<N> {
    pub(crate) config: WorkerConfig,
    classifier: RequestClassifier,
    pub(crate) network: Arc<N>,
    pub(crate) storage: Arc<dyn CacheStorage>,
    clients: Arc<dyn ClientRegistry>,
    pub(crate) logger: Arc<dyn Logger>,
    pub(crate) stats: Arc<WorkerStats>,
    state: Mutex<WorkerState>,
    pub(crate) background: Mutex<JoinSet<()>>,
}

impl<N: Network + 'static> ServiceWorker<N> {
    /// Create a worker that logs through `tracing`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::InvalidPattern`] if an API pattern is invalid.
    pub fn new(
        config: WorkerConfig,
        network: Arc<N>,
        storage: Arc<dyn CacheStorage>,
        clients: Arc<dyn ClientRegistry>,
    ) -> Result<Self, WorkerError> {
        let classifier = RequestClassifier::new(&config)?;
        Ok(Self {
            config,
            classifier,
            network,
            storage,
            clients,
            logger: Arc::new(TracingLogger::new("worker")),
            stats: Arc::new(WorkerStats::new()),
            state: Mutex::new(WorkerState::Parsed),
            background: Mutex::new(JoinSet::new()),
        })
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock()
    }

    pub fn stats(&self) -> WorkerStatistics {
        self.stats.snapshot()
    }

    pub fn classifier(&self) -> &RequestClassifier {
        &self.classifier
    }

    /// Pre-populate the current buckets, then skip waiting.
    ///
    /// Never fails; every failure is logged, counted and listed in the
    /// returned report.
    pub async fn install(&self) -> InstallReport {
        *self.state.lock() = WorkerState::Installing;
        let static_bucket = self.config.bucket_name(Bucket::Static);
        let dynamic_bucket = self.config.bucket_name(Bucket::Dynamic);
        let mut report = InstallReport::default();

        match self.add_all(&static_bucket, &self.config.static_assets).await {
            Ok(()) => report.static_batch_cached = true,
            Err(e) => {
                self.stats.record_suppressed_failure();
                log_warn!(self.logger, "Static asset batch not cached: {}", e);
                report.static_batch_error = Some(e.to_string());
            }
        }

        for url in &self.config.optional_assets {
            match self.add(&static_bucket, url).await {
                Ok(()) => report.optional_cached.push(url.clone()),
                Err(e) => {
                    self.stats.record_suppressed_failure();
                    log_debug!(self.logger, "Optional asset {} skipped: {}", url, e);
                    report.optional_failed.push((url.clone(), e.to_string()));
                }
            }
        }

        for url in &self.config.app_routes {
            match self.add(&dynamic_bucket, url).await {
                Ok(()) => report.routes_cached.push(url.clone()),
                Err(e) => {
                    self.stats.record_suppressed_failure();
                    log_warn!(self.logger, "App route {} not cached: {}", url, e);
                    report.routes_failed.push((url.clone(), e.to_string()));
                }
            }
        }

        report.skip_waiting = true;
        *self.state.lock() = WorkerState::Installed;
        info!(
            version = %self.config.version,
            static_batch = report.static_batch_cached,
            optional = report.optional_cached.len(),
            routes = report.routes_cached.len(),
            "Service worker installed"
        );
        report
    }

    /// Drop buckets from older versions and claim open clients.
    ///
    /// Returns the names of the deleted buckets.
    pub async fn activate(&self) -> Vec<String> {
        *self.state.lock() = WorkerState::Activating;
        let current = self.config.current_bucket_names();

        let mut removed = Vec::new();
        for name in self.storage.bucket_names() {
            if !current.contains(&name) && self.storage.delete_bucket(&name) {
                log_info!(self.logger, "Deleted old cache bucket {}", name);
                removed.push(name);
            }
        }

        let claimed = self.clients.claim(&self.config.version);
        *self.state.lock() = WorkerState::Activated;
        info!(
            version = %self.config.version,
            removed = removed.len(),
            claimed,
            "Service worker activated"
        );
        removed
    }

    /// Dispatch one intercepted request.
    pub async fn handle_fetch(&self, request: &Request) -> FetchOutcome {
        if request.method != Method::Get || request.is_extension() {
            self.stats.record_passthrough();
            return FetchOutcome::Passthrough;
        }

        let kind = self.classifier.classify(request);
        let (strategy, bucket) = kind.route();
        let served = match self.run_strategy(strategy, bucket, request).await {
            Ok(served) => served,
            Err(e) => self.recover(request, &e),
        };

        FetchOutcome::Handled {
            kind,
            strategy,
            served,
        }
    }

    /// Wait for background revalidations started so far.
    pub async fn settle(&self) {
        let mut pending = std::mem::take(&mut *self.background.lock());
        while pending.join_next().await.is_some() {}
    }

    fn recover(&self, request: &Request, error: &WorkerError) -> Served {
        if request.wants_document() {
            self.stats.record_offline_fallback();
            log_warn!(self.logger, "Serving offline page for {}: {}", request.url, error);
            Served::new(offline_response(), Source::OfflinePage)
        } else {
            self.stats.record_unavailable();
            log_warn!(self.logger, "Request {} failed: {}", request.url, error);
            Served::new(Response::service_unavailable(), Source::Unavailable)
        }
    }

    /// Fetch every URL, then store all of them or none.
    async fn add_all(&self, bucket: &str, urls: &[String]) -> Result<(), WorkerError> {
        let mut fetched = Vec::with_capacity(urls.len());
        for url in urls {
            fetched.push((url, self.fetch_ok(url).await?));
        }
        for (url, response) in fetched {
            self.storage.put(bucket, url, response);
        }
        Ok(())
    }

    async fn add(&self, bucket: &str, url: &str) -> Result<(), WorkerError> {
        let response = self.fetch_ok(url).await?;
        self.storage.put(bucket, url, response);
        Ok(())
    }

    async fn fetch_ok(&self, url: &str) -> Result<Response, WorkerError> {
        self.stats.record_network_fetch();
        let response = self.network.fetch(&Request::get(url)).await?;
        if response.is_ok() {
            Ok(response)
        } else {
            Err(WorkerError::Install(format!(
                "{} returned status {}",
                url, response.status
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemoryLogger;
    use crate::worker::clients::MemoryClientRegistry;
    use crate::worker::network::InMemoryNetwork;
    use crate::worker::storage::MemoryCacheStorage;

    struct Fixture {
        worker: ServiceWorker<InMemoryNetwork>,
        network: Arc<InMemoryNetwork>,
        storage: Arc<MemoryCacheStorage>,
        clients: Arc<MemoryClientRegistry>,
    }

    fn small_config() -> WorkerConfig {
        WorkerConfig {
            static_assets: vec!["/manifest.json".into(), "/favicon.ico".into()],
            optional_assets: vec!["/icons/a.png".into(), "/icons/b.png".into()],
            app_routes: vec!["/".into(), "/dashboard".into()],
            ..WorkerConfig::default()
        }
    }

    fn fixture(network: InMemoryNetwork) -> Fixture {
        let network = Arc::new(network);
        let storage = Arc::new(MemoryCacheStorage::new());
        let clients = Arc::new(MemoryClientRegistry::new());
        let worker = ServiceWorker::new(
            small_config(),
            Arc::clone(&network),
            storage.clone(),
            clients.clone(),
        )
        .unwrap()
        .with_logger(Arc::new(MemoryLogger::new()));
        Fixture {
            worker,
            network,
            storage,
            clients,
        }
    }

    fn full_network() -> InMemoryNetwork {
        InMemoryNetwork::new()
            .with_route("/manifest.json", Response::ok("{}"))
            .with_route("/favicon.ico", Response::ok("ico"))
            .with_route("/icons/a.png", Response::ok("a"))
            .with_route("/icons/b.png", Response::ok("b"))
            .with_route("/", Response::ok("home"))
            .with_route("/dashboard", Response::ok("dash"))
    }

    #[tokio::test]
    async fn test_install_caches_everything() {
        let f = fixture(full_network());
        let report = f.worker.install().await;

        assert!(report.is_complete());
        assert!(report.skip_waiting);
        assert_eq!(f.worker.state(), WorkerState::Installed);
        assert_eq!(f.storage.len("static-v1.2.0"), 4);
        assert_eq!(f.storage.len("dynamic-v1.2.0"), 2);
    }

    #[tokio::test]
    async fn test_install_batch_is_all_or_nothing() {
        let network = full_network();
        network.route("/favicon.ico", Response::new(500, "boom"));
        let f = fixture(network);

        let report = f.worker.install().await;

        assert!(!report.static_batch_cached);
        assert!(report.static_batch_error.is_some());
        assert!(f.storage.match_in("static-v1.2.0", "/manifest.json").is_none());
        assert_eq!(report.optional_cached.len(), 2);
        assert!(report.skip_waiting);
    }

    #[tokio::test]
    async fn test_install_skips_failed_optional_assets() {
        let network = full_network();
        network.route("/icons/a.png", Response::new(404, ""));
        let f = fixture(network);

        let report = f.worker.install().await;

        assert!(report.static_batch_cached);
        assert_eq!(report.optional_cached, vec!["/icons/b.png".to_string()]);
        assert_eq!(report.optional_failed.len(), 1);
        assert_eq!(f.worker.stats().suppressed_failures, 1);
        assert_eq!(f.worker.state(), WorkerState::Installed);
    }

    #[tokio::test]
    async fn test_install_offline_still_completes() {
        let network = full_network();
        network.set_online(false);
        let f = fixture(network);

        let report = f.worker.install().await;

        assert!(report.skip_waiting);
        assert!(!report.static_batch_cached);
        assert!(report.optional_cached.is_empty());
        assert_eq!(report.routes_failed.len(), 2);
        assert_eq!(f.worker.state(), WorkerState::Installed);
    }

    #[tokio::test]
    async fn test_activate_removes_old_buckets_and_claims() {
        let f = fixture(full_network());
        f.storage.put("static-v1.1.0", "/app.js", Response::ok("old"));
        f.storage.put("api-v1.1.0", "/api/x", Response::ok("old"));
        f.clients.open("tab-1");

        f.worker.install().await;
        let removed = f.worker.activate().await;

        assert_eq!(removed, vec!["api-v1.1.0", "static-v1.1.0"]);
        assert_eq!(f.storage.bucket_names(), vec!["dynamic-v1.2.0", "static-v1.2.0"]);
        assert_eq!(f.clients.controller("tab-1").as_deref(), Some("v1.2.0"));
        assert_eq!(f.worker.state(), WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_non_get_is_passed_through() {
        let f = fixture(full_network());
        let outcome = f
            .worker
            .handle_fetch(&Request::get("/api/empresas").with_method(Method::Post))
            .await;

        assert_eq!(outcome, FetchOutcome::Passthrough);
        assert_eq!(f.network.total_fetches(), 0);
        assert_eq!(f.worker.stats().passthrough, 1);
    }

    #[tokio::test]
    async fn test_extension_request_is_passed_through() {
        let f = fixture(full_network());
        let outcome = f
            .worker
            .handle_fetch(&Request::get("chrome-extension://abc/content.js"))
            .await;
        assert_eq!(outcome, FetchOutcome::Passthrough);
    }

    #[tokio::test]
    async fn test_failed_asset_gets_503() {
        let network = InMemoryNetwork::new();
        network.set_online(false);
        let f = fixture(network);

        let outcome = f.worker.handle_fetch(&Request::get("/app.js")).await;

        assert_eq!(outcome.source(), Some(Source::Unavailable));
        assert_eq!(outcome.response().map(|r| r.status), Some(503));
    }

    #[tokio::test]
    async fn test_failed_navigation_gets_offline_page() {
        let network = InMemoryNetwork::new();
        network.set_online(false);
        let f = fixture(network);

        let outcome = f
            .worker
            .handle_fetch(&Request::navigation("/relatorio.pdf"))
            .await;

        assert_eq!(outcome.source(), Some(Source::OfflinePage));
        assert!(outcome.response().unwrap().text().contains("Você está offline"));
    }
}
