//! The four caching strategies.
//!
//! Each strategy reads from and writes to one named bucket. Only 2xx
//! responses are ever written to storage.

use std::sync::Arc;

use crate::worker::classify::Strategy;
use crate::worker::config::Bucket;
use crate::worker::network::Network;
use crate::worker::offline::offline_response;
use crate::worker::request::{Request, Response};
use crate::worker::worker::{Served, ServiceWorker, Source};
use crate::worker::WorkerError;
use crate::{log_debug, log_warn};

/// Root document served when an app route cannot be fetched.
const ROOT_DOCUMENT: &str = "/";

impl<N: Network + 'static> ServiceWorker<N> {
    pub(crate) async fn run_strategy(
        &self,
        strategy: Strategy,
        bucket: Bucket,
        request: &Request,
    ) -> Result<Served, WorkerError> {
        let bucket = self.config.bucket_name(bucket);
        match strategy {
            Strategy::CacheFirst => self.cache_first(&bucket, request).await,
            Strategy::NetworkFirst => self.network_first(&bucket, request).await,
            Strategy::NetworkFirstWithFallback => {
                self.network_first_with_fallback(&bucket, request).await
            }
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(&bucket, request).await,
        }
    }

    /// Serve from `bucket`; fetch and store only on a miss.
    async fn cache_first(&self, bucket: &str, request: &Request) -> Result<Served, WorkerError> {
        if let Some(cached) = self.storage.match_in(bucket, &request.url) {
            self.stats.record_cache_hit();
            return Ok(Served::new(cached, Source::Cache));
        }
        let response = self.fetch_and_store(bucket, request).await?;
        Ok(Served::new(response, Source::Network))
    }

    /// Prefer the network; on failure serve any cached copy of the request.
    async fn network_first(&self, bucket: &str, request: &Request) -> Result<Served, WorkerError> {
        match self.fetch_and_store(bucket, request).await {
            Ok(response) => Ok(Served::new(response, Source::Network)),
            Err(e) => match self.storage.match_any(&request.url) {
                Some(cached) => {
                    self.stats.record_cache_hit();
                    log_debug!(self.logger, "Serving cached {} after: {}", request.url, e);
                    Ok(Served::new(cached, Source::Cache))
                }
                None => Err(e),
            },
        }
    }

    /// Network first, then cached `/`, then the offline page.
    async fn network_first_with_fallback(
        &self,
        bucket: &str,
        request: &Request,
    ) -> Result<Served, WorkerError> {
        match self.network_first(bucket, request).await {
            Ok(served) => Ok(served),
            Err(e) => {
                self.stats.record_offline_fallback();
                if let Some(root) = self.storage.match_any(ROOT_DOCUMENT) {
                    log_debug!(self.logger, "Serving cached root for {}: {}", request.url, e);
                    Ok(Served::new(root, Source::RootFallback))
                } else {
                    log_warn!(self.logger, "Serving offline page for {}: {}", request.url, e);
                    Ok(Served::new(offline_response(), Source::OfflinePage))
                }
            }
        }
    }

    /// Serve the cached copy now and refresh it in the background.
    async fn stale_while_revalidate(
        &self,
        bucket: &str,
        request: &Request,
    ) -> Result<Served, WorkerError> {
        match self.storage.match_in(bucket, &request.url) {
            Some(cached) => {
                self.stats.record_cache_hit();
                self.spawn_revalidation(bucket.to_string(), request.clone());
                Ok(Served::new(cached, Source::Cache))
            }
            None => {
                let response = self.fetch_and_store(bucket, request).await?;
                Ok(Served::new(response, Source::Network))
            }
        }
    }

    async fn fetch_and_store(&self, bucket: &str, request: &Request) -> Result<Response, WorkerError> {
        self.stats.record_network_fetch();
        let response = self.network.fetch(request).await?;
        if response.is_ok() {
            self.storage.put(bucket, &request.url, response.clone());
        }
        Ok(response)
    }

    fn spawn_revalidation(&self, bucket: String, request: Request) {
        let network = Arc::clone(&self.network);
        let storage = Arc::clone(&self.storage);
        let stats = Arc::clone(&self.stats);
        let logger = Arc::clone(&self.logger);

        let mut background = self.background.lock();
        while background.try_join_next().is_some() {}
        background.spawn(async move {
            stats.record_network_fetch();
            match network.fetch(&request).await {
                Ok(response) if response.is_ok() => {
                    storage.put(&bucket, &request.url, response);
                    stats.record_revalidation();
                }
                Ok(response) => {
                    log_debug!(
                        logger,
                        "Revalidation of {} returned {}; keeping cached copy",
                        request.url,
                        response.status
                    );
                }
                Err(e) => {
                    stats.record_suppressed_failure();
                    log_warn!(logger, "Background revalidation of {} failed: {}", request.url, e);
                }
            }
        });
    }
}
