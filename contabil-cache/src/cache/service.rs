//! Cache service lifecycle management.
//!
//! `CacheService` owns a [`CacheManager`] together with its realtime
//! invalidation tasks, so application code gets one handle to start, use
//! and shut down the reactive cache.
//!
//! # Usage
//!
//! ```ignore
//! use contabil_cache::cache::{BroadcastChangeFeed, CacheManagerConfig, CacheService};
//! use std::sync::Arc;
//!
//! let feed = Arc::new(BroadcastChangeFeed::new());
//! let service = CacheService::start(CacheManagerConfig::new("user1"), feed).await?;
//!
//! let empresas = service
//!     .cache()
//!     .cached_query("user1:empresas:list", || backend.list_empresas(), Default::default())
//!     .await?;
//!
//! service.shutdown().await;
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cache::config::CacheManagerConfig;
use crate::cache::memory::CacheManager;
use crate::cache::preload::{default_preload_patterns, PreloadReport};
use crate::cache::realtime::{ChangeSubscriber, RealtimeInvalidator};
use crate::cache::types::CacheError;
use crate::clock::{Clock, SystemClock};
use crate::log::{Logger, TracingLogger};
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;

/// A running reactive cache.
///
/// Should be shut down with [`CacheService::shutdown`] so the realtime tasks
/// stop before the cache is dropped.
pub struct CacheService {
    cache: Arc<CacheManager>,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl CacheService {
    /// Start a cache with the system clock and `tracing` logging, subscribed
    /// to `subscriber` for invalidation.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or a subscription cannot be
    /// opened.
    pub async fn start(
        config: CacheManagerConfig,
        subscriber: Arc<dyn ChangeSubscriber>,
    ) -> Result<Self, CacheError> {
        Self::start_with(
            config,
            subscriber,
            Arc::new(SystemClock),
            Arc::new(TracingLogger::new("cache")),
        )
        .await
    }

    /// Start with an explicit clock and logger.
    pub async fn start_with(
        config: CacheManagerConfig,
        subscriber: Arc<dyn ChangeSubscriber>,
        clock: Arc<dyn Clock>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self, CacheError> {
        let max_entries = config.max_entries;
        let cache = Arc::new(CacheManager::with_parts(config, clock, logger)?);
        let shutdown = CancellationToken::new();

        let tasks = match RealtimeInvalidator::new(Arc::clone(&cache), subscriber)
            .start(shutdown.clone())
        {
            Ok(tasks) => tasks,
            Err(e) => {
                shutdown.cancel();
                return Err(e);
            }
        };

        info!(
            user = %cache.user_id(),
            max_entries,
            "Application cache service started"
        );

        Ok(Self {
            cache,
            shutdown,
            tasks,
        })
    }

    /// Shared handle to the cache.
    pub fn cache(&self) -> Arc<CacheManager> {
        Arc::clone(&self.cache)
    }

    /// Preload the default patterns for the cache's user.
    pub async fn preload_defaults<F, Fut, E>(&self, fetcher: F) -> PreloadReport
    where
        F: Fn(&str) -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: Display,
    {
        let patterns = default_preload_patterns(self.cache.user_id());
        self.cache.predictive_preload(&patterns, fetcher).await
    }

    /// Number of realtime tasks still running.
    pub fn active_channels(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    /// Stop realtime invalidation and wait for the tasks to exit.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Realtime task ended abnormally");
            }
        }
        info!(user = %self.cache.user_id(), "Application cache service shutdown");
    }
}
