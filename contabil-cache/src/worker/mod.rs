//! Network interception layer.
//!
//! A service-worker style request interceptor: every GET request is
//! classified, routed to a caching strategy and answered from, or stored
//! into, one of three versioned Cache Storage buckets.
//!
//! | Kind         | Strategy                    | Bucket    |
//! |--------------|-----------------------------|-----------|
//! | static asset | cache first                 | `static`  |
//! | api          | stale while revalidate      | `api`     |
//! | app route    | network first with fallback | `dynamic` |
//! | other        | network first               | `dynamic` |
//!
//! The lifecycle is `install` (pre-cache, then skip waiting), `activate`
//! (drop old buckets, claim clients) and `handle_fetch` for each request.
//! Strategies never raise on the caller's behalf: an unrecoverable failure
//! becomes the offline page for documents and a bare 503 otherwise.

mod classify;
mod clients;
mod config;
mod events;
mod network;
mod offline;
mod request;
mod stats;
mod storage;
mod strategy;
#[allow(clippy::module_inception)]
mod worker;

use thiserror::Error;

pub use classify::{RequestClassifier, RequestKind, Strategy};
pub use clients::{ClientRegistry, MemoryClientRegistry};
pub use config::{Bucket, WorkerConfig, DEFAULT_CACHE_VERSION, STATIC_EXTENSIONS};
pub use events::{Notification, OFFLINE_WRITES_SYNC_TAG};
pub use network::{InMemoryNetwork, Network, NetworkError};
pub use offline::{offline_response, OFFLINE_PAGE};
pub use request::{Method, Request, Response, UnknownMethod};
pub use stats::{WorkerStatistics, WorkerStats};
pub use storage::{CacheStorage, MemoryCacheStorage};
pub use worker::{FetchOutcome, InstallReport, Served, ServiceWorker, Source, WorkerState};

/// Errors raised inside a strategy before fallback handling.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Install failed: {0}")]
    Install(String),

    #[error("Invalid API pattern: {0}")]
    InvalidPattern(String),
}
