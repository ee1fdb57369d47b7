//! Network seam used by the caching strategies.

use crate::worker::request::{Request, Response};
use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use thiserror::Error;

/// Failure to obtain any response from the network.
///
/// An HTTP error status is a response, not a `NetworkError`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Network unreachable: {0}")]
    Unreachable(String),

    #[error("Network request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Other(String),
}

/// Fetches requests from the origin.
pub trait Network: Send + Sync {
    fn fetch(&self, request: &Request)
        -> impl Future<Output = Result<Response, NetworkError>> + Send;
}

/// Scripted in-process network.
///
/// Serves registered routes by exact URL and answers 404 otherwise. While
/// offline every fetch fails with [`NetworkError::Unreachable`].
#[derive(Debug)]
pub struct InMemoryNetwork {
    routes: DashMap<String, Response>,
    online: AtomicBool,
    fetches: DashMap<String, usize>,
    total: AtomicUsize,
}

impl Default for InMemoryNetwork {
    fn default() -> Self {
        Self {
            routes: DashMap::new(),
            online: AtomicBool::new(true),
            fetches: DashMap::new(),
            total: AtomicUsize::new(0),
        }
    }
}

impl InMemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for `url`, replacing any previous route.
    pub fn route(&self, url: impl Into<String>, response: Response) {
        self.routes.insert(url.into(), response);
    }

    pub fn with_route(self, url: impl Into<String>, response: Response) -> Self {
        self.route(url, response);
        self
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Fetches attempted for `url`, including failed ones.
    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches.get(url).map(|c| *c).unwrap_or(0)
    }

    /// Fetches attempted for any URL.
    pub fn total_fetches(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

impl Network for InMemoryNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        *self.fetches.entry(request.url.clone()).or_insert(0) += 1;
        self.total.fetch_add(1, Ordering::SeqCst);

        if !self.is_online() {
            return Err(NetworkError::Unreachable(request.url.clone()));
        }

        Ok(self
            .routes
            .get(&request.url)
            .map(|r| r.clone())
            .unwrap_or_else(|| Response::new(404, "Not Found")))
    }
}
