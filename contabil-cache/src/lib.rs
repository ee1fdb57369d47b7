//! ContabilidadePRO cache layer
//!
//! Two independent layers sit between the application and the backend:
//!
//! - [`cache`]: an in-memory application cache of JSON values with
//!   priority-based TTL, tag and pattern invalidation, priority-weighted
//!   eviction and push-based invalidation from backend change feeds.
//! - [`worker`]: a service-worker style network interception layer that
//!   classifies requests and answers them from versioned Cache Storage
//!   buckets using one of four strategies.
//!
//! # High-Level API
//!
//! ```ignore
//! use contabil_cache::cache::{BroadcastChangeFeed, CacheManagerConfig, CacheService};
//! use std::sync::Arc;
//!
//! let feed = Arc::new(BroadcastChangeFeed::new());
//! let service = CacheService::start(CacheManagerConfig::new("user-42"), feed).await?;
//! let dashboard = service
//!     .cache()
//!     .cached_query("user-42:dashboard", || backend.dashboard(), Default::default())
//!     .await?;
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod log;
pub mod logging;
pub mod worker;

/// Version of the library and CLI.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
