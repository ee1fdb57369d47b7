//! Application cache manager.
//!
//! An in-process store of JSON values with priority-based TTL, tag and
//! pattern invalidation, and priority-weighted eviction, plus the reactive
//! pieces around it: read-through queries, predictive preload, and
//! invalidation driven by backend change events.

mod config;
mod entry;
mod memory;
mod preload;
mod query;
mod realtime;
mod service;
mod stats;
mod types;

pub use config::{CacheManagerConfig, DEFAULT_MAX_ENTRIES};
pub use memory::CacheManager;
pub use preload::{default_preload_patterns, PreloadReport};
pub use realtime::{
    invalidation_plan, BroadcastChangeFeed, ChangeEvent, ChangeOperation, ChangeSubscriber,
    InvalidationPlan, RealtimeInvalidator, Table,
};
pub use service::CacheService;
pub use stats::{CacheStatistics, CacheStats};
pub use types::{
    cache_key, user_tag, CacheError, CacheOptions, Priority, TtlTable, AUTO_TAG, PREDICTIVE_TAG,
};
