//! Logging seam for background cache work.
//!
//! Cache internals that swallow failures on purpose (predictive preload,
//! background revalidation, best-effort installs, closed change feeds)
//! report them through a [`Logger`] instead of dropping them. Components take
//! an `Arc<dyn Logger>` so production code can route to `tracing` while tests
//! capture messages with [`MemoryLogger`].
//!
//! ```
//! use contabil_cache::log::{Logger, MemoryLogger, LogLevel};
//! use contabil_cache::log_warn;
//! use std::sync::Arc;
//!
//! let logger = Arc::new(MemoryLogger::new());
//! log_warn!(logger, "preload failed for {}", "user1:dashboard");
//! assert_eq!(logger.count_at(LogLevel::Warn), 1);
//! ```

mod memory;
mod noop;
mod tracing_adapter;
mod r#trait;

pub use memory::MemoryLogger;
pub use noop::NoOpLogger;
pub use r#trait::{LogLevel, Logger};
pub use tracing_adapter::TracingLogger;
