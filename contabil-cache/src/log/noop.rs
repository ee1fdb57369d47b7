//! Logger that discards everything.

use crate::log::{LogLevel, Logger};
use std::fmt::Arguments;

/// Discards all messages. Default logger for caches built without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    #[inline]
    fn log(&self, _level: LogLevel, _args: Arguments<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn noop_logger_accepts_every_level() {
        let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
        logger.trace(format_args!("t"));
        logger.info(format_args!("i"));
        logger.error(format_args!("e"));
    }
}
