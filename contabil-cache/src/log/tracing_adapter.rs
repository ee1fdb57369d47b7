//! Adapter from [`Logger`] to the `tracing` crate.

use crate::log::{LogLevel, Logger};
use std::fmt::Arguments;

/// Forwards messages to `tracing`, tagged with the emitting component.
///
/// The subscriber is installed separately (see [`crate::logging`]).
#[derive(Debug, Clone, Copy)]
pub struct TracingLogger {
    component: &'static str,
}

impl TracingLogger {
    /// Create an adapter that tags events with `component`.
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    /// Component name attached to every event.
    pub fn component(&self) -> &'static str {
        self.component
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new("cache")
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        let component = self.component;
        match level {
            LogLevel::Trace => tracing::trace!(component, "{}", args),
            LogLevel::Debug => tracing::debug!(component, "{}", args),
            LogLevel::Info => tracing::info!(component, "{}", args),
            LogLevel::Warn => tracing::warn!(component, "{}", args),
            LogLevel::Error => tracing::error!(component, "{}", args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_component_is_cache() {
        assert_eq!(TracingLogger::default().component(), "cache");
    }

    #[test]
    fn logs_without_subscriber() {
        let logger = TracingLogger::new("worker");
        logger.warn(format_args!("no subscriber installed"));
        assert_eq!(logger.component(), "worker");
    }
}
