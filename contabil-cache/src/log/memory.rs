//! Logger that keeps messages in memory.

use crate::log::{LogLevel, Logger};
use parking_lot::Mutex;
use std::fmt::Arguments;

/// Records every message with its level.
///
/// Tests use it to assert that suppressed background failures were reported.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded messages in emission order.
    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records.lock().clone()
    }

    /// Number of messages recorded at exactly `level`.
    pub fn count_at(&self, level: LogLevel) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .count()
    }

    /// Whether any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.records.lock().iter().any(|(_, m)| m.contains(needle))
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        self.records.lock().push((level, args.to_string()));
    }
}
