//! Open pages controlled by the worker.

use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Pages that a newly activated worker takes control of.
pub trait ClientRegistry: Send + Sync {
    /// Take control of every open client under `worker_version`.
    /// Returns how many clients changed controller.
    fn claim(&self, worker_version: &str) -> usize;
}

/// In-process [`ClientRegistry`] keyed by client id.
#[derive(Debug, Default)]
pub struct MemoryClientRegistry {
    clients: Mutex<BTreeMap<String, Option<String>>>,
}

impl MemoryClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an open client with no controller.
    pub fn open(&self, id: impl Into<String>) {
        self.clients.lock().insert(id.into(), None);
    }

    pub fn close(&self, id: &str) {
        self.clients.lock().remove(id);
    }

    /// Worker version controlling `id`, if any.
    pub fn controller(&self, id: &str) -> Option<String> {
        self.clients.lock().get(id).cloned().flatten()
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }
}

impl ClientRegistry for MemoryClientRegistry {
    fn claim(&self, worker_version: &str) -> usize {
        let mut clients = self.clients.lock();
        let mut changed = 0;
        for controller in clients.values_mut() {
            if controller.as_deref() != Some(worker_version) {
                *controller = Some(worker_version.to_string());
                changed += 1;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_takes_every_client() {
        let registry = MemoryClientRegistry::new();
        registry.open("tab-1");
        registry.open("tab-2");

        assert_eq!(registry.claim("v1.2.0"), 2);
        assert_eq!(registry.controller("tab-1").as_deref(), Some("v1.2.0"));
        assert_eq!(registry.claim("v1.2.0"), 0);
    }

    #[test]
    fn test_claim_after_upgrade() {
        let registry = MemoryClientRegistry::new();
        registry.open("tab-1");
        registry.claim("v1.1.0");
        registry.open("tab-2");

        assert_eq!(registry.claim("v1.2.0"), 2);
        registry.close("tab-1");
        assert_eq!(registry.len(), 1);
    }
}
