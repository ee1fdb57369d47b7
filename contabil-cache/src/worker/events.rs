//! Background sync, push and notification hooks.
//!
//! These do no caching work; they log and hand back what the platform
//! needs to finish the event.

use serde::{Deserialize, Serialize};

use crate::worker::network::Network;
use crate::worker::worker::ServiceWorker;
use crate::{log_debug, log_info};

/// Tag used by the pending-writes sync registration.
pub const OFFLINE_WRITES_SYNC_TAG: &str = "offline-writes";

fn default_title() -> String {
    "ContabilidadePRO".to_string()
}

fn default_body() -> String {
    "Você tem uma nova notificação".to_string()
}

fn default_url() -> String {
    "/".to_string()
}

/// Notification shown for a push message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_body")]
    pub body: String,
    /// Page opened when the notification is clicked
    #[serde(default = "default_url")]
    pub url: String,
}

impl Default for Notification {
    fn default() -> Self {
        Self {
            title: default_title(),
            body: default_body(),
            url: default_url(),
        }
    }
}

impl<N: Network + 'static> ServiceWorker<N> {
    /// Acknowledge a background sync. Returns whether the tag is known.
    pub async fn on_sync(&self, tag: &str) -> bool {
        let known = tag == OFFLINE_WRITES_SYNC_TAG;
        if known {
            log_info!(self.logger, "Background sync '{}' acknowledged", tag);
        } else {
            log_debug!(self.logger, "Ignoring unknown sync tag '{}'", tag);
        }
        known
    }

    /// Build the notification for a push payload.
    ///
    /// A missing or unparsable payload yields the default notification.
    pub fn on_push(&self, payload: Option<&[u8]>) -> Notification {
        let notification = match payload {
            Some(bytes) => match serde_json::from_slice::<Notification>(bytes) {
                Ok(notification) => notification,
                Err(e) => {
                    log_debug!(self.logger, "Push payload is not a notification: {}", e);
                    Notification::default()
                }
            },
            None => Notification::default(),
        };
        log_info!(self.logger, "Push received: {}", notification.title);
        notification
    }

    /// URL to focus or open for a clicked notification.
    pub fn on_notification_click(&self, notification: &Notification) -> String {
        let url = if notification.url.trim().is_empty() {
            default_url()
        } else {
            notification.url.clone()
        };
        log_debug!(self.logger, "Notification click opens {}", url);
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::NoOpLogger;
    use crate::worker::clients::MemoryClientRegistry;
    use crate::worker::config::WorkerConfig;
    use crate::worker::network::InMemoryNetwork;
    use crate::worker::storage::MemoryCacheStorage;
    use std::sync::Arc;

    fn worker() -> ServiceWorker<InMemoryNetwork> {
        ServiceWorker::new(
            WorkerConfig::default(),
            Arc::new(InMemoryNetwork::new()),
            Arc::new(MemoryCacheStorage::new()),
            Arc::new(MemoryClientRegistry::new()),
        )
        .unwrap()
        .with_logger(Arc::new(NoOpLogger))
    }

    #[tokio::test]
    async fn test_sync_acknowledges_known_tag() {
        let worker = worker();
        assert!(worker.on_sync(OFFLINE_WRITES_SYNC_TAG).await);
        assert!(!worker.on_sync("something-else").await);
    }

    #[test]
    fn test_push_parses_payload() {
        let payload = r#"{"title":"Prazo DAS","body":"Vence amanhã","url":"/prazos"}"#.as_bytes();
        let notification = worker().on_push(Some(payload));

        assert_eq!(notification.title, "Prazo DAS");
        assert_eq!(notification.body, "Vence amanhã");
        assert_eq!(notification.url, "/prazos");
    }

    #[test]
    fn test_push_fills_missing_fields() {
        let notification = worker().on_push(Some(&br#"{"body":"Novo documento"}"#[..]));

        assert_eq!(notification.title, "ContabilidadePRO");
        assert_eq!(notification.body, "Novo documento");
        assert_eq!(notification.url, "/");
    }

    #[test]
    fn test_push_without_payload_or_bad_json() {
        let worker = worker();
        assert_eq!(worker.on_push(None), Notification::default());
        assert_eq!(worker.on_push(Some(&b"not json"[..])), Notification::default());
    }

    #[test]
    fn test_notification_click_url() {
        let worker = worker();
        let notification = Notification {
            url: "/documentos/42".to_string(),
            ..Notification::default()
        };
        assert_eq!(worker.on_notification_click(&notification), "/documentos/42");

        let blank = Notification {
            url: " ".to_string(),
            ..Notification::default()
        };
        assert_eq!(worker.on_notification_click(&blank), "/");
    }
}
