//! Push-based invalidation from backend change events.
//!
//! The backend publishes row changes for three tables. Each change maps to a
//! tag and a key prefix to invalidate; that mapping is the pure function
//! [`invalidation_plan`]. [`RealtimeInvalidator`] runs one task per table,
//! applying plans in delivery order per table. There is no ordering between
//! tables.
//!
//! A dropped feed is logged and counted, after which the affected entries
//! simply live until their TTL.

use crate::cache::memory::CacheManager;
use crate::cache::types::CacheError;
use crate::{log_debug, log_warn};
use futures::stream::{self, BoxStream, StreamExt};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Capacity of the in-process broadcast feed.
const FEED_CAPACITY: usize = 256;

/// Backend tables whose changes invalidate cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Calculations,
    Documents,
    FiscalDeadlines,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Calculations, Table::Documents, Table::FiscalDeadlines];

    /// Backend table name.
    pub fn name(self) -> &'static str {
        match self {
            Table::Calculations => "calculos_fiscais",
            Table::Documents => "documentos",
            Table::FiscalDeadlines => "prazos_fiscais",
        }
    }

    /// Tag carried by cached entries derived from this table.
    pub fn tag(self) -> &'static str {
        match self {
            Table::Calculations => "calculos",
            Table::Documents => "documentos",
            Table::FiscalDeadlines => "prazos",
        }
    }

    /// Resource segment of cache keys derived from this table.
    pub fn key_prefix(self) -> &'static str {
        self.tag()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
}

/// One row change delivered by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: Table,
    pub operation: ChangeOperation,
    pub row_id: Option<String>,
}

impl ChangeEvent {
    pub fn new(table: Table, operation: ChangeOperation, row_id: impl Into<String>) -> Self {
        Self {
            table,
            operation,
            row_id: Some(row_id.into()),
        }
    }
}

/// Tags and key patterns to invalidate for one change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationPlan {
    pub tags: Vec<String>,
    pub patterns: Vec<String>,
}

/// Map a change to the cache entries it makes stale.
///
/// Every operation invalidates the table's tag and every key under
/// `"{user}:{prefix}:"`. The row id does not narrow the plan: list and
/// aggregate entries depend on any row.
pub fn invalidation_plan(event: &ChangeEvent, user_id: &str) -> InvalidationPlan {
    InvalidationPlan {
        tags: vec![event.table.tag().to_string()],
        patterns: vec![format!(
            "^{}:{}:.*",
            regex::escape(user_id),
            regex::escape(event.table.key_prefix())
        )],
    }
}

impl CacheManager {
    /// Apply a plan. Returns the total number of entries removed.
    pub fn apply_invalidation(&self, plan: &InvalidationPlan) -> usize {
        let mut removed = 0;
        for tag in &plan.tags {
            removed += self.invalidate_by_tag(tag);
        }
        for pattern in &plan.patterns {
            match self.invalidate_by_pattern(pattern) {
                Ok(count) => removed += count,
                Err(e) => {
                    self.record_suppressed_failure();
                    log_warn!(self.logger(), "Skipping invalidation pattern: {}", e);
                }
            }
        }
        removed
    }
}

/// Source of change events scoped to one user.
pub trait ChangeSubscriber: Send + Sync {
    /// Subscribe to changes of `table` visible to `user_id`.
    ///
    /// The stream ends when the feed is closed.
    fn subscribe(
        &self,
        table: Table,
        user_id: &str,
    ) -> Result<BoxStream<'static, ChangeEvent>, CacheError>;
}

/// In-process change feed over a tokio broadcast channel.
///
/// # Example
///
/// ```ignore
/// let feed = BroadcastChangeFeed::new();
/// let mut stream = feed.subscribe(Table::Documents, "user1")?;
/// feed.publish("user1", ChangeEvent::new(Table::Documents, ChangeOperation::Insert, "42"));
/// assert!(stream.next().await.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct BroadcastChangeFeed {
    sender: broadcast::Sender<(String, ChangeEvent)>,
}

impl Default for BroadcastChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }

    /// Publish a change for `user_id`. Returns the number of live receivers.
    pub fn publish(&self, user_id: &str, event: ChangeEvent) -> usize {
        self.sender.send((user_id.to_string(), event)).unwrap_or(0)
    }

    /// Number of open subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl ChangeSubscriber for BroadcastChangeFeed {
    fn subscribe(
        &self,
        table: Table,
        user_id: &str,
    ) -> Result<BoxStream<'static, ChangeEvent>, CacheError> {
        let receiver = self.sender.subscribe();
        let user_id = user_id.to_string();

        let events = stream::unfold(receiver, move |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(item) => return Some((item, receiver)),
                    // Lagged receivers skip ahead; the missed changes are
                    // covered by TTL.
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
        .filter_map(move |(owner, event)| {
            let keep = owner == user_id && event.table == table;
            async move { keep.then_some(event) }
        });

        Ok(events.boxed())
    }
}

/// Background daemon applying change events to a cache.
pub struct RealtimeInvalidator {
    cache: Arc<CacheManager>,
    subscriber: Arc<dyn ChangeSubscriber>,
}

impl RealtimeInvalidator {
    pub fn new(cache: Arc<CacheManager>, subscriber: Arc<dyn ChangeSubscriber>) -> Self {
        Self { cache, subscriber }
    }

    /// Subscribe to every table and spawn one task per subscription.
    ///
    /// Tasks run until `shutdown` is cancelled or their stream ends.
    ///
    /// # Errors
    ///
    /// Returns the first subscription error. Tasks already spawned for
    /// earlier tables are cancelled through `shutdown` by the caller.
    pub fn start(self, shutdown: CancellationToken) -> Result<Vec<JoinHandle<()>>, CacheError> {
        let user_id = self.cache.user_id().to_string();
        let mut handles = Vec::with_capacity(Table::ALL.len());

        for table in Table::ALL {
            let stream = self.subscriber.subscribe(table, &user_id)?;
            let cache = Arc::clone(&self.cache);
            let token = shutdown.clone();
            handles.push(tokio::spawn(run_channel(cache, table, stream, token)));
        }

        tracing::info!(user = %user_id, channels = handles.len(), "Realtime invalidation started");
        Ok(handles)
    }
}

async fn run_channel(
    cache: Arc<CacheManager>,
    table: Table,
    mut stream: BoxStream<'static, ChangeEvent>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                log_debug!(cache.logger(), "Realtime channel '{}' stopped", table);
                break;
            }
            next = stream.next() => {
                match next {
                    Some(event) => {
                        let plan = invalidation_plan(&event, cache.user_id());
                        let removed = cache.apply_invalidation(&plan);
                        log_debug!(
                            cache.logger(),
                            "{:?} on '{}' invalidated {} entries",
                            event.operation,
                            table,
                            removed
                        );
                    }
                    None => {
                        cache.record_suppressed_failure();
                        log_warn!(
                            cache.logger(),
                            "Realtime channel '{}' closed; cached data may go stale until TTL",
                            table
                        );
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{cache_key, CacheManagerConfig, CacheOptions};
    use serde_json::json;
    use std::time::Duration;

    fn event(table: Table) -> ChangeEvent {
        ChangeEvent::new(table, ChangeOperation::Update, "row-1")
    }

    #[test]
    fn test_plan_for_each_table() {
        let plan = invalidation_plan(&event(Table::Calculations), "u1");
        assert_eq!(plan.tags, vec!["calculos"]);
        assert_eq!(plan.patterns, vec!["^u1:calculos:.*"]);

        let plan = invalidation_plan(&event(Table::Documents), "u1");
        assert_eq!(plan.tags, vec!["documentos"]);

        let plan = invalidation_plan(&event(Table::FiscalDeadlines), "u1");
        assert_eq!(plan.patterns, vec!["^u1:prazos:.*"]);
    }

    #[test]
    fn test_plan_ignores_operation_and_row() {
        let insert = ChangeEvent::new(Table::Documents, ChangeOperation::Insert, "a");
        let delete = ChangeEvent {
            table: Table::Documents,
            operation: ChangeOperation::Delete,
            row_id: None,
        };
        assert_eq!(invalidation_plan(&insert, "u1"), invalidation_plan(&delete, "u1"));
    }

    #[test]
    fn test_plan_escapes_user_id() {
        let plan = invalidation_plan(&event(Table::Documents), "a.b+c");
        assert_eq!(plan.patterns, vec![r"^a\.b\+c:documentos:.*"]);
    }

    #[test]
    fn test_apply_invalidation_removes_tagged_and_prefixed_entries() {
        let cache = CacheManager::new(CacheManagerConfig::new("u1")).unwrap();
        cache.set(cache_key("u1", "documentos", "1"), json!(1), CacheOptions::new());
        cache.set("u1:dashboard", json!(2), CacheOptions::new().with_tag("documentos"));
        cache.set(cache_key("u1", "calculos", "1"), json!(3), CacheOptions::new());

        let removed = cache.apply_invalidation(&invalidation_plan(&event(Table::Documents), "u1"));

        assert_eq!(removed, 2);
        assert!(cache.contains("u1:calculos:1"));
    }

    #[tokio::test]
    async fn test_broadcast_feed_filters_by_user_and_table() {
        let feed = BroadcastChangeFeed::new();
        let mut stream = feed.subscribe(Table::Documents, "u1").unwrap();

        feed.publish("u2", event(Table::Documents));
        feed.publish("u1", event(Table::Calculations));
        feed.publish("u1", event(Table::Documents));

        let received = stream.next().await.unwrap();
        assert_eq!(received, event(Table::Documents));
    }

    #[tokio::test]
    async fn test_invalidator_applies_events_until_shutdown() {
        let cache = Arc::new(CacheManager::new(CacheManagerConfig::new("u1")).unwrap());
        let feed = Arc::new(BroadcastChangeFeed::new());
        let shutdown = CancellationToken::new();

        let handles = RealtimeInvalidator::new(Arc::clone(&cache), feed.clone())
            .start(shutdown.clone())
            .unwrap();
        assert_eq!(handles.len(), 3);
        assert_eq!(feed.subscriber_count(), 3);

        cache.set(cache_key("u1", "prazos", "das"), json!("vence 20/10"), CacheOptions::new());
        feed.publish("u1", event(Table::FiscalDeadlines));

        tokio::time::timeout(Duration::from_secs(2), async {
            while cache.contains("u1:prazos:das") {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        shutdown.cancel();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(cache.stats().suppressed_failures, 0);
    }

    #[tokio::test]
    async fn test_closed_feed_is_counted_as_suppressed_failure() {
        let cache = Arc::new(CacheManager::new(CacheManagerConfig::new("u1")).unwrap());
        let feed = BroadcastChangeFeed::new();
        let handles = RealtimeInvalidator::new(Arc::clone(&cache), Arc::new(feed.clone()))
            .start(CancellationToken::new())
            .unwrap();

        drop(feed);
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.stats().suppressed_failures, 3);
    }
}
