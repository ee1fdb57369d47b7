//! Read-through access: return the cached value or fetch and store it.

use crate::cache::memory::CacheManager;
use crate::cache::types::CacheOptions;
use serde_json::Value;
use std::future::Future;

impl CacheManager {
    /// Return the cached value for `key`, or await `fetch`, store its result
    /// and return it.
    ///
    /// Fetch errors propagate unchanged and nothing is cached. There is no
    /// retry. If the key is invalidated while `fetch` is running, the result
    /// is still returned but not stored.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use contabil_cache::cache::{CacheManager, CacheManagerConfig, CacheOptions};
    /// use serde_json::json;
    ///
    /// let cache = CacheManager::new(CacheManagerConfig::new("user1")).unwrap();
    /// let value = cache
    ///     .cached_query(
    ///         "user1:empresas:list",
    ///         || async { Ok::<_, std::io::Error>(json!(["ACME"])) },
    ///         CacheOptions::new(),
    ///     )
    ///     .await
    ///     .unwrap();
    /// assert_eq!(value, json!(["ACME"]));
    /// ```
    pub async fn cached_query<F, Fut, E>(
        &self,
        key: &str,
        fetch: F,
        options: CacheOptions,
    ) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        if let Some(cached) = self.get(key) {
            return Ok(cached);
        }

        let ticket = self.begin_fetch(key, &options);
        let value = fetch().await?;
        ticket.complete(value.clone(), &options);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use crate::cache::{CacheManager, CacheManagerConfig, CacheOptions};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::oneshot;

    fn cache() -> CacheManager {
        CacheManager::new(CacheManagerConfig::new("user1")).unwrap()
    }

    #[tokio::test]
    async fn test_second_query_is_served_from_cache() {
        let cache = cache();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = cache
                .cached_query(
                    "user1:empresas:list",
                    || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, String>(json!({"total": 3}))
                    },
                    CacheOptions::new(),
                )
                .await
                .unwrap();
            assert_eq!(value, json!({"total": 3}));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache = cache();

        let result: Result<Value, String> = cache
            .cached_query(
                "user1:empresas:list",
                || async { Err("backend down".to_string()) },
                CacheOptions::new(),
            )
            .await;

        assert_eq!(result.unwrap_err(), "backend down");
        assert_eq!(cache.get("user1:empresas:list"), None);
        assert_eq!(cache.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_result_invalidated_mid_flight_is_returned_but_not_stored() {
        let cache = Arc::new(cache());
        let (started_tx, started_rx) = oneshot::channel::<()>();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let query = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .cached_query(
                        "user1:documentos:recent",
                        || async move {
                            let _ = started_tx.send(());
                            let _ = release_rx.await;
                            Ok::<_, String>(json!("old snapshot"))
                        },
                        CacheOptions::new().with_tag("documentos"),
                    )
                    .await
            })
        };

        started_rx.await.unwrap();
        cache.invalidate_by_tag("documentos");
        release_tx.send(()).unwrap();

        let value = query.await.unwrap().unwrap();
        assert_eq!(value, json!("old snapshot"));
        assert!(!cache.contains("user1:documentos:recent"));
    }
}
