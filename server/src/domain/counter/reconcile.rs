//! Reconcile sweep
//!
//! Periodically flushes every cached like counter into the durable store.
//! This is the write-back half of the counter design: increments land in
//! the cache only, and durability is "eventually reconciled". If an entry
//! is evicted before a sweep flushes it, those increments are lost - an
//! accepted, bounded trade-off, not an oversight.
//!
//! Per-key failures (malformed key, read failure, store-write failure) are
//! logged and skipped; one bad key never aborts the sweep for the rest.
//! Flushed entries are neither deleted nor TTL-refreshed: the cache stays
//! the most current source for reads until natural expiry.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use super::CounterError;
use crate::data::cache::{CacheKey, CacheService, LIKE_COUNT_PREFIX};
use crate::data::store::ItemStore;

/// Outcome counts for one sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    /// Counters written to the durable store
    pub flushed: u64,
    /// Keys passed over (malformed, expired mid-sweep, item deleted, or errored)
    pub skipped: u64,
}

/// Background reconciliation of cached counters into the durable store
pub struct Reconciler {
    cache: Arc<CacheService>,
    store: Arc<dyn ItemStore>,
}

impl Reconciler {
    pub fn new(cache: Arc<CacheService>, store: Arc<dyn ItemStore>) -> Self {
        Self { cache, store }
    }

    /// Run a single sweep over every cached counter key
    ///
    /// Sweeps are idempotent: flushing the same value twice leaves the
    /// store unchanged. A sweep may observe a value mid-update; the next
    /// sweep picks up whatever it missed.
    pub async fn sweep_once(&self) -> SweepStats {
        let keys = match self.cache.scan_keys(LIKE_COUNT_PREFIX).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(error = %e, "Reconcile sweep could not list cache keys");
                return SweepStats::default();
            }
        };

        let mut stats = SweepStats::default();
        for key in keys {
            match self.flush_key(&key).await {
                Ok(true) => stats.flushed += 1,
                Ok(false) => stats.skipped += 1,
                Err(e) => {
                    stats.skipped += 1;
                    tracing::warn!(key = %key, error = %e, "Failed to flush cached counter, skipping");
                }
            }
        }

        if stats.flushed > 0 || stats.skipped > 0 {
            tracing::debug!(
                flushed = stats.flushed,
                skipped = stats.skipped,
                "Reconcile sweep complete"
            );
        }

        stats
    }

    /// Flush one cached counter; `Ok(false)` means skipped without error
    async fn flush_key(&self, key: &str) -> Result<bool, CounterError> {
        let Some(item_id) = CacheKey::parse_like_count(key) else {
            tracing::warn!(key = %key, "Malformed counter key in cache, skipping");
            return Ok(false);
        };

        // Entry may have expired between the scan and this read
        let Some(value) = self.cache.get_count(key).await? else {
            return Ok(false);
        };

        let updated = self.store.set_like_count(item_id, value).await?;
        if !updated {
            tracing::debug!(item_id, "Item no longer in store, skipping counter flush");
            return Ok(false);
        }

        Ok(true)
    }

    /// Start the periodic sweep task; `interval_secs == 0` disables it
    pub fn start_task(
        self: &Arc<Self>,
        interval_secs: u64,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Option<JoinHandle<()>> {
        if interval_secs == 0 {
            tracing::debug!("Reconcile sweep disabled by config");
            return None;
        }

        let reconciler = Arc::clone(self);
        let interval = Duration::from_secs(interval_secs);

        Some(tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.tick().await; // Skip immediate first tick

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("Reconcile task shutting down");
                            break;
                        }
                    }
                    _ = timer.tick() => {
                        reconciler.sweep_once().await;
                    }
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use async_trait::async_trait;

    use crate::core::config::CounterConfig;
    use crate::data::store::{Item, ItemUpdate, NewItem, SqliteStore, StoreError};
    use crate::domain::counter::CounterService;
    use crate::domain::counter::tests::{test_cache, test_store};

    /// Store wrapper that fails counter writes for chosen ids
    struct FailingStore {
        inner: Arc<SqliteStore>,
        fail_ids: HashSet<i64>,
    }

    #[async_trait]
    impl ItemStore for FailingStore {
        async fn create(&self, new: NewItem) -> Result<Item, StoreError> {
            self.inner.create(new).await
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<Item>, StoreError> {
            self.inner.find_by_id(id).await
        }

        async fn list(&self) -> Result<Vec<Item>, StoreError> {
            self.inner.list().await
        }

        async fn update(&self, id: i64, update: ItemUpdate) -> Result<Option<Item>, StoreError> {
            self.inner.update(id, update).await
        }

        async fn delete(&self, id: i64) -> Result<bool, StoreError> {
            self.inner.delete(id).await
        }

        async fn set_like_count(&self, id: i64, like_count: i64) -> Result<bool, StoreError> {
            if self.fail_ids.contains(&id) {
                return Err(StoreError::Schema("injected write failure".to_string()));
            }
            self.inner.set_like_count(id, like_count).await
        }
    }

    async fn item_with_likes(store: &SqliteStore, name: &str, likes: i64) -> i64 {
        let item = store
            .create(NewItem {
                name: name.to_string(),
                image_url: None,
            })
            .await
            .unwrap();
        store.set_like_count(item.id, likes).await.unwrap();
        item.id
    }

    #[tokio::test]
    async fn test_sweep_flushes_cached_counters() {
        let cache = test_cache().await;
        let store = test_store().await;
        let id = item_with_likes(&store, "a", 5).await;

        let service = CounterService::new(cache.clone(), store.clone(), CounterConfig::default());
        assert_eq!(service.increment(id).await.unwrap(), 6);
        assert_eq!(service.increment(id).await.unwrap(), 7);

        let reconciler = Reconciler::new(cache.clone(), store.clone());
        let stats = reconciler.sweep_once().await;
        assert_eq!(stats, SweepStats { flushed: 1, skipped: 0 });

        assert_eq!(store.find_by_id(id).await.unwrap().unwrap().like_count, 7);

        // The cache entry survives the flush and still serves reads
        assert_eq!(service.read(id).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_sweep_idempotent() {
        let cache = test_cache().await;
        let store = test_store().await;
        let id = item_with_likes(&store, "a", 3).await;

        let service = CounterService::new(cache.clone(), store.clone(), CounterConfig::default());
        service.increment(id).await.unwrap();

        let reconciler = Reconciler::new(cache.clone(), store.clone());
        reconciler.sweep_once().await;
        let after_first = store.find_by_id(id).await.unwrap().unwrap().like_count;

        // No intervening increments: the second sweep changes nothing
        reconciler.sweep_once().await;
        let after_second = store.find_by_id(id).await.unwrap().unwrap().like_count;

        assert_eq!(after_first, 4);
        assert_eq!(after_second, after_first);
    }

    #[tokio::test]
    async fn test_sweep_skips_malformed_keys() {
        let cache = test_cache().await;
        let store = test_store().await;
        let id = item_with_likes(&store, "a", 0).await;

        cache
            .set_count(&CacheKey::like_count(id), 9, Duration::from_secs(60))
            .await
            .unwrap();
        // A key inside the namespace whose id does not parse
        cache
            .set_count("item:like:not-an-id", 1, Duration::from_secs(60))
            .await
            .unwrap();

        let reconciler = Reconciler::new(cache, store.clone());
        let stats = reconciler.sweep_once().await;

        assert_eq!(stats, SweepStats { flushed: 1, skipped: 1 });
        assert_eq!(store.find_by_id(id).await.unwrap().unwrap().like_count, 9);
    }

    #[tokio::test]
    async fn test_sweep_fault_isolation() {
        let cache = test_cache().await;
        let sqlite = test_store().await;
        let id_a = item_with_likes(&sqlite, "a", 0).await;
        let id_b = item_with_likes(&sqlite, "b", 0).await;
        let id_c = item_with_likes(&sqlite, "c", 0).await;

        for (id, count) in [(id_a, 10), (id_b, 20), (id_c, 30)] {
            cache
                .set_count(&CacheKey::like_count(id), count, Duration::from_secs(60))
                .await
                .unwrap();
        }

        let store: Arc<dyn ItemStore> = Arc::new(FailingStore {
            inner: sqlite.clone(),
            fail_ids: HashSet::from([id_b]),
        });

        let reconciler = Reconciler::new(cache, store);
        let stats = reconciler.sweep_once().await;

        // B's write failure must not prevent flushing A and C
        assert_eq!(stats, SweepStats { flushed: 2, skipped: 1 });
        assert_eq!(sqlite.find_by_id(id_a).await.unwrap().unwrap().like_count, 10);
        assert_eq!(sqlite.find_by_id(id_b).await.unwrap().unwrap().like_count, 0);
        assert_eq!(sqlite.find_by_id(id_c).await.unwrap().unwrap().like_count, 30);
    }

    #[tokio::test]
    async fn test_sweep_skips_deleted_items() {
        let cache = test_cache().await;
        let store = test_store().await;
        let id = item_with_likes(&store, "a", 0).await;

        cache
            .set_count(&CacheKey::like_count(id), 4, Duration::from_secs(60))
            .await
            .unwrap();
        store.delete(id).await.unwrap();

        let reconciler = Reconciler::new(cache, store);
        let stats = reconciler.sweep_once().await;
        assert_eq!(stats, SweepStats { flushed: 0, skipped: 1 });
    }

    #[tokio::test]
    async fn test_sweep_empty_cache() {
        let cache = test_cache().await;
        let store = test_store().await;

        let reconciler = Reconciler::new(cache, store);
        let stats = reconciler.sweep_once().await;
        assert_eq!(stats, SweepStats::default());
    }

    #[tokio::test]
    async fn test_periodic_task_sweeps() {
        let cache = test_cache().await;
        let store = test_store().await;
        let id = item_with_likes(&store, "a", 0).await;

        cache
            .set_count(&CacheKey::like_count(id), 8, Duration::from_secs(60))
            .await
            .unwrap();

        let reconciler = Arc::new(Reconciler::new(cache, store.clone()));
        let (tx, rx) = tokio::sync::watch::channel(false);

        let handle = reconciler.start_task(1, rx).unwrap();

        // First scheduled tick fires after one interval
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(store.find_by_id(id).await.unwrap().unwrap().like_count, 8);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_task_disabled_with_zero_interval() {
        let cache = test_cache().await;
        let store = test_store().await;

        let reconciler = Arc::new(Reconciler::new(cache, store));
        let (_tx, rx) = tokio::sync::watch::channel(false);
        assert!(reconciler.start_task(0, rx).is_none());
    }
}
