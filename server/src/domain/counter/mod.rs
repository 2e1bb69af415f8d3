//! Like-counter service
//!
//! The hot path for increments. The durable store cannot absorb one write
//! per like, so the current count lives in the cache between reconcile
//! sweeps and the store is only consulted on a cache miss.
//!
//! Increments are serialized per item by a distributed lock: a bare
//! get-then-set against the cache would lose updates under concurrent
//! callers racing on the same key. Reads take no lock - on a miss two
//! concurrent readers both re-seed the same authoritative value, which is
//! an idempotent overwrite.

pub mod reconcile;

pub use reconcile::{Reconciler, SweepStats};

use std::sync::Arc;

use thiserror::Error;

use crate::core::config::CounterConfig;
use crate::data::cache::{CacheError, CacheKey, CacheService};
use crate::data::lock::{LockError, LockManager};
use crate::data::store::{ItemStore, StoreError};

#[derive(Error, Debug)]
pub enum CounterError {
    /// The item has no record in the durable store. Fatal to the call;
    /// no cached value can substitute for a genuinely missing entity.
    #[error("Item not found: {0}")]
    NotFound(i64),

    /// The per-item lock could not be acquired within budget.
    /// Retryable; retry policy is left to the caller.
    #[error("Timed out acquiring the increment lock for item {0}")]
    LockTimeout(i64),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Counter service: lock-protected increments and cache-first reads
pub struct CounterService {
    cache: Arc<CacheService>,
    store: Arc<dyn ItemStore>,
    locks: LockManager,
    config: CounterConfig,
}

impl CounterService {
    pub fn new(
        cache: Arc<CacheService>,
        store: Arc<dyn ItemStore>,
        config: CounterConfig,
    ) -> Self {
        let locks = LockManager::new(cache.clone());
        Self {
            cache,
            store,
            locks,
            config,
        }
    }

    /// Increment the like count for an item, returning the new value
    ///
    /// The read-modify-write runs under the per-item distributed lock;
    /// the lease is released on every exit path, success or failure.
    pub async fn increment(&self, item_id: i64) -> Result<i64, CounterError> {
        let lock_key = CacheKey::like_lock(item_id);
        let lease = match self
            .locks
            .acquire(
                &lock_key,
                self.config.lock_lease(),
                self.config.lock_acquire_timeout(),
            )
            .await
        {
            Ok(lease) => lease,
            Err(LockError::Timeout { waited_ms, .. }) => {
                tracing::warn!(item_id, waited_ms, "Increment lock acquisition timed out");
                return Err(CounterError::LockTimeout(item_id));
            }
            Err(LockError::Cache(e)) => return Err(CounterError::Cache(e)),
        };

        let result = self.locked_increment(item_id).await;
        self.locks.release(&lease).await;
        result
    }

    async fn locked_increment(&self, item_id: i64) -> Result<i64, CounterError> {
        let cache_key = CacheKey::like_count(item_id);

        let current = match self.cache.get_count(&cache_key).await? {
            Some(value) => value,
            None => self.authoritative_count(item_id).await?,
        };

        let next = current + 1;
        self.cache
            .set_count(&cache_key, next, self.config.cache_ttl())
            .await?;

        Ok(next)
    }

    /// Read the like count for an item without locking
    ///
    /// Cache hit returns the cached value (the most current one - sweeps
    /// flush but never invalidate). On a miss the authoritative value is
    /// returned and the cache re-seeded; the seed itself is best-effort.
    pub async fn read(&self, item_id: i64) -> Result<i64, CounterError> {
        let cache_key = CacheKey::like_count(item_id);

        if let Some(value) = self.cache.get_count(&cache_key).await? {
            return Ok(value);
        }

        let value = self.authoritative_count(item_id).await?;

        if let Err(e) = self
            .cache
            .set_count(&cache_key, value, self.config.cache_ttl())
            .await
        {
            tracing::warn!(item_id, error = %e, "Failed to warm counter cache on read");
        }

        Ok(value)
    }

    async fn authoritative_count(&self, item_id: i64) -> Result<i64, CounterError> {
        let item = self
            .store
            .find_by_id(item_id)
            .await?
            .ok_or(CounterError::NotFound(item_id))?;
        Ok(item.like_count)
    }
}
