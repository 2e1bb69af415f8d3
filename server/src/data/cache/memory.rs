//! In-memory cache implementation using moka + dashmap
//!
//! Uses moka for TTL'd cache entries and dashmap for lock entries, so the
//! lock compare-and-delete stays atomic without going through moka.
//! Intended for single-process deployments and tests; the lock guarantee
//! only spans processes with the Redis backend.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use moka::Expiry;
use moka::future::Cache;

use super::backend::CacheBackend;
use super::error::CacheError;
use crate::core::config::CacheConfig;

/// Cache entry with data and per-entry TTL
#[derive(Clone)]
struct CacheEntry {
    data: Vec<u8>,
    ttl: Option<Duration>,
}

/// Per-entry expiry tracking for variable TTLs
struct VariableTtlExpiry;

impl Expiry<String, CacheEntry> for VariableTtlExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_read(
        &self,
        _key: &String,
        _value: &CacheEntry,
        _read_at: Instant,
        duration_until_expiry: Option<Duration>,
        _last_modified_at: Instant,
    ) -> Option<Duration> {
        duration_until_expiry
    }
}

/// Lock entry holding the claimant token and its lease expiry
struct LockEntry {
    token: String,
    expires_at: Instant,
}

/// In-memory cache implementation
///
/// Uses:
/// - `moka::Cache` - TTL'd entries with TinyLFU eviction, automatic cleanup
/// - `DashMap<LockEntry>` - lock claims with atomic entry-level access
/// - `cleanup_ops` - tracks lock operations to trigger periodic cleanup
pub struct InMemoryCache {
    cache: Cache<String, CacheEntry>,
    locks: DashMap<String, LockEntry>,
    /// Counter for cleanup scheduling (increments on every try_lock)
    cleanup_ops: AtomicU64,
}

impl InMemoryCache {
    /// Create a new in-memory cache with the given configuration
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            // Set initial capacity to reduce rehashing during warmup
            .initial_capacity((config.max_entries as usize / 4).min(10_000))
            .expire_after(VariableTtlExpiry)
            .build();

        Self {
            cache,
            locks: DashMap::new(),
            cleanup_ops: AtomicU64::new(0),
        }
    }

    /// Drop lock entries whose lease has lapsed (called periodically)
    fn cleanup_expired_locks(&self) {
        let now = Instant::now();
        self.locks.retain(|_, entry| now < entry.expires_at);
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.cache.get(key).await.map(|entry| entry.data.clone()))
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry { data: value, ttl };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let existed = self.cache.contains_key(key);
        self.cache.invalidate(key).await;
        Ok(existed)
    }

    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        // Evict anything already past its TTL so the snapshot only carries
        // live keys, mirroring what Redis SCAN would return.
        self.cache.run_pending_tasks().await;

        Ok(self
            .cache
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| (*k).clone())
            .collect())
    }

    async fn try_lock(&self, key: &str, token: &str, lease: Duration) -> Result<bool, CacheError> {
        use dashmap::mapref::entry::Entry;

        let now = Instant::now();
        let expires_at = now + lease;

        // Entry API gives exclusive access to the slot - prevents two
        // claimants both observing "absent" and both winning.
        let acquired = match self.locks.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let lock = occupied.get_mut();
                if now >= lock.expires_at {
                    // Previous holder's lease lapsed - claim it
                    lock.token = token.to_string();
                    lock.expires_at = expires_at;
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(LockEntry {
                    token: token.to_string(),
                    expires_at,
                });
                true
            }
        };

        // Periodically clean up expired locks so abandoned keys don't pile up
        let ops = self.cleanup_ops.fetch_add(1, Ordering::Relaxed);
        if ops % 256 == 0 {
            self.cleanup_expired_locks();
        }

        Ok(acquired)
    }

    async fn unlock(&self, key: &str, token: &str) -> Result<bool, CacheError> {
        let now = Instant::now();
        let removed = self
            .locks
            .remove_if(key, |_, entry| entry.token == token && now < entry.expires_at);
        Ok(removed.is_some())
    }

    async fn health_check(&self) -> Result<(), CacheError> {
        // In-memory is always healthy
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
