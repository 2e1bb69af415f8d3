//! Cache backend trait definition

use std::time::Duration;

use async_trait::async_trait;

use super::error::CacheError;

/// Cache backend trait
///
/// Defines the interface for cache implementations.
/// Both in-memory and Redis backends implement this trait.
///
/// # Consistency Notes
///
/// Operations on individual keys are atomic. `scan_keys` may return a stale
/// snapshot under concurrent writes; the reconcile sweep tolerates this
/// because any key it misses is picked up by the next sweep.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a value from the cache
    ///
    /// Returns `None` if the key is absent or its TTL has expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Set a value in the cache with optional TTL
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>)
    -> Result<(), CacheError>;

    /// Delete a key from the cache
    ///
    /// Returns `true` if the key existed before deletion, `false` otherwise.
    /// Note: Due to concurrent access, the return value is best-effort and
    /// may not reflect the exact state at the moment of deletion.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// List live keys starting with the given prefix
    ///
    /// Used by the reconcile sweep to enumerate cached counters.
    /// O(n) for the memory backend, uses SCAN for Redis.
    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, CacheError>;

    /// Atomically claim a lock key for `lease` if it is not already held
    ///
    /// Stores the holder token with a server-side TTL so a crashed holder
    /// frees the lock on lease expiry. Returns `true` when the claim won.
    async fn try_lock(&self, key: &str, token: &str, lease: Duration) -> Result<bool, CacheError>;

    /// Release a lock key if it is still held by `token`
    ///
    /// Compare-and-delete: a lock that expired and was re-acquired by another
    /// holder is left untouched. Returns `true` if this call released it.
    async fn unlock(&self, key: &str, token: &str) -> Result<bool, CacheError>;

    /// Health check (validates connection)
    async fn health_check(&self) -> Result<(), CacheError>;

    /// Backend name for debugging/logging
    fn backend_name(&self) -> &'static str;
}
