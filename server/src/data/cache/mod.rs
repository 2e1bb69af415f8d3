//! Cache module
//!
//! Provides caching infrastructure with pluggable backends:
//! - In-memory (default) - uses moka + dashmap
//! - Redis (optional) - uses deadpool-redis
//!
//! Counter values are stored as decimal string bytes so the Redis backend
//! keeps plain integers on the wire and the memory backend round-trips the
//! same representation.

mod backend;
mod error;
mod key;
mod memory;
mod redis;

use std::sync::Arc;
use std::time::Duration;

pub use backend::CacheBackend;
pub use error::CacheError;
pub use key::{CacheKey, LIKE_COUNT_PREFIX};

use memory::InMemoryCache;

use crate::core::config::{CacheBackendType, CacheConfig};

/// Cache service providing typed access to the cache backend
///
/// Wraps the underlying backend and provides:
/// - Raw bytes API for flexibility
/// - Counter API (i64 values as decimal strings)
/// - Lock primitives consumed by the lock manager
pub struct CacheService {
    backend: Arc<dyn CacheBackend>,
}

impl std::fmt::Debug for CacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheService")
            .field("backend", &self.backend.backend_name())
            .finish()
    }
}

impl CacheService {
    /// Create a new cache service from configuration
    pub async fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        let backend: Arc<dyn CacheBackend> = match config.backend {
            CacheBackendType::Memory => {
                tracing::debug!(
                    max_entries = config.max_entries,
                    "Initializing in-memory cache"
                );
                Arc::new(InMemoryCache::new(config))
            }
            CacheBackendType::Redis => {
                let url = config.redis_url.as_ref().ok_or_else(|| {
                    CacheError::Config("redis_url required for Redis backend".into())
                })?;
                // Note: RedisCache::new logs sanitized URL internally
                Arc::new(redis::RedisCache::new(url).await?)
            }
        };

        Ok(Self { backend })
    }

    /// Build a cache service directly over a backend (used by tests)
    pub fn from_backend(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Get the backend name
    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    // =========================================================================
    // Counter API
    // =========================================================================

    /// Get a cached counter value
    ///
    /// Returns `None` when the key is absent or expired. A present value
    /// that does not parse as an integer is a `Value` error, not a miss;
    /// treating corruption as a miss would silently reset the counter.
    pub async fn get_count(&self, key: &str) -> Result<Option<i64>, CacheError> {
        match self.backend.get(key).await? {
            Some(bytes) => {
                let text = std::str::from_utf8(&bytes)
                    .map_err(|e| CacheError::Value(format!("non-utf8 counter: {e}")))?;
                let value = text
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| CacheError::Value(format!("non-integer counter: {e}")))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Write a counter value with a refreshed TTL
    pub async fn set_count(&self, key: &str, value: i64, ttl: Duration) -> Result<(), CacheError> {
        self.backend
            .set(key, value.to_string().into_bytes(), Some(ttl))
            .await
    }

    // =========================================================================
    // Other operations
    // =========================================================================

    /// Delete a key from cache with automatic error logging.
    ///
    /// Convenience for cache invalidation where errors should be logged but
    /// not propagated (a missed invalidation just shortens the TTL window).
    pub async fn invalidate_key(&self, key: &str) {
        if let Err(e) = self.backend.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Cache invalidation failed");
        }
    }

    /// List live keys under a namespace prefix
    pub async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        self.backend.scan_keys(prefix).await
    }

    /// Atomically claim a lock key (see [`CacheBackend::try_lock`])
    pub async fn try_lock(
        &self,
        key: &str,
        token: &str,
        lease: Duration,
    ) -> Result<bool, CacheError> {
        self.backend.try_lock(key, token, lease).await
    }

    /// Release a lock key if still held by `token`
    pub async fn unlock(&self, key: &str, token: &str) -> Result<bool, CacheError> {
        self.backend.unlock(key, token).await
    }

    /// Health check
    pub async fn health_check(&self) -> Result<(), CacheError> {
        self.backend.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CacheBackendType;

    fn test_config() -> CacheConfig {
        CacheConfig {
            backend: CacheBackendType::Memory,
            max_entries: 1000,
            redis_url: None,
        }
    }

    #[tokio::test]
    async fn test_cache_service_backend_name() {
        let service = CacheService::new(&test_config()).await.unwrap();
        assert_eq!(service.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_count_roundtrip() {
        let service = CacheService::new(&test_config()).await.unwrap();

        let key = CacheKey::like_count(1);
        service
            .set_count(&key, 41, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(service.get_count(&key).await.unwrap(), Some(41));
    }

    #[tokio::test]
    async fn test_count_miss() {
        let service = CacheService::new(&test_config()).await.unwrap();
        assert_eq!(
            service.get_count("item:like:404").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_corrupt_count_is_error_not_miss() {
        let service = CacheService::new(&test_config()).await.unwrap();

        service
            .backend
            .set("item:like:1", b"not-a-number".to_vec(), None)
            .await
            .unwrap();

        let err = service.get_count("item:like:1").await.unwrap_err();
        assert!(matches!(err, CacheError::Value(_)));
    }

    #[tokio::test]
    async fn test_invalidate_key() {
        let service = CacheService::new(&test_config()).await.unwrap();

        let key = CacheKey::like_count(7);
        service
            .set_count(&key, 3, Duration::from_secs(60))
            .await
            .unwrap();
        service.invalidate_key(&key).await;
        assert_eq!(service.get_count(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_health_check() {
        let service = CacheService::new(&test_config()).await.unwrap();
        assert!(service.health_check().await.is_ok());
    }
}
