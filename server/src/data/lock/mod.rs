//! Distributed lock manager
//!
//! Lease-based mutual exclusion over the cache backend. A lock is a cache
//! key holding a random holder token with a server-side TTL: while the entry
//! lives, no other claimant can take the key; if the holder crashes, the
//! lease expires and the lock self-heals.
//!
//! Acquisition retries with jittered exponential backoff inside a bounded
//! budget and fails with [`LockError::Timeout`] when the budget runs out.
//! Retry policy beyond that is the caller's concern.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

use super::cache::{CacheError, CacheService};
use crate::core::constants::{LOCK_RETRY_BASE_MS, LOCK_RETRY_MAX_MS};

#[derive(Error, Debug)]
pub enum LockError {
    #[error("Timed out acquiring lock {key} after {waited_ms}ms")]
    Timeout { key: String, waited_ms: u64 },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// A held lock lease
///
/// The token identifies this holder; release is compare-and-delete on it,
/// so a lease that already expired and was re-acquired elsewhere cannot be
/// released by us.
#[derive(Debug)]
pub struct LockLease {
    key: String,
    token: String,
}

impl LockLease {
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Distributed lock manager over the cache backend
pub struct LockManager {
    cache: Arc<CacheService>,
}

impl LockManager {
    pub fn new(cache: Arc<CacheService>) -> Self {
        Self { cache }
    }

    /// Acquire the lock for `key`, blocking the task up to `acquire_timeout`
    ///
    /// The lease auto-expires after `lease` even if never released.
    pub async fn acquire(
        &self,
        key: &str,
        lease: Duration,
        acquire_timeout: Duration,
    ) -> Result<LockLease, LockError> {
        let token = Uuid::new_v4().to_string();
        let started = Instant::now();
        let deadline = started + acquire_timeout;
        let mut backoff_ms = LOCK_RETRY_BASE_MS;

        loop {
            if self.cache.try_lock(key, &token, lease).await? {
                return Ok(LockLease {
                    key: key.to_string(),
                    token,
                });
            }

            let wait = {
                // Jitter de-synchronizes claimants hammering the same key.
                // The rng handle must not be held across an await point.
                let jitter_ms = rand::thread_rng().gen_range(0..=backoff_ms / 2);
                Duration::from_millis(backoff_ms + jitter_ms)
            };

            if Instant::now() + wait >= deadline {
                return Err(LockError::Timeout {
                    key: key.to_string(),
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }

            tokio::time::sleep(wait).await;
            backoff_ms = (backoff_ms * 2).min(LOCK_RETRY_MAX_MS);
        }
    }

    /// Release a held lease
    ///
    /// Idempotent: releasing an expired or already-released lease is a no-op.
    /// Failures are logged, never propagated - the lease TTL reclaims the
    /// lock regardless, so callers on error paths can always release.
    pub async fn release(&self, lease: &LockLease) {
        match self.cache.unlock(&lease.key, &lease.token).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(key = %lease.key, "Lock was already expired or released");
            }
            Err(e) => {
                tracing::warn!(
                    key = %lease.key,
                    error = %e,
                    "Lock release failed; lease TTL will reclaim it"
                );
            }
        }
    }
}
