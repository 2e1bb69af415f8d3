//! Counter cache key builder and parser
//!
//! The reconcile sweep recovers item ids by parsing keys back, so the
//! format here is a wire contract: `item:like:<id>` for counter values and
//! `lock:item:like:<id>` for the per-item lock.

/// Namespace prefix for cached like counters
pub const LIKE_COUNT_PREFIX: &str = "item:like:";

/// Namespace prefix for per-item increment locks
pub const LIKE_LOCK_PREFIX: &str = "lock:item:like:";

/// Type-safe cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Cache key holding the hot like count for an item
    pub fn like_count(item_id: i64) -> String {
        format!("{LIKE_COUNT_PREFIX}{item_id}")
    }

    /// Lock key guarding the increment critical section for an item
    pub fn like_lock(item_id: i64) -> String {
        format!("{LIKE_LOCK_PREFIX}{item_id}")
    }

    /// Recover the item id from a like-count cache key
    ///
    /// Returns `None` for keys outside the namespace or with a malformed id;
    /// the sweep skips those per-key instead of failing.
    pub fn parse_like_count(key: &str) -> Option<i64> {
        key.strip_prefix(LIKE_COUNT_PREFIX)?.parse::<i64>().ok()
    }
}
