// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "tally";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "TALLY_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "TALLY_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "TALLY_LOG";

/// Environment variable for the SQLite database path
pub const ENV_SQLITE_PATH: &str = "TALLY_SQLITE_PATH";

/// Environment variable for cache backend selection (memory|redis)
pub const ENV_CACHE_BACKEND: &str = "TALLY_CACHE_BACKEND";

/// Environment variable for Redis connection URL
pub const ENV_CACHE_REDIS_URL: &str = "TALLY_CACHE_REDIS_URL";

/// Environment variable for in-memory cache capacity
pub const ENV_CACHE_MAX_ENTRIES: &str = "TALLY_CACHE_MAX_ENTRIES";

/// Environment variable for lock lease duration in seconds
pub const ENV_LOCK_LEASE_SECS: &str = "TALLY_LOCK_LEASE_SECS";

/// Environment variable for lock acquire timeout in seconds
pub const ENV_LOCK_ACQUIRE_TIMEOUT_SECS: &str = "TALLY_LOCK_ACQUIRE_TIMEOUT_SECS";

/// Environment variable for counter cache TTL in seconds
pub const ENV_COUNTER_TTL_SECS: &str = "TALLY_COUNTER_TTL_SECS";

/// Environment variable for the reconcile interval in seconds (0 = disabled)
pub const ENV_RECONCILE_INTERVAL_SECS: &str = "TALLY_RECONCILE_INTERVAL_SECS";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5706;

// =============================================================================
// Counter Defaults
// =============================================================================

/// Default lock lease duration in seconds.
///
/// Bounds the increment critical section; a crashed holder frees the lock
/// after at most this long.
pub const DEFAULT_LOCK_LEASE_SECS: u64 = 10;

/// Default budget for acquiring the per-item lock before giving up
pub const DEFAULT_LOCK_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Default TTL for cached counter values in seconds (10 minutes).
///
/// Maximum staleness window: increments evicted before a reconcile sweep
/// flushes them are lost.
pub const DEFAULT_COUNTER_TTL_SECS: u64 = 600;

/// Default reconcile sweep interval in seconds (5 minutes)
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 300;

// =============================================================================
// Lock Retry
// =============================================================================

/// Initial backoff between lock acquisition attempts in milliseconds
pub const LOCK_RETRY_BASE_MS: u64 = 10;

/// Backoff ceiling between lock acquisition attempts in milliseconds
pub const LOCK_RETRY_MAX_MS: u64 = 200;

// =============================================================================
// Cache Defaults
// =============================================================================

/// Default maximum entries for the in-memory cache backend
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 100_000;

// =============================================================================
// API Limits
// =============================================================================

/// Maximum item name length in bytes (mirrors the schema CHECK constraint)
pub const MAX_ITEM_NAME_LEN: usize = 200;

// =============================================================================
// SQLite
// =============================================================================

/// SQLite database file name
pub const SQLITE_DB_FILENAME: &str = "tally.db";

/// SQLite busy timeout in seconds
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 5;

/// SQLite page cache size (negative value = KiB)
pub const SQLITE_CACHE_SIZE: &str = "-64000";

/// SQLite WAL autocheckpoint page threshold
pub const SQLITE_WAL_AUTOCHECKPOINT: &str = "1000";

/// Maximum SQLite pool connections
pub const SQLITE_MAX_CONNECTIONS: u32 = 8;

/// Interval between background WAL checkpoints in seconds
pub const SQLITE_CHECKPOINT_INTERVAL_SECS: u64 = 60;

// =============================================================================
// Shutdown
// =============================================================================

/// Grace period for background tasks during shutdown in seconds
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;
