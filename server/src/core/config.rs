use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use super::cli::Cli;
use super::constants::{
    DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_COUNTER_TTL_SECS, DEFAULT_HOST,
    DEFAULT_LOCK_ACQUIRE_TIMEOUT_SECS, DEFAULT_LOCK_LEASE_SECS, DEFAULT_PORT,
    DEFAULT_RECONCILE_INTERVAL_SECS, SQLITE_DB_FILENAME,
};

// =============================================================================
// Cache Backend Enum
// =============================================================================

/// Cache backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendType {
    #[default]
    Memory,
    Redis,
}

impl fmt::Display for CacheBackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheBackendType::Memory => write!(f, "memory"),
            CacheBackendType::Redis => write!(f, "redis"),
        }
    }
}

// =============================================================================
// Config Sections
// =============================================================================

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackendType,
    pub max_entries: u64,
    pub redis_url: Option<String>,
}

/// Durable store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub sqlite_path: PathBuf,
}

/// Counter service tuning
///
/// All windows are operator-overridable; the defaults mirror the documented
/// design: 10s lock lease, 10min cache TTL, 5min reconcile period.
#[derive(Debug, Clone)]
pub struct CounterConfig {
    pub lock_lease_secs: u64,
    pub lock_acquire_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    /// Zero disables the background sweep (manual sweeps still work).
    pub reconcile_interval_secs: u64,
}

impl CounterConfig {
    pub fn lock_lease(&self) -> Duration {
        Duration::from_secs(self.lock_lease_secs)
    }

    pub fn lock_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_acquire_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            lock_lease_secs: DEFAULT_LOCK_LEASE_SECS,
            lock_acquire_timeout_secs: DEFAULT_LOCK_ACQUIRE_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_COUNTER_TTL_SECS,
            reconcile_interval_secs: DEFAULT_RECONCILE_INTERVAL_SECS,
        }
    }
}

// =============================================================================
// AppConfig
// =============================================================================

/// Application configuration assembled from CLI flags and environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub store: StoreConfig,
    pub counter: CounterConfig,
}

impl AppConfig {
    /// Build the configuration from parsed CLI arguments, applying defaults
    pub fn load(cli: &Cli) -> Result<Self> {
        let backend = cli.cache_backend.unwrap_or_default();
        if backend == CacheBackendType::Redis && cli.redis_url.is_none() {
            bail!("redis cache backend requires --redis-url");
        }

        let defaults = CounterConfig::default();
        let counter = CounterConfig {
            lock_lease_secs: cli.lock_lease_secs.unwrap_or(defaults.lock_lease_secs),
            lock_acquire_timeout_secs: cli
                .lock_acquire_timeout_secs
                .unwrap_or(defaults.lock_acquire_timeout_secs),
            cache_ttl_secs: cli.counter_ttl_secs.unwrap_or(defaults.cache_ttl_secs),
            reconcile_interval_secs: cli
                .reconcile_interval_secs
                .unwrap_or(defaults.reconcile_interval_secs),
        };

        if counter.lock_lease_secs == 0 {
            bail!("lock lease must be at least 1 second");
        }
        if counter.cache_ttl_secs == 0 {
            bail!("counter cache TTL must be at least 1 second");
        }

        Ok(Self {
            server: ServerConfig {
                host: cli.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: cli.port.unwrap_or(DEFAULT_PORT),
            },
            cache: CacheConfig {
                backend,
                max_entries: cli.cache_max_entries.unwrap_or(DEFAULT_CACHE_MAX_ENTRIES),
                redis_url: cli.redis_url.clone(),
            },
            store: StoreConfig {
                sqlite_path: cli
                    .sqlite_path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(SQLITE_DB_FILENAME)),
            },
            counter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli_from(args: &[&str]) -> Cli {
        let mut argv = vec!["tally"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::load(&cli_from(&[])).unwrap();
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.cache.backend, CacheBackendType::Memory);
        assert_eq!(config.counter.lock_lease_secs, 10);
        assert_eq!(config.counter.cache_ttl_secs, 600);
        assert_eq!(config.counter.reconcile_interval_secs, 300);
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let cli = cli_from(&["--cache-backend", "redis"]);
        assert!(AppConfig::load(&cli).is_err());

        let cli = cli_from(&["--cache-backend", "redis", "--redis-url", "redis://localhost"]);
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.cache.backend, CacheBackendType::Redis);
    }

    #[test]
    fn test_counter_overrides() {
        let cli = cli_from(&[
            "--lock-lease-secs",
            "3",
            "--counter-ttl-secs",
            "120",
            "--reconcile-interval-secs",
            "0",
        ]);
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.counter.lock_lease(), Duration::from_secs(3));
        assert_eq!(config.counter.cache_ttl(), Duration::from_secs(120));
        assert_eq!(config.counter.reconcile_interval_secs, 0);
    }

    #[test]
    fn test_zero_lease_rejected() {
        let cli = cli_from(&["--lock-lease-secs", "0"]);
        assert!(AppConfig::load(&cli).is_err());
    }
}
