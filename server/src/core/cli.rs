use clap::Parser;

use std::path::PathBuf;

use super::config::CacheBackendType;
use super::constants::{
    ENV_CACHE_BACKEND, ENV_CACHE_MAX_ENTRIES, ENV_CACHE_REDIS_URL, ENV_COUNTER_TTL_SECS, ENV_HOST,
    ENV_LOCK_ACQUIRE_TIMEOUT_SECS, ENV_LOCK_LEASE_SECS, ENV_PORT, ENV_RECONCILE_INTERVAL_SECS,
    ENV_SQLITE_PATH,
};

#[derive(Parser)]
#[command(name = "tally")]
#[command(version, about = "Distributed like-counter service", long_about = None)]
pub struct Cli {
    /// Server host address
    #[arg(long, short = 'H', env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to the SQLite database file
    #[arg(long, env = ENV_SQLITE_PATH)]
    pub sqlite_path: Option<PathBuf>,

    /// Cache backend (memory or redis)
    #[arg(long, env = ENV_CACHE_BACKEND, value_enum)]
    pub cache_backend: Option<CacheBackendType>,

    /// Redis connection URL (required for the redis backend)
    #[arg(long, env = ENV_CACHE_REDIS_URL)]
    pub redis_url: Option<String>,

    /// Maximum entries for the in-memory cache backend
    #[arg(long, env = ENV_CACHE_MAX_ENTRIES)]
    pub cache_max_entries: Option<u64>,

    /// Lock lease duration in seconds
    #[arg(long, env = ENV_LOCK_LEASE_SECS)]
    pub lock_lease_secs: Option<u64>,

    /// Lock acquire timeout in seconds
    #[arg(long, env = ENV_LOCK_ACQUIRE_TIMEOUT_SECS)]
    pub lock_acquire_timeout_secs: Option<u64>,

    /// Cached counter TTL in seconds
    #[arg(long, env = ENV_COUNTER_TTL_SECS)]
    pub counter_ttl_secs: Option<u64>,

    /// Reconcile sweep interval in seconds (0 = disabled)
    #[arg(long, env = ENV_RECONCILE_INTERVAL_SECS)]
    pub reconcile_interval_secs: Option<u64>,
}

/// Parse command line arguments
pub fn parse() -> Cli {
    Cli::parse()
}
