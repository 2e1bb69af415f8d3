//! Data layer: cache, distributed locks, and the durable item store

pub mod cache;
pub mod lock;
pub mod store;

pub use cache::{CacheBackend, CacheError, CacheKey, CacheService};
pub use lock::{LockError, LockLease, LockManager};
pub use store::{Item, ItemStore, ItemUpdate, NewItem, SqliteStore, StoreError};
