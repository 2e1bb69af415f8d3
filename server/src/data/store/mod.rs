//! Durable item store
//!
//! The authoritative home of item records and their like counts. The cache
//! is the hot path; this store only sees counter writes when the reconcile
//! sweep flushes, or counter reads on a cache miss.

mod error;
pub mod schema;
mod sqlite;

pub use error::StoreError;
pub use sqlite::SqliteStore;

use async_trait::async_trait;

/// An item record with its authoritative like count
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub like_count: i64,
    /// Unix seconds
    pub created_at: i64,
    /// Unix seconds
    pub updated_at: i64,
}

/// Fields for creating an item (like count always starts at zero)
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub image_url: Option<String>,
}

/// Fields for updating an item's metadata
#[derive(Debug, Clone)]
pub struct ItemUpdate {
    pub name: String,
    pub image_url: Option<String>,
}

/// Durable store contract consumed by the counter core
///
/// `set_like_count` is the reconcile sweep's write path; everything else is
/// the thin CRUD surface around it.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Insert a new item and return the stored record
    async fn create(&self, new: NewItem) -> Result<Item, StoreError>;

    /// Fetch an item by id, `None` if absent
    async fn find_by_id(&self, id: i64) -> Result<Option<Item>, StoreError>;

    /// List all items ordered by id
    async fn list(&self) -> Result<Vec<Item>, StoreError>;

    /// Update item metadata, returning the new record or `None` if absent
    async fn update(&self, id: i64, update: ItemUpdate) -> Result<Option<Item>, StoreError>;

    /// Delete an item, returning whether a row was removed
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Overwrite the authoritative like count for an item
    ///
    /// Returns `false` when the item no longer exists (deleted between the
    /// cache write and the sweep) - the sweep skips those.
    async fn set_like_count(&self, id: i64, like_count: i64) -> Result<bool, StoreError>;
}
