//! SQLite item store
//!
//! Optimized for single-node, low-latency use with:
//! - WAL mode for concurrent reads during writes
//! - In-memory temp storage for fast queries
//! - Automatic WAL checkpointing

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::ConnectOptions;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::log::LevelFilter;

use super::error::StoreError;
use super::schema;
use super::{Item, ItemStore, ItemUpdate, NewItem};
use crate::core::constants::{
    SQLITE_BUSY_TIMEOUT_SECS, SQLITE_CACHE_SIZE, SQLITE_CHECKPOINT_INTERVAL_SECS,
    SQLITE_MAX_CONNECTIONS, SQLITE_WAL_AUTOCHECKPOINT,
};

/// SQLite-backed item store
///
/// Should be created once at server startup and shared across all modules.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Initialize the store at the given database path
    ///
    /// Creates the database file if it doesn't exist, configures connection
    /// options with tuned pragmas, and applies the schema.
    pub async fn init(db_path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(SQLITE_BUSY_TIMEOUT_SECS))
            .pragma("cache_size", SQLITE_CACHE_SIZE)
            .pragma("temp_store", "MEMORY")
            .pragma("wal_autocheckpoint", SQLITE_WAL_AUTOCHECKPOINT)
            .log_statements(LevelFilter::Trace);

        let pool = SqlitePoolOptions::new()
            .max_connections(SQLITE_MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.apply_schema().await?;

        tracing::debug!(path = %db_path.display(), "SqliteStore initialized");
        Ok(store)
    }

    /// Create a store from an existing pool (primarily for testing)
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.apply_schema().await?;
        Ok(store)
    }

    async fn apply_schema(&self) -> Result<(), StoreError> {
        for statement in schema::SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement.trim())
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Schema(e.to_string()))?;
        }
        Ok(())
    }

    pub async fn checkpoint(&self) -> Result<(), StoreError> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await?;
        tracing::debug!("WAL checkpoint completed");
        Ok(())
    }

    /// Close the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("SQLite pool closed");
    }

    pub fn start_checkpoint_task(
        self: &Arc<Self>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(SQLITE_CHECKPOINT_INTERVAL_SECS));
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("WAL checkpoint task shutting down");
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        if let Err(e) = store.checkpoint().await {
                            tracing::warn!("WAL checkpoint failed: {}", e);
                        }
                    }
                }
            }
        })
    }
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

#[async_trait]
impl ItemStore for SqliteStore {
    async fn create(&self, new: NewItem) -> Result<Item, StoreError> {
        let now = now_secs();
        let item = sqlx::query_as::<_, Item>(
            "INSERT INTO items (name, image_url, like_count, created_at, updated_at) \
             VALUES (?, ?, 0, ?, ?) \
             RETURNING id, name, image_url, like_count, created_at, updated_at",
        )
        .bind(&new.name)
        .bind(&new.image_url)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Item>, StoreError> {
        let item = sqlx::query_as::<_, Item>(
            "SELECT id, name, image_url, like_count, created_at, updated_at \
             FROM items WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn list(&self) -> Result<Vec<Item>, StoreError> {
        let items = sqlx::query_as::<_, Item>(
            "SELECT id, name, image_url, like_count, created_at, updated_at \
             FROM items ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn update(&self, id: i64, update: ItemUpdate) -> Result<Option<Item>, StoreError> {
        let item = sqlx::query_as::<_, Item>(
            "UPDATE items SET name = ?, image_url = ?, updated_at = ? WHERE id = ? \
             RETURNING id, name, image_url, like_count, created_at, updated_at",
        )
        .bind(&update.name)
        .bind(&update.image_url)
        .bind(now_secs())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_like_count(&self, id: i64, like_count: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE items SET like_count = ?, updated_at = ? WHERE id = ?")
            .bind(like_count)
            .bind(now_secs())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) async fn memory_store() -> SqliteStore {
        // Single connection for :memory: to ensure shared state
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        SqliteStore::from_pool(pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_starts_at_zero_likes() {
        let store = memory_store().await;

        let item = store
            .create(NewItem {
                name: "Keyboard".to_string(),
                image_url: Some("https://example.com/kb.png".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(item.like_count, 0);
        assert_eq!(item.name, "Keyboard");
        assert!(item.id > 0);
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let store = memory_store().await;

        let created = store
            .create(NewItem {
                name: "Mouse".to_string(),
                image_url: None,
            })
            .await
            .unwrap();

        let found = store.find_by_id(created.id).await.unwrap();
        assert_eq!(found, Some(created));

        let missing = store.find_by_id(9999).await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_list_ordered() {
        let store = memory_store().await;

        for name in ["a", "b", "c"] {
            store
                .create(NewItem {
                    name: name.to_string(),
                    image_url: None,
                })
                .await
                .unwrap();
        }

        let items = store.list().await.unwrap();
        assert_eq!(items.len(), 3);
        assert!(items.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn test_update_metadata() {
        let store = memory_store().await;

        let created = store
            .create(NewItem {
                name: "Old".to_string(),
                image_url: None,
            })
            .await
            .unwrap();

        let updated = store
            .update(
                created.id,
                ItemUpdate {
                    name: "New".to_string(),
                    image_url: Some("https://example.com/new.png".to_string()),
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "New");
        assert_eq!(updated.like_count, created.like_count);

        let absent = store
            .update(
                9999,
                ItemUpdate {
                    name: "x".to_string(),
                    image_url: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(absent, None);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = memory_store().await;

        let created = store
            .create(NewItem {
                name: "Gone".to_string(),
                image_url: None,
            })
            .await
            .unwrap();

        assert!(store.delete(created.id).await.unwrap());
        assert!(!store.delete(created.id).await.unwrap());
        assert_eq!(store.find_by_id(created.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_like_count() {
        let store = memory_store().await;

        let created = store
            .create(NewItem {
                name: "Popular".to_string(),
                image_url: None,
            })
            .await
            .unwrap();

        assert!(store.set_like_count(created.id, 42).await.unwrap());
        let found = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.like_count, 42);

        // Item deleted between cache write and sweep: no row updated
        assert!(!store.set_like_count(9999, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_init_on_disk_and_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::init(&dir.path().join("tally.db")).await.unwrap();

        store
            .create(NewItem {
                name: "Disk".to_string(),
                image_url: None,
            })
            .await
            .unwrap();

        store.checkpoint().await.unwrap();
        store.close().await;
    }
}
