//! SQLite-backed document store.
//!
//! Each document is one row of the `documents` table holding its JSON text.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use tokio::sync::{broadcast, Mutex};

use super::{init_db_pool_with_path, run_migrations, DocumentStore, StoreChange};
use super::CHANGE_CHANNEL_CAPACITY;
use crate::error_handling::StoreError;

/// Document store persisted in SQLite.
pub struct SqliteStore {
    pool: SqlitePool,
    changes: broadcast::Sender<StoreChange>,
    // Serializes read-old/write-new so change notifications follow write order
    write_lock: Mutex<()>,
}

impl SqliteStore {
    /// Wraps a pool whose schema is already migrated.
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        SqliteStore {
            pool,
            changes,
            write_lock: Mutex::new(()),
        }
    }

    /// Opens (creating if needed) the database file and applies migrations.
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        let pool = init_db_pool_with_path(db_path).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    async fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query("SELECT value FROM documents WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            None => Ok(None),
            Some(row) => {
                let text: String = row.try_get("value")?;
                serde_json::from_str(&text)
                    .map(Some)
                    .map_err(|source| StoreError::SerializationError {
                        key: key.to_string(),
                        source,
                    })
            }
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.read(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let text =
            serde_json::to_string(&value).map_err(|source| StoreError::SerializationError {
                key: key.to_string(),
                source,
            })?;

        let _guard = self.write_lock.lock().await;
        let old = self.read(key).await?;
        sqlx::query(
            "INSERT INTO documents (key, value, updated_at_ms) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at_ms = excluded.updated_at_ms",
        )
        .bind(key)
        .bind(&text)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        debug!("Stored document {key} ({} bytes)", text.len());

        let _ = self.changes.send(StoreChange {
            key: key.to_string(),
            old,
            new: Some(value),
        });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let old = self.read(key).await?;
        if old.is_none() {
            return Ok(());
        }
        sqlx::query("DELETE FROM documents WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        let _ = self.changes.send(StoreChange {
            key: key.to_string(),
            old,
            new: None,
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_helpers::create_test_pool;
    use serde_json::json;

    #[tokio::test]
    async fn test_round_trip_and_overwrite() {
        let store = SqliteStore::new(create_test_pool().await);

        store.set("retryQueue", json!([{"id": "1"}])).await.unwrap();
        store.set("retryQueue", json!([])).await.unwrap();

        assert_eq!(store.get("retryQueue").await.unwrap(), Some(json!([])));
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_change_notification_includes_previous_value() {
        let store = SqliteStore::new(create_test_pool().await);
        let mut rx = store.subscribe();

        store.set("unauthorized", json!(true)).await.unwrap();
        store.set("unauthorized", json!(false)).await.unwrap();

        let _ = rx.recv().await.unwrap();
        let change = rx.recv().await.unwrap();
        assert_eq!(change.key, "unauthorized");
        assert_eq!(change.old, Some(json!(true)));
        assert_eq!(change.new, Some(json!(false)));
    }

    #[tokio::test]
    async fn test_remove() {
        let store = SqliteStore::new(create_test_pool().await);
        store.set("tableData", json!([["ID"]])).await.unwrap();
        store.remove("tableData").await.unwrap();
        assert_eq!(store.get("tableData").await.unwrap(), None);
        // Removing again is a no-op
        store.remove("tableData").await.unwrap();
    }

    #[tokio::test]
    async fn test_open_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        {
            let store = SqliteStore::open(&path).await.unwrap();
            store.set("unauthorized", json!(true)).await.unwrap();
        }

        let reopened = SqliteStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("unauthorized").await.unwrap(), Some(json!(true)));
    }
}
