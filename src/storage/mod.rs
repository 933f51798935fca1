// storage/mod.rs
// Persisted document store

//! Key/value JSON document store.
//!
//! Stands in for the browser's persisted storage: every component reads and
//! writes whole documents under fixed keys (see `config::KEY_*`). Writers
//! broadcast a [`StoreChange`] so observers can react to edges on a key.

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod sqlite;
#[cfg(test)]
pub mod test_helpers;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::config::{KEY_REQUEST_CACHE_BODY, KEY_REQUEST_CACHE_HEADERS};
use crate::error_handling::StoreError;

// Re-export commonly used items
pub use memory::MemoryStore;
pub use migrations::run_migrations;
pub use pool::init_db_pool_with_path;
pub use sqlite::SqliteStore;

/// Capacity of the change notification channel.
pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A write observed on the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    pub key: String,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

/// Document store port.
///
/// Implementations must broadcast a [`StoreChange`] after every successful
/// `set` or `remove`, in write order.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Receives every change made after the call.
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

/// Reads and decodes a document, falling back to `T::default()` when the key is
/// missing or null.
pub async fn load<T>(store: &dyn DocumentStore, key: &str) -> Result<T, StoreError>
where
    T: DeserializeOwned + Default,
{
    match store.get(key).await? {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => {
            serde_json::from_value(value).map_err(|source| StoreError::SerializationError {
                key: key.to_string(),
                source,
            })
        }
    }
}

/// Encodes and writes a document.
pub async fn save<T>(store: &dyn DocumentStore, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(value).map_err(|source| StoreError::SerializationError {
        key: key.to_string(),
        source,
    })?;
    store.set(key, value).await
}

/// Clears both request caches unconditionally.
pub async fn cleanup_cache(store: &dyn DocumentStore) -> Result<(), StoreError> {
    store
        .set(KEY_REQUEST_CACHE_BODY, Value::Object(Default::default()))
        .await?;
    store
        .set(KEY_REQUEST_CACHE_HEADERS, Value::Object(Default::default()))
        .await
}
