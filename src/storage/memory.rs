//! In-memory document store.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};

use super::{DocumentStore, StoreChange, CHANGE_CHANNEL_CAPACITY};
use crate::error_handling::StoreError;

/// Document store held in process memory. Used by tests and by embedders that
/// persist elsewhere.
pub struct MemoryStore {
    documents: RwLock<HashMap<String, Value>>,
    changes: broadcast::Sender<StoreChange>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        MemoryStore {
            documents: RwLock::new(HashMap::new()),
            changes,
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let old = documents.insert(key.to_string(), value.clone());
        // Sent under the write lock so observers see changes in write order
        let _ = self.changes.send(StoreChange {
            key: key.to_string(),
            old,
            new: Some(value),
        });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        if let Some(old) = documents.remove(key) {
            let _ = self.changes.send(StoreChange {
                key: key.to_string(),
                old: Some(old),
                new: None,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}
