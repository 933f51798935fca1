//! Queue persisted as one document.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use tokio::sync::Mutex;

use super::{QueueItemPatch, RetryQueue};
use crate::config::KEY_RETRY_QUEUE;
use crate::error_handling::QueueError;
use crate::models::RetryObject;
use crate::storage::{load, save, DocumentStore};

/// [`RetryQueue`] stored under the `retryQueue` key of a [`DocumentStore`].
///
/// Every mutation is a read-modify-write of the whole sequence under one mutex,
/// so concurrent callers never lose each other's writes. Other writers of the
/// same key bypass this lock.
pub struct StoreRetryQueue {
    store: Arc<dyn DocumentStore>,
    lock: Mutex<()>,
}

impl StoreRetryQueue {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        StoreRetryQueue {
            store,
            lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    async fn read(&self) -> Result<Vec<RetryObject>, QueueError> {
        Ok(load(self.store.as_ref(), KEY_RETRY_QUEUE).await?)
    }

    async fn write(&self, items: &[RetryObject]) -> Result<(), QueueError> {
        Ok(save(self.store.as_ref(), KEY_RETRY_QUEUE, items).await?)
    }
}

#[async_trait]
impl RetryQueue for StoreRetryQueue {
    async fn add_to_queue(&self, mut item: RetryObject) -> Result<(), QueueError> {
        let _guard = self.lock.lock().await;
        let mut items = self.read().await?;
        if items.iter().any(|existing| existing.id == item.id) {
            return Err(QueueError::Duplicate(item.id));
        }
        let now = Utc::now().timestamp_millis();
        if item.created_at == 0 {
            item.created_at = now;
        }
        item.updated_at = now;
        debug!("Queueing {} ({}) as {}", item.id, item.tv_app_id, item.status);
        items.push(item);
        self.write(&items).await
    }

    async fn remove_from_queue(&self, id: &str) -> Result<RetryObject, QueueError> {
        let _guard = self.lock.lock().await;
        let mut items = self.read().await?;
        let index = items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        let removed = items.remove(index);
        self.write(&items).await?;
        Ok(removed)
    }

    async fn remove_multiple_from_queue(&self, ids: &[String]) -> Result<Vec<String>, QueueError> {
        let _guard = self.lock.lock().await;
        let mut items = self.read().await?;
        let mut removed = Vec::new();
        for id in ids {
            match items.iter().position(|item| &item.id == id) {
                Some(index) => {
                    items.remove(index);
                    removed.push(id.clone());
                }
                None => debug!("Skipping removal of unknown queue item {id}"),
            }
        }
        if !removed.is_empty() {
            self.write(&items).await?;
        }
        Ok(removed)
    }

    async fn update_queue_item(
        &self,
        id: &str,
        patch: QueueItemPatch,
    ) -> Result<RetryObject, QueueError> {
        let _guard = self.lock.lock().await;
        let mut items = self.read().await?;
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        patch.apply(item)?;
        item.updated_at = Utc::now().timestamp_millis();
        let updated = item.clone();
        self.write(&items).await?;
        Ok(updated)
    }

    async fn get_queue(&self) -> Result<Vec<RetryObject>, QueueError> {
        self.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;
    use crate::storage::{MemoryStore, SqliteStore};
    use serde_json::Map;

    fn item(id: &str, status: Status) -> RetryObject {
        RetryObject {
            id: id.to_string(),
            tv_app_id: format!("TV-{id}"),
            driver_name: String::new(),
            container_number: String::new(),
            current_slot: String::new(),
            start_slot: String::new(),
            end_slot: String::new(),
            status,
            status_message: String::new(),
            headers_cache: Vec::new(),
            original_body: Map::new(),
            request_url: String::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn memory_queue() -> StoreRetryQueue {
        StoreRetryQueue::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_add_preserves_insertion_order() {
        let queue = memory_queue();
        for id in ["b", "a", "c"] {
            queue.add_to_queue(item(id, Status::InProgress)).await.unwrap();
        }
        let ids: Vec<String> = queue.get_queue().await.unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_add_stamps_timestamps() {
        let queue = memory_queue();
        queue.add_to_queue(item("a", Status::InProgress)).await.unwrap();
        let stored = &queue.get_queue().await.unwrap()[0];
        assert!(stored.created_at > 0);
        assert_eq!(stored.created_at, stored.updated_at);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let queue = memory_queue();
        queue.add_to_queue(item("a", Status::InProgress)).await.unwrap();
        let err = queue.add_to_queue(item("a", Status::Success)).await.unwrap_err();
        assert!(matches!(err, QueueError::Duplicate(id) if id == "a"));
        assert_eq!(queue.get_queue().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_unknown_is_not_found() {
        let queue = memory_queue();
        let err = queue.remove_from_queue("missing").await.unwrap_err();
        assert!(matches!(err, QueueError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_multiple_skips_missing() {
        let queue = memory_queue();
        for id in ["a", "b", "c"] {
            queue.add_to_queue(item(id, Status::InProgress)).await.unwrap();
        }
        let removed = queue
            .remove_multiple_from_queue(&["c".to_string(), "zz".to_string(), "a".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, vec!["c", "a"]);
        let remaining = queue.get_queue().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "b");
    }

    #[tokio::test]
    async fn test_update_applies_patch() {
        let queue = memory_queue();
        queue.add_to_queue(item("a", Status::InProgress)).await.unwrap();
        let updated = queue
            .update_queue_item(
                "a",
                QueueItemPatch {
                    status: Some(Status::Paused),
                    status_message: Some("held".to_string()),
                    driver_name: Some("Anna".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, Status::Paused);
        assert_eq!(updated.status_message, "held");
        assert_eq!(updated.driver_name, "Anna");
        assert_eq!(queue.get_queue().await.unwrap()[0], updated);
    }

    #[tokio::test]
    async fn test_terminal_item_rejects_revival() {
        let queue = memory_queue();
        queue.add_to_queue(item("a", Status::Success)).await.unwrap();
        let err = queue
            .update_queue_item("a", QueueItemPatch::status(Status::InProgress))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueueError::InvalidTransition { from: Status::Success, to: Status::InProgress, .. }
        ));
        assert_eq!(queue.get_queue().await.unwrap()[0].status, Status::Success);
    }

    #[tokio::test]
    async fn test_paused_item_rejects_stale_tick_result() {
        let queue = memory_queue();
        queue.add_to_queue(item("a", Status::Paused)).await.unwrap();
        let err = queue
            .update_queue_item("a", QueueItemPatch::status(Status::Error))
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::InvalidTransition { .. }));
        let resumed = queue
            .update_queue_item("a", QueueItemPatch::status(Status::InProgress))
            .await
            .unwrap();
        assert_eq!(resumed.status, Status::InProgress);
    }

    #[tokio::test]
    async fn test_reapplying_same_status_is_idempotent() {
        let queue = memory_queue();
        queue.add_to_queue(item("a", Status::Expired)).await.unwrap();
        let updated = queue
            .update_queue_item("a", QueueItemPatch::status(Status::Expired))
            .await
            .unwrap();
        assert_eq!(updated.status, Status::Expired);
    }

    #[tokio::test]
    async fn test_conditional_patch_rejected_after_status_change() {
        let queue = memory_queue();
        queue.add_to_queue(item("a", Status::InProgress)).await.unwrap();
        queue
            .update_queue_item("a", QueueItemPatch::status(Status::Paused))
            .await
            .unwrap();
        let err = queue
            .update_queue_item(
                "a",
                QueueItemPatch::message("HTTP 503").if_status(Status::InProgress),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueueError::StatusChanged { expected: Status::InProgress, actual: Status::Paused, .. }
        ));
        assert_eq!(queue.get_queue().await.unwrap()[0].status_message, "");
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_not_lost() {
        let queue = Arc::new(memory_queue());
        let handles: Vec<_> = (0..20)
            .map(|n| {
                let queue = Arc::clone(&queue);
                tokio::spawn(async move {
                    queue
                        .add_to_queue(item(&n.to_string(), Status::InProgress))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(queue.get_queue().await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_sqlite_backend_matches_memory_backend() {
        let pool = crate::storage::test_helpers::create_test_pool().await;
        let sqlite = StoreRetryQueue::new(Arc::new(SqliteStore::new(pool)));
        let memory = memory_queue();
        for queue in [&sqlite, &memory] {
            queue.add_to_queue(item("a", Status::InProgress)).await.unwrap();
            queue.add_to_queue(item("b", Status::InProgress)).await.unwrap();
            queue
                .update_queue_item("a", QueueItemPatch::status(Status::AuthorizationError))
                .await
                .unwrap();
            queue.remove_from_queue("b").await.unwrap();
        }
        let strip = |items: Vec<RetryObject>| -> Vec<(String, Status)> {
            items.into_iter().map(|i| (i.id, i.status)).collect()
        };
        assert_eq!(
            strip(sqlite.get_queue().await.unwrap()),
            strip(memory.get_queue().await.unwrap())
        );
    }
}
