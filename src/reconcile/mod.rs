//! Authorization recovery.
//!
//! Items parked in `authorization-error` wait for the user to log in again.
//! The reconciler watches the `unauthorized` flag and, when it falls from
//! `true` to `false`, puts every parked item back into `in-progress`.

use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::KEY_UNAUTHORIZED;
use crate::error_handling::QueueError;
use crate::models::Status;
use crate::queue::{QueueItemPatch, RetryQueue};
use crate::storage::{DocumentStore, StoreChange};

pub struct StatusReconciler {
    queue: Arc<dyn RetryQueue>,
    store: Arc<dyn DocumentStore>,
    last_seen: Mutex<bool>,
}

/// Reads the flag from a stored value; anything but `true` counts as authorized.
fn flag_value(value: Option<&Value>) -> bool {
    value.and_then(Value::as_bool).unwrap_or(false)
}

impl StatusReconciler {
    pub fn new(queue: Arc<dyn RetryQueue>, store: Arc<dyn DocumentStore>) -> Self {
        StatusReconciler {
            queue,
            store,
            last_seen: Mutex::new(false),
        }
    }

    /// Records the stored flag as the last seen value without acting on it.
    pub async fn prime(&self) {
        match self.store.get(KEY_UNAUTHORIZED).await {
            Ok(value) => *self.last_seen.lock().await = flag_value(value.as_ref()),
            Err(e) => warn!("Failed to read unauthorized flag: {e}"),
        }
    }

    /// Feeds a new flag value. Returns the number of items resumed, which is
    /// only non-zero on a `true` to `false` edge.
    pub async fn observe(&self, unauthorized: bool) -> usize {
        let mut last_seen = self.last_seen.lock().await;
        let previous = std::mem::replace(&mut *last_seen, unauthorized);
        self.on_edge(previous, unauthorized).await
    }

    /// Feeds one recorded write of the flag. The edge comes from the write's
    /// own old and new values, so it holds however late the task started.
    pub async fn observe_change(&self, change: &StoreChange) -> usize {
        let previous = flag_value(change.old.as_ref());
        let unauthorized = flag_value(change.new.as_ref());
        let mut last_seen = self.last_seen.lock().await;
        *last_seen = unauthorized;
        self.on_edge(previous, unauthorized).await
    }

    async fn on_edge(&self, previous: bool, unauthorized: bool) -> usize {
        if !(previous && !unauthorized) {
            return 0;
        }
        match self.resume_parked().await {
            Ok(resumed) => {
                info!("Authorization restored, resumed {resumed} item(s)");
                resumed
            }
            Err(e) => {
                warn!("Failed to resume items after re-authorization: {e}");
                0
            }
        }
    }

    async fn resume_parked(&self) -> Result<usize, QueueError> {
        let parked: Vec<String> = self
            .queue
            .get_queue()
            .await?
            .into_iter()
            .filter(|item| item.status == Status::AuthorizationError)
            .map(|item| item.id)
            .collect();

        let mut resumed = 0;
        for id in parked {
            let patch = QueueItemPatch::status_with_message(Status::InProgress, "")
                .if_status(Status::AuthorizationError);
            match self.queue.update_queue_item(&id, patch).await {
                Ok(_) => resumed += 1,
                Err(e @ (QueueError::NotFound(_) | QueueError::StatusChanged { .. })) => {
                    debug!("Not resuming {id}: {e}")
                }
                Err(e) => return Err(e),
            }
        }
        Ok(resumed)
    }

    /// Follows store changes of the `unauthorized` key until cancelled.
    pub fn run(
        self: Arc<Self>,
        mut changes: broadcast::Receiver<StoreChange>,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.prime().await;
            loop {
                let change = tokio::select! {
                    _ = token.cancelled() => break,
                    change = changes.recv() => change,
                };
                match change {
                    Ok(change) if change.key == KEY_UNAUTHORIZED => {
                        self.observe_change(&change).await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Reconciler missed {skipped} store change(s), re-reading flag");
                        if let Ok(value) = self.store.get(KEY_UNAUTHORIZED).await {
                            self.observe(flag_value(value.as_ref())).await;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Reconciler stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RetryObject;
    use crate::queue::StoreRetryQueue;
    use crate::storage::MemoryStore;
    use serde_json::{json, Map};
    use strum::IntoEnumIterator;

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
            status_message: "Authorization lost".to_string(),
            headers_cache: Vec::new(),
            original_body: Map::new(),
            request_url: String::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    async fn setup() -> (Arc<MemoryStore>, Arc<StoreRetryQueue>, Arc<StatusReconciler>) {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(StoreRetryQueue::new(store.clone()));
        for (n, status) in Status::iter().enumerate() {
            queue.add_to_queue(item(&n.to_string(), status)).await.unwrap();
        }
        queue
            .add_to_queue(item("extra", Status::AuthorizationError))
            .await
            .unwrap();
        let reconciler = Arc::new(StatusReconciler::new(queue.clone(), store.clone()));
        (store, queue, reconciler)
    }

    async fn statuses(queue: &StoreRetryQueue) -> Vec<(String, Status)> {
        queue
            .get_queue()
            .await
            .unwrap()
            .into_iter()
            .map(|i| (i.id, i.status))
            .collect()
    }

    #[tokio::test]
    async fn test_falling_edge_resumes_exactly_parked_items() {
        let (_store, queue, reconciler) = setup().await;
        let before = statuses(&queue).await;

        assert_eq!(reconciler.observe(true).await, 0);
        assert_eq!(reconciler.observe(false).await, 2);

        let after = statuses(&queue).await;
        for ((id, old), (_, new)) in before.iter().zip(after.iter()) {
            if *old == Status::AuthorizationError {
                assert_eq!(*new, Status::InProgress, "{id} should resume");
            } else {
                assert_eq!(new, old, "{id} should be untouched");
            }
        }
        let resumed = queue.get_queue().await.unwrap();
        assert!(resumed
            .iter()
            .filter(|i| i.id == "extra")
            .all(|i| i.status_message.is_empty()));
    }

    #[tokio::test]
    async fn test_other_transitions_are_noops() {
        let (_store, queue, reconciler) = setup().await;
        let before = statuses(&queue).await;
        assert_eq!(reconciler.observe(false).await, 0);
        assert_eq!(reconciler.observe(true).await, 0);
        assert_eq!(reconciler.observe(true).await, 0);
        assert_eq!(statuses(&queue).await, before);

        assert_eq!(reconciler.observe(false).await, 2);
        assert_eq!(reconciler.observe(false).await, 0);
    }

    #[tokio::test]
    async fn test_run_follows_store_changes() {
        let (store, queue, reconciler) = setup().await;
        let token = CancellationToken::new();
        let handle = Arc::clone(&reconciler).run(store.subscribe(), token.clone());

        let mut changes = store.subscribe();
        store.set(KEY_UNAUTHORIZED, json!(true)).await.unwrap();
        store.set(KEY_UNAUTHORIZED, json!(false)).await.unwrap();
        // Wait until the reconciler has written the resumed items
        loop {
            let change = changes.recv().await.unwrap();
            if change.key == crate::config::KEY_RETRY_QUEUE {
                let parked = statuses(&queue)
                    .await
                    .into_iter()
                    .filter(|(_, s)| *s == Status::AuthorizationError)
                    .count();
                if parked == 0 {
                    break;
                }
            }
        }

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_login_before_task_starts_still_resumes() {
        let (store, queue, reconciler) = setup().await;
        store.set(KEY_UNAUTHORIZED, json!(true)).await.unwrap();

        let subscribed = store.subscribe();
        store.set(KEY_UNAUTHORIZED, json!(false)).await.unwrap();

        let mut changes = store.subscribe();
        let token = CancellationToken::new();
        let handle = Arc::clone(&reconciler).run(subscribed, token.clone());
        loop {
            let change = changes.recv().await.unwrap();
            if change.key == crate::config::KEY_RETRY_QUEUE
                && statuses(&queue)
                    .await
                    .iter()
                    .all(|(_, s)| *s != Status::AuthorizationError)
            {
                break;
            }
        }

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_observe_change_uses_recorded_values() {
        let (_store, queue, reconciler) = setup().await;
        let change = |old: Option<Value>, new: Option<Value>| StoreChange {
            key: KEY_UNAUTHORIZED.to_string(),
            old,
            new,
        };

        assert_eq!(reconciler.observe_change(&change(None, Some(json!(true)))).await, 0);
        assert_eq!(
            reconciler
                .observe_change(&change(Some(json!(false)), Some(json!(false))))
                .await,
            0
        );
        assert_eq!(
            reconciler
                .observe_change(&change(Some(json!(true)), None))
                .await,
            2
        );
        assert!(statuses(&queue)
            .await
            .iter()
            .all(|(_, s)| *s != Status::AuthorizationError));
    }

    #[test]
    fn test_flag_value() {
        assert!(flag_value(Some(&json!(true))));
        assert!(!flag_value(Some(&json!(false))));
        assert!(!flag_value(Some(&json!("true"))));
        assert!(!flag_value(None));
    }
}
