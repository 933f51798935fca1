//! Retry queue.
//!
//! The queue owns every [`RetryObject`] after correlation. All mutation goes
//! through the primitives of [`RetryQueue`]; status changes are validated
//! against [`Status::can_transition_to`] so that a stale write (for example
//! from an overlapping scheduler tick) cannot revive a finished or paused item.

mod patch;
mod store;

use async_trait::async_trait;

use crate::error_handling::QueueError;
use crate::models::RetryObject;

pub use patch::QueueItemPatch;
pub use store::StoreRetryQueue;

#[async_trait]
pub trait RetryQueue: Send + Sync {
    /// Appends `item`. Fails with `Duplicate` when the id is already queued.
    async fn add_to_queue(&self, item: RetryObject) -> Result<(), QueueError>;

    async fn remove_from_queue(&self, id: &str) -> Result<RetryObject, QueueError>;

    /// Removes every existing id in order and returns the ids removed.
    /// Unknown ids are skipped.
    async fn remove_multiple_from_queue(&self, ids: &[String]) -> Result<Vec<String>, QueueError>;

    /// Applies `patch` and returns the updated item.
    async fn update_queue_item(
        &self,
        id: &str,
        patch: QueueItemPatch,
    ) -> Result<RetryObject, QueueError>;

    /// Snapshot in insertion order.
    async fn get_queue(&self) -> Result<Vec<RetryObject>, QueueError>;
}
