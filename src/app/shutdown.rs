//! Graceful shutdown handling.

use log::warn;
use tokio_util::sync::CancellationToken;

use super::engine::RetryEngine;

/// Stops the scheduler, then the background tasks tied to `cancel`
/// (reconciler, badge follower).
///
/// Ticks in flight finish before this returns.
pub async fn shutdown_gracefully(
    engine: &RetryEngine,
    cancel: CancellationToken,
    background_tasks: Vec<tokio::task::JoinHandle<()>>,
) {
    engine.stop_processing().await;

    cancel.cancel();
    for task in background_tasks {
        if let Err(e) = task.await {
            warn!("Background task ended abnormally: {e}");
        }
    }
}
