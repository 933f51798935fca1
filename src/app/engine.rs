//! Engine facade: queue, scheduler lifecycle and reconciler in one place.

use std::sync::Arc;

use log::{info, warn};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error_handling::ProcessingStats;
use crate::fetch::FetchEngine;
use crate::queue::RetryQueue;
use crate::reconcile::StatusReconciler;
use crate::scheduler::{Clock, ProcessingConfig, Scheduler, SystemClock};
use crate::storage::DocumentStore;

struct Running {
    token: CancellationToken,
    handle: JoinHandle<()>,
    scheduler: Arc<Scheduler>,
}

pub struct RetryEngine {
    store: Arc<dyn DocumentStore>,
    queue: Arc<dyn RetryQueue>,
    fetch: Arc<FetchEngine>,
    clock: Arc<dyn Clock>,
    running: Mutex<Option<Running>>,
}

impl RetryEngine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        queue: Arc<dyn RetryQueue>,
        fetch: Arc<FetchEngine>,
    ) -> Self {
        RetryEngine {
            store,
            queue,
            fetch,
            clock: Arc::new(SystemClock),
            running: Mutex::new(None),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn queue(&self) -> &Arc<dyn RetryQueue> {
        &self.queue
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// (Re)starts the scheduler with `config`.
    ///
    /// A running scheduler is always stopped first; with `retry_enabled` off
    /// no new one is started. Returns whether a scheduler is now running.
    pub async fn start_processing(&self, config: ProcessingConfig) -> bool {
        let mut running = self.running.lock().await;
        if let Some(previous) = running.take() {
            stop(previous).await;
        }
        if !config.retry_enabled {
            info!("Retry disabled, scheduler not started");
            return false;
        }

        let scheduler = Arc::new(
            Scheduler::new(
                Arc::clone(&self.queue),
                Arc::clone(&self.fetch),
                Arc::clone(&self.store),
                config,
            )
            .with_clock(Arc::clone(&self.clock)),
        );
        let token = CancellationToken::new();
        let handle = Arc::clone(&scheduler).start(token.clone());
        *running = Some(Running {
            token,
            handle,
            scheduler,
        });
        true
    }

    /// Stops the scheduler. Returns whether one was running.
    pub async fn stop_processing(&self) -> bool {
        match self.running.lock().await.take() {
            Some(running) => {
                stop(running).await;
                true
            }
            None => false,
        }
    }

    pub async fn is_processing(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Counters of the running scheduler.
    pub async fn stats(&self) -> Option<Arc<ProcessingStats>> {
        self.running
            .lock()
            .await
            .as_ref()
            .map(|running| running.scheduler.stats())
    }

    /// Starts the reconciler on the store's change feed.
    pub fn spawn_reconciler(&self, token: CancellationToken) -> JoinHandle<()> {
        let reconciler = Arc::new(StatusReconciler::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.store),
        ));
        reconciler.run(self.store.subscribe(), token)
    }
}

async fn stop(running: Running) {
    running.token.cancel();
    if let Err(e) = running.handle.await {
        warn!("Scheduler task ended abnormally: {e}");
    }
}
