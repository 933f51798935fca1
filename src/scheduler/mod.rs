//! Resubmission scheduler.
//!
//! Every tick fires after a delay drawn from `[interval_min, interval_max]`
//! and resubmits each `in-progress` queue item once (the fetch engine handles
//! the per-request retries). Ticks run as separate tasks and may overlap; the
//! queue rejects any transition a stale tick tries to apply.

mod clock;
mod expiry;
mod interval;
mod outcome;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use log::{debug, info, warn};
use serde_json::Value;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::classify::messages;
use crate::config::{DEFAULT_INTERVAL_MAX_MS, DEFAULT_INTERVAL_MIN_MS, KEY_UNAUTHORIZED};
use crate::error_handling::{ProcessingStats, QueueError};
use crate::fetch::{FetchEngine, FetchRequest};
use crate::models::{RetryObject, Status};
use crate::queue::{QueueItemPatch, RetryQueue};
use crate::storage::DocumentStore;

pub use clock::{Clock, FixedClock, SystemClock};
pub use expiry::{is_expired, parse_slot};
pub use interval::IntervalSampler;
pub use outcome::{map_outcome, Outcome};

/// Tick settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingConfig {
    pub interval_min: Duration,
    pub interval_max: Duration,
    pub retry_enabled: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            interval_min: Duration::from_millis(DEFAULT_INTERVAL_MIN_MS),
            interval_max: Duration::from_millis(DEFAULT_INTERVAL_MAX_MS),
            retry_enabled: true,
        }
    }
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// In-progress items picked up
    pub examined: usize,
    /// Items whose status or message was written
    pub updated: usize,
    /// Updates rejected because the item moved or vanished meanwhile
    pub stale: usize,
    pub expired: usize,
}

pub struct Scheduler {
    queue: Arc<dyn RetryQueue>,
    fetch: Arc<FetchEngine>,
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    sampler: Mutex<IntervalSampler>,
    config: ProcessingConfig,
    stats: Arc<ProcessingStats>,
}

enum ItemResult {
    Unchanged,
    Updated { expired: bool },
    Stale,
}

impl Scheduler {
    pub fn new(
        queue: Arc<dyn RetryQueue>,
        fetch: Arc<FetchEngine>,
        store: Arc<dyn DocumentStore>,
        config: ProcessingConfig,
    ) -> Self {
        Scheduler {
            queue,
            fetch,
            store,
            clock: Arc::new(SystemClock),
            sampler: Mutex::new(IntervalSampler::new()),
            config,
            stats: Arc::new(ProcessingStats::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sampler(mut self, sampler: IntervalSampler) -> Self {
        self.sampler = Mutex::new(sampler);
        self
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    pub fn stats(&self) -> Arc<ProcessingStats> {
        Arc::clone(&self.stats)
    }

    /// Delay before the next tick.
    pub fn next_interval(&self) -> Duration {
        match self.sampler.lock() {
            Ok(mut sampler) => sampler.sample(self.config.interval_min, self.config.interval_max),
            Err(poisoned) => poisoned
                .into_inner()
                .sample(self.config.interval_min, self.config.interval_max),
        }
    }

    /// Runs the tick loop until `token` is cancelled.
    ///
    /// Ticks still in flight at cancellation are allowed to finish.
    pub fn start(self: Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "Retry processing started (interval {:?}..={:?})",
                self.config.interval_min, self.config.interval_max
            );
            let mut ticks = JoinSet::new();
            loop {
                let delay = self.next_interval();
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
                while ticks.try_join_next().is_some() {}
                let scheduler = Arc::clone(&self);
                ticks.spawn(async move { scheduler.run_tick().await });
            }
            while ticks.join_next().await.is_some() {}
            info!("Retry processing stopped");
            self.stats.log_summary();
        })
    }

    async fn run_tick(&self) {
        match self.tick().await {
            Ok(report) if report.examined > 0 => debug!("Tick finished: {report:?}"),
            Ok(_) => {}
            Err(e) => warn!("Tick failed: {e}"),
        }
    }

    /// Resubmits every in-progress item once.
    pub async fn tick(&self) -> Result<TickReport, QueueError> {
        self.stats.increment_ticks();
        let items: Vec<RetryObject> = self
            .queue
            .get_queue()
            .await?
            .into_iter()
            .filter(|item| item.status.is_active())
            .collect();

        let mut report = TickReport {
            examined: items.len(),
            ..Default::default()
        };
        let results = join_all(items.iter().map(|item| self.process_item(item))).await;
        for result in results {
            match result {
                ItemResult::Unchanged => {}
                ItemResult::Updated { expired } => {
                    report.updated += 1;
                    if expired {
                        report.expired += 1;
                    }
                }
                ItemResult::Stale => report.stale += 1,
            }
        }
        Ok(report)
    }

    async fn process_item(&self, item: &RetryObject) -> ItemResult {
        if is_expired(&item.end_slot, self.clock.now()) {
            debug!("Slot of {} ended at {}, expiring", item.id, item.end_slot);
            let patch = QueueItemPatch::status_with_message(Status::Expired, messages::SLOT_EXPIRED)
                .if_status(item.status);
            return match self.apply(item, patch).await {
                ItemResult::Updated { .. } => ItemResult::Updated { expired: true },
                other => other,
            };
        }

        let request = FetchRequest::from_retry_object(item).mark_self_originated();
        let result = self.fetch.fetch_request(&request).await;
        if let Err(error) = &result {
            self.stats.increment_failure(error.kind);
        }

        let outcome = map_outcome(item, &result);
        if outcome.lost_authorization {
            info!("Session rejected while resubmitting {}, pausing for re-login", item.id);
            if let Err(e) = self.store.set(KEY_UNAUTHORIZED, Value::Bool(true)).await {
                warn!("Failed to raise unauthorized flag: {e}");
            }
        }

        let next = outcome.next;
        let mut patch = QueueItemPatch::default().if_status(item.status);
        if next.status != item.status {
            patch.status = Some(next.status);
        }
        if next.status_message != item.status_message {
            patch.status_message = Some(next.status_message);
        }
        if patch.is_empty() {
            return ItemResult::Unchanged;
        }
        self.apply(item, patch).await
    }

    async fn apply(&self, item: &RetryObject, patch: QueueItemPatch) -> ItemResult {
        let status = patch.status;
        match self.queue.update_queue_item(&item.id, patch).await {
            Ok(updated) => {
                if let Some(status) = status {
                    self.stats.increment_status(status);
                    info!("{} ({}) is now {}", updated.id, updated.tv_app_id, status);
                }
                ItemResult::Updated { expired: false }
            }
            Err(
                e @ (QueueError::InvalidTransition { .. }
                | QueueError::StatusChanged { .. }
                | QueueError::NotFound(_)),
            ) => {
                debug!("Discarding stale result for {}: {e}", item.id);
                ItemResult::Stale
            }
            Err(e) => {
                warn!("Failed to update {}: {e}", item.id);
                ItemResult::Unchanged
            }
        }
    }
}
