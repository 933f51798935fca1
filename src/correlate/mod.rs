//! Request correlation.
//!
//! When the page reports that a booking failed (or went through), the
//! correlator picks the cached headers of that submission, joins them with the
//! cached body of the same request id, enriches the result with driver and slot
//! metadata, and enqueues it as a [`RetryObject`].
//!
//! Without an explicit request id on the trigger the most recently captured
//! headers are used, which assumes a single outstanding submission.

mod driver;
mod normalize;
mod slots;

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{KEY_REQUEST_CACHE_BODY, KEY_REQUEST_CACHE_HEADERS, KEY_TABLE_DATA};
use crate::error_handling::CorrelationError;
use crate::models::{latest, BodyCache, HeaderCache, RetryObject, Status, TableData};
use crate::queue::RetryQueue;
use crate::storage::{cleanup_cache, load, DocumentStore};

pub use driver::{DriverInfo, DriverLookup, QueueDriverLookup};
pub use normalize::{normalize_form, tv_app_id};
pub use slots::find_row;

/// What the page reported about the last submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerKind {
    Failed,
    Succeeded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub kind: TriggerKind,
    /// Request to correlate; the latest capture when absent
    pub request_id: Option<String>,
}

impl Trigger {
    pub fn failed() -> Self {
        Trigger {
            kind: TriggerKind::Failed,
            request_id: None,
        }
    }

    pub fn succeeded() -> Self {
        Trigger {
            kind: TriggerKind::Succeeded,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    fn initial_status(&self) -> Status {
        match self.kind {
            TriggerKind::Failed => Status::InProgress,
            TriggerKind::Succeeded => Status::Success,
        }
    }
}

pub struct RequestCorrelator {
    store: Arc<dyn DocumentStore>,
    queue: Arc<dyn RetryQueue>,
    drivers: Arc<dyn DriverLookup>,
}

impl RequestCorrelator {
    pub fn new(store: Arc<dyn DocumentStore>, queue: Arc<dyn RetryQueue>) -> Self {
        RequestCorrelator {
            store,
            queue,
            drivers: Arc::new(QueueDriverLookup),
        }
    }

    pub fn with_driver_lookup(mut self, drivers: Arc<dyn DriverLookup>) -> Self {
        self.drivers = drivers;
        self
    }

    /// Builds and enqueues the retry object for `trigger`.
    ///
    /// Returns `None` when nothing could be correlated; the caches are left
    /// intact in that case so the next trigger can try again.
    pub async fn correlate(&self, trigger: Trigger) -> Option<RetryObject> {
        match self.try_correlate(&trigger).await {
            Ok(item) => Some(item),
            Err(
                e @ (CorrelationError::MissingHeaders
                | CorrelationError::MissingBody(_)
                | CorrelationError::MissingTvAppId(_)),
            ) => {
                debug!("Nothing to correlate for {:?}: {e}", trigger.kind);
                None
            }
            Err(e) => {
                warn!("Correlation for {:?} aborted: {e}", trigger.kind);
                None
            }
        }
    }

    async fn try_correlate(&self, trigger: &Trigger) -> Result<RetryObject, CorrelationError> {
        let store = self.store.as_ref();
        let header_cache: HeaderCache = load(store, KEY_REQUEST_CACHE_HEADERS).await?;
        let headers = match &trigger.request_id {
            Some(id) => header_cache.get(id),
            None => latest(&header_cache),
        }
        .ok_or(CorrelationError::MissingHeaders)?;

        let body_cache: BodyCache = load(store, KEY_REQUEST_CACHE_BODY).await?;
        let body = body_cache
            .get(&headers.request_id)
            .ok_or_else(|| CorrelationError::MissingBody(headers.request_id.clone()))?;
        let tv_app_id = tv_app_id(&body.body)
            .ok_or_else(|| CorrelationError::MissingTvAppId(headers.request_id.clone()))?;

        let snapshot = self.queue.get_queue().await?;
        let driver = match self.drivers.driver_and_container(&tv_app_id, &snapshot).await {
            Ok(info) => info,
            Err(e) => {
                debug!("Driver lookup for {tv_app_id} failed: {e:#}");
                DriverInfo::default()
            }
        };

        let now = Utc::now().timestamp_millis();
        let mut item = RetryObject {
            id: generate_id(now),
            tv_app_id,
            driver_name: driver.driver_name,
            container_number: driver.container_number,
            current_slot: String::new(),
            start_slot: String::new(),
            end_slot: String::new(),
            status: trigger.initial_status(),
            status_message: String::new(),
            headers_cache: headers.headers.clone(),
            original_body: normalize_form(&body.body),
            request_url: headers.url.clone(),
            created_at: now,
            updated_at: now,
        };
        self.apply_table_slot(&mut item).await;

        self.queue.add_to_queue(item.clone()).await?;
        info!(
            "Queued {} for {} as {} (slot {:?})",
            item.id, item.tv_app_id, item.status, item.current_slot
        );
        if let Err(e) = cleanup_cache(store).await {
            warn!("Failed to clear request caches after queueing {}: {e}", item.id);
        }
        Ok(item)
    }

    /// Backfills slot and container from the page table, when one matches.
    async fn apply_table_slot(&self, item: &mut RetryObject) {
        let table: TableData = match load(self.store.as_ref(), KEY_TABLE_DATA).await {
            Ok(table) => table,
            Err(e) => {
                debug!("Ignoring unreadable table data: {e}");
                return;
            }
        };
        let Some(row) = find_row(&table, &item.container_number, &item.tv_app_id) else {
            return;
        };
        if item.current_slot.is_empty() {
            item.current_slot = row.slot();
        }
        if item.start_slot.is_empty() && !row.start.is_empty() {
            item.start_slot = row.slot();
        }
        if item.end_slot.is_empty() && !row.end.is_empty() {
            item.end_slot = format!("{} {}", row.date, row.end).trim().to_string();
        }
        if item.container_number.is_empty() {
            item.container_number = row.container_number;
        }
    }
}

/// Millisecond timestamp plus a random suffix, unique across a burst of
/// correlations in the same millisecond.
fn generate_id(now_ms: i64) -> String {
    let suffix: u32 = rand::rng().random();
    format!("{now_ms}-{suffix:08x}")
}
