//! Message dispatch.
//!
//! Messages from the page and popup arrive as JSON objects tagged by their
//! `action` field and decode into the closed [`Message`] enum.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::badge::BadgeController;
use super::engine::RetryEngine;
use crate::config::KEY_UNAUTHORIZED;
use crate::correlate::{RequestCorrelator, Trigger};
use crate::error_handling::QueueError;
use crate::models::{RetryObject, Status};
use crate::queue::QueueItemPatch;
use crate::scheduler::ProcessingConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Message {
    BookingFailed {
        #[serde(default)]
        request_id: Option<String>,
    },
    BookingSucceeded {
        #[serde(default)]
        request_id: Option<String>,
    },
    /// Intervals in milliseconds
    StartProcessing {
        interval_min: u64,
        interval_max: u64,
        retry_enabled: bool,
    },
    StopProcessing,
    GetQueue,
    RemoveFromQueue {
        id: String,
    },
    RemoveMultipleFromQueue {
        ids: Vec<String>,
    },
    UpdateQueueItem {
        id: String,
        patch: QueueItemPatch,
    },
    PauseItem {
        id: String,
    },
    ResumeItem {
        id: String,
    },
    SetUnauthorized {
        value: bool,
    },
}

impl Message {
    /// Whether handling the message can change the queue.
    fn changes_queue(&self) -> bool {
        !matches!(
            self,
            Message::StartProcessing { .. }
                | Message::StopProcessing
                | Message::GetQueue
                | Message::SetUnauthorized { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Reply {
    Ack,
    Queue(Vec<RetryObject>),
    Enqueued(Option<RetryObject>),
    Removed(Vec<String>),
}

pub struct Dispatcher {
    engine: Arc<RetryEngine>,
    correlator: Arc<RequestCorrelator>,
    badge: Arc<BadgeController>,
}

impl Dispatcher {
    pub fn new(
        engine: Arc<RetryEngine>,
        correlator: Arc<RequestCorrelator>,
        badge: Arc<BadgeController>,
    ) -> Self {
        Dispatcher {
            engine,
            correlator,
            badge,
        }
    }

    /// Decodes a JSON message and dispatches it.
    pub async fn dispatch_json(&self, raw: &str) -> anyhow::Result<Reply> {
        let message: Message = serde_json::from_str(raw)?;
        Ok(self.dispatch(message).await?)
    }

    pub async fn dispatch(&self, message: Message) -> Result<Reply, QueueError> {
        debug!("Dispatching {message:?}");
        let refresh_badge = message.changes_queue();
        let queue = self.engine.queue();

        let reply = match message {
            Message::BookingFailed { request_id } => {
                let trigger = with_request_id(Trigger::failed(), request_id);
                Reply::Enqueued(self.correlator.correlate(trigger).await)
            }
            Message::BookingSucceeded { request_id } => {
                let trigger = with_request_id(Trigger::succeeded(), request_id);
                Reply::Enqueued(self.correlator.correlate(trigger).await)
            }
            Message::StartProcessing {
                interval_min,
                interval_max,
                retry_enabled,
            } => {
                let config = processing_config(interval_min, interval_max, retry_enabled);
                self.engine.start_processing(config).await;
                Reply::Ack
            }
            Message::StopProcessing => {
                self.engine.stop_processing().await;
                Reply::Ack
            }
            Message::GetQueue => Reply::Queue(queue.get_queue().await?),
            Message::RemoveFromQueue { id } => {
                let removed = queue.remove_from_queue(&id).await?;
                Reply::Removed(vec![removed.id])
            }
            Message::RemoveMultipleFromQueue { ids } => {
                Reply::Removed(queue.remove_multiple_from_queue(&ids).await?)
            }
            Message::UpdateQueueItem { id, patch } => {
                queue.update_queue_item(&id, patch).await?;
                Reply::Ack
            }
            Message::PauseItem { id } => {
                queue
                    .update_queue_item(&id, QueueItemPatch::status(Status::Paused))
                    .await?;
                Reply::Ack
            }
            Message::ResumeItem { id } => {
                queue
                    .update_queue_item(&id, QueueItemPatch::status(Status::InProgress))
                    .await?;
                Reply::Ack
            }
            Message::SetUnauthorized { value } => {
                self.engine
                    .store()
                    .set(KEY_UNAUTHORIZED, Value::Bool(value))
                    .await?;
                Reply::Ack
            }
        };

        if refresh_badge {
            self.refresh_badge().await;
        }
        Ok(reply)
    }

    async fn refresh_badge(&self) {
        match self.engine.queue().get_queue().await {
            Ok(items) => {
                let statuses: Vec<Status> = items.iter().map(|item| item.status).collect();
                self.badge.render(&statuses);
            }
            Err(e) => warn!("Failed to read queue for badge: {e}"),
        }
    }
}

fn with_request_id(trigger: Trigger, request_id: Option<String>) -> Trigger {
    match request_id {
        Some(id) => trigger.with_request_id(id),
        None => trigger,
    }
}

/// Intervals arrive in milliseconds; an inverted range collapses to its minimum.
fn processing_config(interval_min: u64, interval_max: u64, retry_enabled: bool) -> ProcessingConfig {
    let interval_min = interval_min.max(1);
    if interval_max < interval_min {
        warn!("Interval max {interval_max}ms is below min {interval_min}ms, using min");
    }
    ProcessingConfig {
        interval_min: Duration::from_millis(interval_min),
        interval_max: Duration::from_millis(interval_max.max(interval_min)),
        retry_enabled,
    }
}
