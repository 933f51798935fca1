//! Toolbar badge rendering.

use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::KEY_RETRY_QUEUE;
use crate::models::Status;
use crate::storage::{load, DocumentStore};

/// The only part of a queue item the badge needs.
#[derive(Debug, Default, Deserialize)]
struct QueuedStatus {
    #[serde(default)]
    status: Status,
}

fn statuses_of(items: Vec<QueuedStatus>) -> Vec<Status> {
    items.into_iter().map(|item| item.status).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeColor {
    Red,
    Green,
    Blue,
}

impl BadgeColor {
    pub fn as_hex(&self) -> &'static str {
        match self {
            BadgeColor::Red => "#FF0000",
            BadgeColor::Green => "#00C853",
            BadgeColor::Blue => "#2962FF",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    /// Number of in-progress items, empty when there are none
    pub text: String,
    pub color: BadgeColor,
}

impl Badge {
    pub fn for_statuses(statuses: &[Status]) -> Self {
        let in_progress = statuses.iter().filter(|s| s.is_active()).count();
        let text = if in_progress == 0 {
            String::new()
        } else {
            in_progress.to_string()
        };
        let color = if statuses.contains(&Status::AuthorizationError) {
            BadgeColor::Red
        } else if !statuses.is_empty() && statuses.iter().all(|s| *s == Status::Success) {
            BadgeColor::Green
        } else {
            BadgeColor::Blue
        };
        Badge { text, color }
    }
}

/// Where badges are displayed.
pub trait BadgeSink: Send + Sync {
    fn show(&self, badge: &Badge);
}

/// Writes badge changes to the log.
pub struct LogBadgeSink;

impl BadgeSink for LogBadgeSink {
    fn show(&self, badge: &Badge) {
        info!("Badge: {:?} {}", badge.text, badge.color.as_hex());
    }
}

/// Remembers the last rendered badge and only pushes changes to the sink.
pub struct BadgeController {
    sink: Arc<dyn BadgeSink>,
    last: Mutex<Option<Badge>>,
}

impl BadgeController {
    pub fn new(sink: Arc<dyn BadgeSink>) -> Self {
        BadgeController {
            sink,
            last: Mutex::new(None),
        }
    }

    /// Shows the badge for `statuses` unless it equals the last one shown.
    ///
    /// Returns the badge shown, or `None` when nothing changed.
    pub fn render(&self, statuses: &[Status]) -> Option<Badge> {
        let badge = Badge::for_statuses(statuses);
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if last.as_ref() == Some(&badge) {
            return None;
        }
        self.sink.show(&badge);
        *last = Some(badge.clone());
        Some(badge)
    }

    pub fn last(&self) -> Option<Badge> {
        self.last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn render_stored(&self, store: &dyn DocumentStore) {
        match load::<Vec<QueuedStatus>>(store, KEY_RETRY_QUEUE).await {
            Ok(items) => {
                self.render(&statuses_of(items));
            }
            Err(e) => warn!("Failed to read queue for badge: {e}"),
        }
    }

    /// Re-renders on every write of the retry queue until `token` is cancelled,
    /// starting from the stored queue.
    pub fn follow(
        self: Arc<Self>,
        store: Arc<dyn DocumentStore>,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        let mut changes = store.subscribe();
        tokio::spawn(async move {
            self.render_stored(store.as_ref()).await;
            loop {
                let change = tokio::select! {
                    _ = token.cancelled() => break,
                    change = changes.recv() => change,
                };
                match change {
                    Ok(change) if change.key == KEY_RETRY_QUEUE => {
                        let items = change
                            .new
                            .map(serde_json::from_value::<Vec<QueuedStatus>>)
                            .unwrap_or_else(|| Ok(Vec::new()));
                        match items {
                            Ok(items) => {
                                self.render(&statuses_of(items));
                            }
                            Err(e) => warn!("Undecodable queue write, badge unchanged: {e}"),
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(_)) => self.render_stored(store.as_ref()).await,
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Badge follower stopped");
        })
    }
}
