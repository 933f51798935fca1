//! Error-log collaborator for final fetch failures.
//!
//! Recording is best-effort: the engine logs and swallows sink failures.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::response::FetchError;
use crate::config::{ERROR_LOG_CAPACITY, KEY_ERROR_LOG};
use crate::storage::{load, save, DocumentStore};

/// One final failure, as recorded in the error log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLogEntry {
    pub url: String,
    pub kind: String,
    pub status: Option<u16>,
    pub message: String,
    pub attempt: u32,
    pub logged_at: i64,
}

impl ErrorLogEntry {
    pub fn from_error(url: &str, error: &FetchError) -> Self {
        ErrorLogEntry {
            url: url.to_string(),
            kind: error.kind.as_str().to_string(),
            status: error.status,
            message: error
                .original_error
                .clone()
                .unwrap_or_else(|| error.message.clone()),
            attempt: error.attempt,
            logged_at: Utc::now().timestamp_millis(),
        }
    }
}

#[async_trait]
pub trait ErrorLogSink: Send + Sync {
    async fn record(&self, entry: ErrorLogEntry) -> anyhow::Result<()>;
}

/// Discards every entry.
pub struct NoopErrorLog;

#[async_trait]
impl ErrorLogSink for NoopErrorLog {
    async fn record(&self, _entry: ErrorLogEntry) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Appends entries to the `errorLog` document, keeping the newest
/// `ERROR_LOG_CAPACITY` entries.
pub struct StoreErrorLog {
    store: Arc<dyn DocumentStore>,
}

impl StoreErrorLog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ErrorLogSink for StoreErrorLog {
    async fn record(&self, entry: ErrorLogEntry) -> anyhow::Result<()> {
        let mut entries: Vec<ErrorLogEntry> = load(self.store.as_ref(), KEY_ERROR_LOG).await?;
        entries.push(entry);
        if entries.len() > ERROR_LOG_CAPACITY {
            let excess = entries.len() - ERROR_LOG_CAPACITY;
            entries.drain(..excess);
        }
        save(self.store.as_ref(), KEY_ERROR_LOG, &entries).await?;
        Ok(())
    }
}
