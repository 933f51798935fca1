//! Run summary.

use std::collections::BTreeMap;
use std::path::PathBuf;

use log::info;

use crate::models::RetryObject;

/// Outcome of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Queue items by status name at shutdown
    pub by_status: BTreeMap<String, usize>,
    /// Scheduler ticks executed
    pub ticks: usize,
    pub db_path: PathBuf,
    pub elapsed_seconds: f64,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.by_status.values().sum()
    }
}

/// Counts queue items per status.
pub fn summarize_queue(items: &[RetryObject]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for item in items {
        *counts.entry(item.status.as_str().to_string()).or_insert(0) += 1;
    }
    counts
}

pub(crate) fn log_queue_summary(counts: &BTreeMap<String, usize>) {
    if counts.is_empty() {
        info!("Retry queue is empty");
        return;
    }
    let parts: Vec<String> = counts.iter().map(|(s, n)| format!("{s}={n}")).collect();
    info!("Retry queue: {}", parts.join(", "));
}
