//! Processing statistics tracking.
//!
//! Thread-safe counters for fetch failures and applied status updates, shared by
//! overlapping scheduler ticks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::FetchErrorKind;
use crate::models::Status;

/// Thread-safe processing statistics tracker.
///
/// All categories are initialized to zero on creation, so lookups never miss.
/// Share across tasks with `Arc`.
pub struct ProcessingStats {
    failures: HashMap<FetchErrorKind, AtomicUsize>,
    statuses: HashMap<Status, AtomicUsize>,
    ticks: AtomicUsize,
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStats {
    pub fn new() -> Self {
        let failures = FetchErrorKind::iter()
            .map(|kind| (kind, AtomicUsize::new(0)))
            .collect();
        let statuses = Status::iter()
            .map(|status| (status, AtomicUsize::new(0)))
            .collect();

        ProcessingStats {
            failures,
            statuses,
            ticks: AtomicUsize::new(0),
        }
    }

    /// Records one failed resubmission (after all attempts).
    pub fn increment_failure(&self, kind: FetchErrorKind) {
        if let Some(counter) = self.failures.get(&kind) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!("Failure kind {:?} missing from stats map", kind);
        }
    }

    /// Records one status update applied to the queue.
    pub fn increment_status(&self, status: Status) {
        if let Some(counter) = self.statuses.get(&status) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!("Status {:?} missing from stats map", status);
        }
    }

    /// Records one completed scheduler tick.
    pub fn increment_ticks(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_failure_count(&self, kind: FetchErrorKind) -> usize {
        self.failures
            .get(&kind)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn get_status_count(&self, status: Status) -> usize {
        self.statuses
            .get(&status)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn ticks(&self) -> usize {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn total_failures(&self) -> usize {
        FetchErrorKind::iter()
            .map(|k| self.get_failure_count(k))
            .sum()
    }

    pub fn total_status_updates(&self) -> usize {
        Status::iter().map(|s| self.get_status_count(s)).sum()
    }

    /// Logs a summary of non-zero counters at info level.
    pub fn log_summary(&self) {
        log::info!(
            "Processed {} tick(s): {} status update(s), {} failed resubmission(s)",
            self.ticks(),
            self.total_status_updates(),
            self.total_failures()
        );
        for status in Status::iter() {
            let count = self.get_status_count(status);
            if count > 0 {
                log::info!("   {status}: {count}");
            }
        }
        for kind in FetchErrorKind::iter() {
            let count = self.get_failure_count(kind);
            if count > 0 {
                log::info!("   {kind}: {count}");
            }
        }
    }
}
