//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions for every layer (store, queue, capture, correlation)
//! - The fetch failure taxonomy and its categorization helpers
//! - Processing statistics tracking (fetch failures, applied statuses)
//!
//! Propagation policy: capture and correlation errors never leave their
//! component, fetch failures are returned as values, and queue errors are the
//! only ones propagated to callers.

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{classify_http_failure, describe_reqwest_error, is_retryable_status};
pub use stats::ProcessingStats;
pub use types::{
    CaptureError, CorrelationError, FetchErrorKind, InitializationError, QueueError, StoreError,
};
