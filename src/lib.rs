//! booking_retry library: correlation and retry engine for terminal bookings
//!
//! Captured booking submissions (form body and request headers, reported by a
//! browser extension) are correlated into queue items when the page reports a
//! failure. A scheduler resubmits queued items on a randomized interval with
//! exponential backoff and classifies each response into the item's next
//! status. Items parked by a lost session resume when authorization returns.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use booking_retry::app::Message;
//! use booking_retry::run::init_services;
//! use booking_retry::storage::MemoryStore;
//! use booking_retry::Config;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let services = init_services(&Config::default(), Arc::new(MemoryStore::new()))?;
//! let reply = services
//!     .dispatcher
//!     .dispatch(Message::BookingFailed { request_id: None })
//!     .await?;
//! println!("{reply:?}");
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime.

pub mod app;
pub mod capture;
pub mod classify;
pub mod cli;
pub mod config;
pub mod correlate;
pub mod error_handling;
pub mod fetch;
pub mod initialization;
pub mod models;
pub mod queue;
pub mod reconcile;
pub mod run;
pub mod scheduler;
pub mod storage;

// Re-export public API
pub use config::{Config, ConfigValidationError, LogFormat, LogLevel};
pub use models::{RetryObject, Status};
pub use queue::{QueueItemPatch, RetryQueue};
pub use run::{run_service, RunReport};
pub use storage::run_migrations;
