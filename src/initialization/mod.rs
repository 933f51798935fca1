//! Application initialization and resource setup.
//!
//! This module provides functions to initialize shared resources:
//! - Logger (plain or JSON)
//! - HTTP client used for resubmissions
//! - Document store (SQLite file or in memory)

mod client;
mod logger;

use std::path::Path;
use std::sync::Arc;

use crate::error_handling::StoreError;
use crate::storage::{DocumentStore, SqliteStore};

// Re-export public API
pub use client::init_client;
pub use logger::{format_json_line, init_logger_with};

/// Opens the SQLite document store at `path`, creating and migrating it as needed.
pub async fn init_store(path: &Path) -> Result<Arc<dyn DocumentStore>, StoreError> {
    let store = SqliteStore::open(path).await?;
    Ok(Arc::new(store))
}
