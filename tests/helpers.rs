// Shared test helpers for store setup and test data creation.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map};

use booking_retry::capture::{BeforeRequestEvent, SendHeadersEvent};
use booking_retry::fetch::{FetchEngine, RetryConfig};
use booking_retry::models::{FormSnapshot, HeaderEntry};
use booking_retry::storage::SqliteStore;
use booking_retry::{RetryObject, Status};

/// Booking submission path accepted by the default capture pattern.
#[allow(dead_code)] // Used by other test files
pub const SUBMIT_PATH: &str = "/TVApp/EditTvAppSubmit/1";

/// Opens a file-backed store with migrations applied.
#[allow(dead_code)] // Used by other test files
pub async fn create_sqlite_store(db_path: &Path) -> Arc<SqliteStore> {
    Arc::new(
        SqliteStore::open(db_path)
            .await
            .expect("Failed to open SQLite store"),
    )
}

/// Fetch engine with millisecond backoff so retry tests stay fast.
#[allow(dead_code)] // Used by other test files
pub fn fast_fetch_engine(max_attempts: u32) -> Arc<FetchEngine> {
    Arc::new(FetchEngine::new(
        Arc::new(reqwest::Client::new()),
        RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        },
    ))
}

/// Builds a queue item posting to `url`.
#[allow(dead_code)] // Used by other test files
pub fn create_test_item(id: &str, url: &str, status: Status) -> RetryObject {
    let mut body = Map::new();
    body.insert("TvAppId".to_string(), json!(format!("TV-{id}")));
    body.insert("SlotId".to_string(), json!("5"));
    RetryObject {
        id: id.to_string(),
        tv_app_id: format!("TV-{id}"),
        driver_name: String::new(),
        container_number: String::new(),
        current_slot: String::new(),
        start_slot: String::new(),
        end_slot: String::new(),
        status,
        status_message: String::new(),
        headers_cache: vec![HeaderEntry::new("Cookie", "session=abc")],
        original_body: body,
        request_url: url.to_string(),
        created_at: 0,
        updated_at: 0,
    }
}

/// A captured POST of the booking form.
#[allow(dead_code)] // Used by other test files
pub fn body_event(request_id: &str, url: &str, tv_app_id: &str) -> BeforeRequestEvent {
    let mut form = FormSnapshot::new();
    form.insert("TvAppId".to_string(), vec![tv_app_id.to_string()]);
    form.insert("SlotId".to_string(), vec!["5".to_string()]);
    BeforeRequestEvent {
        request_id: request_id.to_string(),
        url: url.to_string(),
        method: "POST".to_string(),
        form_data: Some(form),
    }
}

/// The headers that accompany [`body_event`].
#[allow(dead_code)] // Used by other test files
pub fn headers_event(request_id: &str, url: &str, cookie: &str) -> SendHeadersEvent {
    SendHeadersEvent {
        request_id: request_id.to_string(),
        url: url.to_string(),
        request_headers: vec![
            HeaderEntry::new("Cookie", cookie),
            HeaderEntry::new("Content-Type", "application/x-www-form-urlencoded"),
        ],
    }
}
