//! End-to-end capture and correlation over a file-backed store.

mod helpers;

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use booking_retry::capture::{RequestCapture, UrlPattern};
use booking_retry::config::{DEFAULT_BOOKING_URL_PATTERN, KEY_REQUEST_CACHE_BODY, KEY_TABLE_DATA};
use booking_retry::correlate::{RequestCorrelator, Trigger};
use booking_retry::queue::StoreRetryQueue;
use booking_retry::storage::DocumentStore;
use booking_retry::{RetryQueue, Status};

use helpers::{body_event, create_sqlite_store, headers_event};

const URL: &str = "https://terminal.example/TVApp/EditTvAppSubmit/1";

#[tokio::test]
async fn test_captured_submission_becomes_queue_item() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = create_sqlite_store(&dir.path().join("flow.db")).await;
    let pattern = UrlPattern::new(DEFAULT_BOOKING_URL_PATTERN).unwrap();
    let capture = RequestCapture::new(store.clone(), pattern);
    let queue = Arc::new(StoreRetryQueue::new(store.clone()));
    let correlator = RequestCorrelator::new(store.clone(), queue.clone());

    capture.on_before_request(body_event("41", URL, "TV-41")).await;
    capture
        .on_before_send_headers(headers_event("41", URL, "session=41"))
        .await;

    let item = correlator
        .correlate(Trigger::failed())
        .await
        .expect("captured submission should correlate");
    assert_eq!(item.tv_app_id, "TV-41");
    assert_eq!(item.status, Status::InProgress);
    assert_eq!(item.request_url, URL);
    assert_eq!(item.original_body["SlotId"], json!("5"));
    assert!(item
        .headers_cache
        .iter()
        .any(|h| h.name == "Cookie" && h.value == "session=41"));

    let body_cache = store.get(KEY_REQUEST_CACHE_BODY).await.unwrap();
    assert_eq!(body_cache, Some(json!({})), "caches are purged after enqueue");
}

#[tokio::test]
async fn test_queue_survives_reopen() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("persist.db");

    {
        let store = create_sqlite_store(&db_path).await;
        let capture = RequestCapture::new(
            store.clone(),
            UrlPattern::new(DEFAULT_BOOKING_URL_PATTERN).unwrap(),
        );
        let queue = Arc::new(StoreRetryQueue::new(store.clone()));
        let correlator = RequestCorrelator::new(store.clone(), queue);
        capture.on_before_request(body_event("1", URL, "TV-1")).await;
        capture
            .on_before_send_headers(headers_event("1", URL, "session=1"))
            .await;
        correlator.correlate(Trigger::succeeded()).await.unwrap();
    }

    let store = create_sqlite_store(&db_path).await;
    let items = StoreRetryQueue::new(store).get_queue().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].tv_app_id, "TV-1");
    assert_eq!(items[0].status, Status::Success);
}

#[tokio::test]
async fn test_explicit_request_id_selects_tab() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = create_sqlite_store(&dir.path().join("tabs.db")).await;
    let capture = RequestCapture::new(
        store.clone(),
        UrlPattern::new(DEFAULT_BOOKING_URL_PATTERN).unwrap(),
    );
    let queue = Arc::new(StoreRetryQueue::new(store.clone()));
    let correlator = RequestCorrelator::new(store.clone(), queue);

    for (id, tv) in [("a", "TV-A"), ("b", "TV-B")] {
        capture.on_before_request(body_event(id, URL, tv)).await;
        capture
            .on_before_send_headers(headers_event(id, URL, &format!("session={id}")))
            .await;
    }

    let item = correlator
        .correlate(Trigger::failed().with_request_id("a"))
        .await
        .unwrap();
    assert_eq!(item.tv_app_id, "TV-A");
    assert_eq!(item.headers_cache[0].value, "session=a");
}

#[tokio::test]
async fn test_table_backfills_slot_and_container() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = create_sqlite_store(&dir.path().join("table.db")).await;
    store
        .set(
            KEY_TABLE_DATA,
            json!([
                ["Status", "ID", "Date", "Start", "End", "Container Number"],
                ["Active", "TV-7", "2024-05-10", "08:00", "10:00", "MSCU7654321"],
            ]),
        )
        .await
        .unwrap();
    let capture = RequestCapture::new(
        store.clone(),
        UrlPattern::new(DEFAULT_BOOKING_URL_PATTERN).unwrap(),
    );
    let queue = Arc::new(StoreRetryQueue::new(store.clone()));
    let correlator = RequestCorrelator::new(store.clone(), queue);

    capture.on_before_request(body_event("7", URL, "TV-7")).await;
    capture
        .on_before_send_headers(headers_event("7", URL, "session=7"))
        .await;

    let item = correlator.correlate(Trigger::failed()).await.unwrap();
    assert_eq!(item.container_number, "MSCU7654321");
    assert_eq!(item.end_slot, "2024-05-10 10:00");
    assert!(!item.current_slot.is_empty());
}

#[tokio::test]
async fn test_trigger_without_capture_enqueues_nothing() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = create_sqlite_store(&dir.path().join("empty.db")).await;
    let queue = Arc::new(StoreRetryQueue::new(store.clone()));
    let correlator = RequestCorrelator::new(store.clone(), queue.clone());

    assert!(correlator.correlate(Trigger::failed()).await.is_none());
    assert!(queue.get_queue().await.unwrap().is_empty());
}
