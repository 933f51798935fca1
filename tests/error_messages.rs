//! Tests to ensure error messages are actionable and consistent
//!
//! These tests verify that error messages name the offending value and, where
//! a range applies, what is accepted.

mod helpers;

use std::sync::Arc;

use booking_retry::error_handling::QueueError;
use booking_retry::queue::StoreRetryQueue;
use booking_retry::storage::MemoryStore;
use booking_retry::{Config, QueueItemPatch, RetryQueue, Status};

use helpers::create_test_item;

#[test]
fn test_config_validation_errors_are_descriptive() {
    let config = Config {
        timeout_seconds: 0,
        ..Default::default()
    };
    let err = config.validate().unwrap_err();
    assert_eq!(err.field, "timeout_seconds");
    assert!(err.message.contains("greater than 0"));

    let config = Config {
        max_attempts: 0,
        ..Default::default()
    };
    let err = config.validate().unwrap_err();
    assert_eq!(err.field, "max_attempts");
    assert!(err.message.contains("between 1 and"));

    let config = Config {
        interval_min_ms: 9_000,
        interval_max_ms: 3_000,
        ..Default::default()
    };
    let err = config.validate().unwrap_err();
    assert!(
        err.to_string().contains("9000 > 3000"),
        "message should show both bounds: {err}"
    );
}

#[test]
fn test_pattern_error_shows_example() {
    let config = Config {
        booking_url_pattern: String::new(),
        ..Default::default()
    };
    let err = config.validate().unwrap_err();
    assert!(err.message.contains("EditTvAppSubmit"));
}

#[tokio::test]
async fn test_queue_errors_name_the_item() {
    let queue = StoreRetryQueue::new(Arc::new(MemoryStore::new()));

    let err = queue.remove_from_queue("ghost").await.unwrap_err();
    assert!(matches!(err, QueueError::NotFound(_)));
    assert_eq!(err.to_string(), "queue item ghost not found");

    queue
        .add_to_queue(create_test_item("1", "https://t.example/x", Status::Success))
        .await
        .unwrap();
    let err = queue
        .add_to_queue(create_test_item("1", "https://t.example/x", Status::InProgress))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "queue item 1 already exists");

    let err = queue
        .update_queue_item("1", QueueItemPatch::status(Status::InProgress))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "queue item 1: transition success -> in-progress is not allowed"
    );
}

#[tokio::test]
async fn test_stale_conditional_patch_names_both_statuses() {
    let queue = StoreRetryQueue::new(Arc::new(MemoryStore::new()));
    queue
        .add_to_queue(create_test_item("1", "https://t.example/x", Status::Paused))
        .await
        .unwrap();

    let err = queue
        .update_queue_item(
            "1",
            QueueItemPatch::status(Status::Success).if_status(Status::InProgress),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "queue item 1 is paused, expected in-progress"
    );
}
