//! Service initialization.

use std::sync::Arc;

use anyhow::{Context, Result};

use super::resources::Services;
use crate::app::{BadgeController, Dispatcher, LogBadgeSink, RetryEngine};
use crate::capture::{RequestCapture, UrlPattern};
use crate::config::Config;
use crate::correlate::RequestCorrelator;
use crate::fetch::{FetchEngine, StoreErrorLog};
use crate::initialization::init_client;
use crate::queue::StoreRetryQueue;
use crate::storage::DocumentStore;

/// Wires every component on top of `store`.
///
/// # Errors
///
/// Fails when the configuration is invalid or the HTTP client cannot be built.
pub fn init_services(config: &Config, store: Arc<dyn DocumentStore>) -> Result<Services> {
    config.validate().context("Invalid configuration")?;

    let client = init_client(config).context("Failed to initialize HTTP client")?;
    let fetch = Arc::new(
        FetchEngine::new(client, config.retry_config())
            .with_error_log(Arc::new(StoreErrorLog::new(Arc::clone(&store)))),
    );

    let queue = Arc::new(StoreRetryQueue::new(Arc::clone(&store)));
    let engine = Arc::new(RetryEngine::new(
        Arc::clone(&store),
        queue.clone(),
        fetch,
    ));
    let correlator = Arc::new(RequestCorrelator::new(Arc::clone(&store), queue.clone()));

    let pattern = UrlPattern::new(&config.booking_url_pattern).with_context(|| {
        format!("Invalid booking URL pattern {:?}", config.booking_url_pattern)
    })?;
    let capture = Arc::new(RequestCapture::new(Arc::clone(&store), pattern));

    let badge = Arc::new(BadgeController::new(Arc::new(LogBadgeSink)));
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&engine),
        Arc::clone(&correlator),
        Arc::clone(&badge),
    ));

    Ok(Services {
        store,
        queue,
        engine,
        correlator,
        capture,
        badge,
        dispatcher,
    })
}
