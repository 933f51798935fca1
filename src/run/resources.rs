//! Components wired for one run.

use std::sync::Arc;

use crate::app::{BadgeController, Dispatcher, RetryEngine};
use crate::capture::RequestCapture;
use crate::correlate::RequestCorrelator;
use crate::queue::StoreRetryQueue;
use crate::storage::DocumentStore;

/// Every component, sharing one document store.
pub struct Services {
    pub store: Arc<dyn DocumentStore>,
    pub queue: Arc<StoreRetryQueue>,
    pub engine: Arc<RetryEngine>,
    pub correlator: Arc<RequestCorrelator>,
    pub capture: Arc<RequestCapture>,
    pub badge: Arc<BadgeController>,
    pub dispatcher: Arc<Dispatcher>,
}
