//! Request capture.
//!
//! Observes the two browser interception points for the booking endpoint and
//! caches what they carry: the form body (`requestCacheBody`) and the request
//! headers (`requestCacheHeaders`), both keyed by the browser request id. The
//! correlator later stitches a body and headers pair into one queue item.
//!
//! Capture never fails outward. Store errors are logged and the entry is
//! dropped, which only means a later correlation finds nothing.

mod pattern;

use std::sync::Arc;

use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::{
    KEY_REQUEST_CACHE_BODY, KEY_REQUEST_CACHE_HEADERS, MARKER_HEADER_NAME, MARKER_HEADER_VALUE,
};
use crate::error_handling::CaptureError;
use crate::models::{
    next_sequence, BodyCache, CachedBody, CachedHeaders, FormSnapshot, HeaderCache, HeaderEntry,
};
use crate::storage::{load, save, DocumentStore};

pub use pattern::UrlPattern;

/// Outgoing request about to be sent, with its form body when there is one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeforeRequestEvent {
    pub request_id: String,
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub form_data: Option<FormSnapshot>,
}

/// Outgoing request headers, observed just before they are sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendHeadersEvent {
    pub request_id: String,
    pub url: String,
    #[serde(default)]
    pub request_headers: Vec<HeaderEntry>,
}

/// Whether the headers carry the self-originated marker.
pub fn has_marker_header(headers: &[HeaderEntry]) -> bool {
    headers.iter().any(|h| {
        h.name.eq_ignore_ascii_case(MARKER_HEADER_NAME) && h.value.trim() == MARKER_HEADER_VALUE
    })
}

pub struct RequestCapture {
    store: Arc<dyn DocumentStore>,
    pattern: UrlPattern,
    // Serializes read-modify-write of the two cache documents
    write_lock: Mutex<()>,
}

impl RequestCapture {
    pub fn new(store: Arc<dyn DocumentStore>, pattern: UrlPattern) -> Self {
        RequestCapture {
            store,
            pattern,
            write_lock: Mutex::new(()),
        }
    }

    pub fn pattern(&self) -> &UrlPattern {
        &self.pattern
    }

    /// Caches the form body of an outgoing booking POST.
    pub async fn on_before_request(&self, event: BeforeRequestEvent) {
        let request_id = event.request_id.clone();
        if let Err(e) = self.capture_body(event).await {
            warn!("Dropping captured body for request {request_id}: {e}");
        }
    }

    /// Caches outgoing headers, or discards the sibling body when the request
    /// was sent by the resubmission engine itself.
    pub async fn on_before_send_headers(&self, event: SendHeadersEvent) {
        let request_id = event.request_id.clone();
        if let Err(e) = self.capture_headers(event).await {
            warn!("Dropping captured headers for request {request_id}: {e}");
        }
    }

    /// Runs [`Self::on_before_request`] on a separate task.
    pub fn spawn_before_request(self: &Arc<Self>, event: BeforeRequestEvent) -> JoinHandle<()> {
        let capture = Arc::clone(self);
        tokio::spawn(async move { capture.on_before_request(event).await })
    }

    /// Runs [`Self::on_before_send_headers`] on a separate task.
    pub fn spawn_before_send_headers(self: &Arc<Self>, event: SendHeadersEvent) -> JoinHandle<()> {
        let capture = Arc::clone(self);
        tokio::spawn(async move { capture.on_before_send_headers(event).await })
    }

    async fn capture_body(&self, event: BeforeRequestEvent) -> Result<(), CaptureError> {
        if !self.pattern.matches(&event.url) || !event.method.eq_ignore_ascii_case("POST") {
            return Ok(());
        }
        let Some(body) = event.form_data.filter(|form| !form.is_empty()) else {
            debug!("Request {} has no form body, not capturing", event.request_id);
            return Ok(());
        };

        let _guard = self.write_lock.lock().await;
        let mut cache: BodyCache = load(self.store.as_ref(), KEY_REQUEST_CACHE_BODY).await?;
        let sequence = next_sequence(&cache);
        debug!("Captured body for request {} ({})", event.request_id, event.url);
        cache.insert(
            event.request_id.clone(),
            CachedBody {
                request_id: event.request_id,
                url: event.url,
                body,
                captured_at: Utc::now().timestamp_millis(),
                sequence,
            },
        );
        save(self.store.as_ref(), KEY_REQUEST_CACHE_BODY, &cache).await?;
        Ok(())
    }

    async fn capture_headers(&self, event: SendHeadersEvent) -> Result<(), CaptureError> {
        if !self.pattern.matches(&event.url) {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;
        if has_marker_header(&event.request_headers) {
            let mut cache: BodyCache = load(self.store.as_ref(), KEY_REQUEST_CACHE_BODY).await?;
            if cache.remove(&event.request_id).is_some() {
                debug!("Request {} is a resubmission, body discarded", event.request_id);
                save(self.store.as_ref(), KEY_REQUEST_CACHE_BODY, &cache).await?;
            }
            return Ok(());
        }

        let mut cache: HeaderCache = load(self.store.as_ref(), KEY_REQUEST_CACHE_HEADERS).await?;
        let sequence = next_sequence(&cache);
        debug!("Captured headers for request {} ({})", event.request_id, event.url);
        cache.insert(
            event.request_id.clone(),
            CachedHeaders {
                request_id: event.request_id,
                url: event.url,
                headers: event.request_headers,
                captured_at: Utc::now().timestamp_millis(),
                sequence,
            },
        );
        save(self.store.as_ref(), KEY_REQUEST_CACHE_HEADERS, &cache).await?;
        Ok(())
    }
}
