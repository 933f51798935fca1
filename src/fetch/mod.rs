//! Resubmission engine.
//!
//! Sends a captured booking request again, retrying transient failures with
//! exponential backoff, and returns either the response text or a typed
//! [`FetchError`]. Expected HTTP failures are values, never panics or
//! propagated errors, so the scheduler needs no error handling of its own.

mod error_log;
mod request;
mod response;
mod retry;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use tokio_retry::RetryIf;

use crate::error_handling::{classify_http_failure, FetchErrorKind};

pub use error_log::{ErrorLogEntry, ErrorLogSink, NoopErrorLog, StoreErrorLog};
pub use request::FetchRequest;
pub use response::{html_error_code, is_html_error_page, FetchError, FetchedResponse};
pub use retry::RetryConfig;

/// Executes resubmissions with retry and failure classification.
pub struct FetchEngine {
    client: Arc<reqwest::Client>,
    retry: RetryConfig,
    error_log: Arc<dyn ErrorLogSink>,
}

impl FetchEngine {
    pub fn new(client: Arc<reqwest::Client>, retry: RetryConfig) -> Self {
        FetchEngine {
            client,
            retry,
            error_log: Arc::new(NoopErrorLog),
        }
    }

    /// Records final failures to `sink`.
    pub fn with_error_log(mut self, sink: Arc<dyn ErrorLogSink>) -> Self {
        self.error_log = sink;
        self
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Sends `request`, retrying up to `max_attempts` times.
    ///
    /// Only network failures and the allow-listed statuses (502, 503, 504, 408,
    /// 429) are retried; any other failure is returned on the attempt that
    /// produced it. The final failure is recorded to the error log.
    pub async fn fetch_request(&self, request: &FetchRequest) -> Result<FetchedResponse, FetchError> {
        let attempts = AtomicU32::new(0);
        let max_attempts = self.retry.max_attempts.max(1);

        let result = RetryIf::spawn(
            self.retry.delays(),
            || {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                self.attempt_once(request, attempt)
            },
            |error: &FetchError| {
                let retry = error.is_retryable();
                if retry && error.attempt < max_attempts {
                    debug!(
                        "Attempt {}/{} to {} failed ({error}), retrying in {:?}",
                        error.attempt,
                        max_attempts,
                        request.url,
                        self.retry.delay_for_attempt(error.attempt)
                    );
                }
                retry
            },
        )
        .await;

        if let Err(error) = &result {
            warn!("Resubmission to {} failed: {error}", request.url);
            let entry = ErrorLogEntry::from_error(&request.url, error);
            if let Err(e) = self.error_log.record(entry).await {
                warn!("Failed to record fetch error for {}: {e:#}", request.url);
            }
        }
        result
    }

    async fn attempt_once(
        &self,
        request: &FetchRequest,
        attempt: u32,
    ) -> Result<FetchedResponse, FetchError> {
        let builder = self.client.request(request.method.clone(), &request.url);
        let response = request
            .apply_to_request_builder(builder)
            .send()
            .await
            .map_err(|e| FetchError::network(&e, attempt))?;

        let status = response.status();
        let headers = response.headers().clone();
        // The body is read exactly once; everything downstream works on this text
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::network(&e, attempt))?;

        if status.is_success() {
            debug!("{} answered {} on attempt {attempt}", request.url, status.as_u16());
            return Ok(FetchedResponse {
                status: status.as_u16(),
                headers,
                body,
            });
        }

        let kind = classify_http_failure(status.as_u16(), &body);
        if kind == FetchErrorKind::HtmlError {
            debug!(
                "{} answered {} with an HTML error page (code {:?})",
                request.url,
                status.as_u16(),
                html_error_code(&body)
            );
        }
        Err(FetchError::http(kind, status.as_u16(), body, attempt))
    }
}
