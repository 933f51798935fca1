//! Error type definitions.
//!
//! This module defines all error types used throughout the application, plus the
//! fetch failure taxonomy.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

use crate::models::Status;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Error types for document store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Schema migration error.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    /// A stored document could not be encoded or decoded.
    #[error("Document serialization error for key {key}: {source}")]
    SerializationError {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by the retry queue primitives.
///
/// This is the only error type that crosses a component boundary.
#[derive(Error, Debug)]
pub enum QueueError {
    /// No queue item has the given id.
    #[error("queue item {0} not found")]
    NotFound(String),

    /// An item with the same id is already queued.
    #[error("queue item {0} already exists")]
    Duplicate(String),

    /// The requested status change is not allowed.
    #[error("queue item {id}: transition {from} -> {to} is not allowed")]
    InvalidTransition { id: String, from: Status, to: Status },

    /// A conditional update found the item in another status.
    #[error("queue item {id} is {actual}, expected {expected}")]
    StatusChanged {
        id: String,
        expected: Status,
        actual: Status,
    },

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure while caching an intercepted request.
///
/// Logged and swallowed by the capture component.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("request cache write failed: {0}")]
    Store(#[from] StoreError),
}

/// Failure while correlating cached request parts into a retry object.
///
/// Aborts the enqueue; the next trigger retries the same lookup.
#[derive(Error, Debug)]
pub enum CorrelationError {
    #[error("no cached request headers")]
    MissingHeaders,

    #[error("no cached request body for request {0}")]
    MissingBody(String),

    #[error("cached body for request {0} has no TvAppId field")]
    MissingTvAppId(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Categories of failed resubmission attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum FetchErrorKind {
    /// Transport failure: connect, timeout, body read
    Network,
    /// 4xx (and any other non-success status that is not 5xx)
    ClientError,
    /// 5xx
    ServerError,
    /// The body is an HTML error page, whatever the status
    HtmlError,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchErrorKind::Network => "NETWORK_ERROR",
            FetchErrorKind::ClientError => "CLIENT_ERROR",
            FetchErrorKind::ServerError => "SERVER_ERROR",
            FetchErrorKind::HtmlError => "HTML_ERROR",
        }
    }
}
