//! Configuration types.
//!
//! This module defines enums and structs used for configuration and command-line
//! argument parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use thiserror::Error;

use crate::config::constants::{
    DB_PATH, DEFAULT_BOOKING_URL_PATTERN, DEFAULT_INTERVAL_MAX_MS, DEFAULT_INTERVAL_MIN_MS,
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, RETRY_BASE_DELAY_MS, RETRY_MAX_ATTEMPTS,
    RETRY_MAX_ATTEMPTS_LIMIT, RETRY_MAX_DELAY_MS,
};
use crate::fetch::RetryConfig;
use crate::scheduler::ProcessingConfig;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// A configuration value that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {message}")]
pub struct ConfigValidationError {
    /// Name of the offending field
    pub field: String,
    /// What is wrong and what range is accepted
    pub message: String,
}

impl ConfigValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use booking_retry::Config;
///
/// let config = Config {
///     interval_min_ms: 5_000,
///     interval_max_ms: 10_000,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Database path (SQLite file)
    pub db_path: PathBuf,

    /// Match pattern for the booking-submission endpoint
    pub booking_url_pattern: String,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value (used when the capture has none)
    pub user_agent: String,

    /// Attempts per resubmission, initial attempt included
    pub max_attempts: u32,

    /// Backoff base delay in milliseconds
    pub base_delay_ms: u64,

    /// Backoff cap in milliseconds
    pub max_delay_ms: u64,

    /// Lower bound of the scheduler tick interval in milliseconds
    pub interval_min_ms: u64,

    /// Upper bound of the scheduler tick interval in milliseconds
    pub interval_max_ms: u64,

    /// Whether the scheduler runs at all
    pub retry_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            db_path: PathBuf::from(DB_PATH),
            booking_url_pattern: DEFAULT_BOOKING_URL_PATTERN.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_attempts: RETRY_MAX_ATTEMPTS,
            base_delay_ms: RETRY_BASE_DELAY_MS,
            max_delay_ms: RETRY_MAX_DELAY_MS,
            interval_min_ms: DEFAULT_INTERVAL_MIN_MS,
            interval_max_ms: DEFAULT_INTERVAL_MAX_MS,
            retry_enabled: true,
        }
    }
}

impl Config {
    /// Checks every field for a usable value.
    ///
    /// Returns the first offending field with a message describing the accepted range.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.timeout_seconds == 0 {
            return Err(ConfigValidationError::new(
                "timeout_seconds",
                "must be greater than 0",
            ));
        }
        if self.max_attempts == 0 || self.max_attempts > RETRY_MAX_ATTEMPTS_LIMIT {
            return Err(ConfigValidationError::new(
                "max_attempts",
                format!("must be between 1 and {RETRY_MAX_ATTEMPTS_LIMIT}"),
            ));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(ConfigValidationError::new(
                "base_delay_ms",
                format!(
                    "must not exceed max_delay_ms ({} > {})",
                    self.base_delay_ms, self.max_delay_ms
                ),
            ));
        }
        if self.interval_min_ms == 0 {
            return Err(ConfigValidationError::new(
                "interval_min_ms",
                "must be greater than 0",
            ));
        }
        if self.interval_min_ms > self.interval_max_ms {
            return Err(ConfigValidationError::new(
                "interval_min_ms",
                format!(
                    "must not exceed interval_max_ms ({} > {})",
                    self.interval_min_ms, self.interval_max_ms
                ),
            ));
        }
        if self.booking_url_pattern.trim().is_empty() {
            return Err(ConfigValidationError::new(
                "booking_url_pattern",
                "must not be empty (e.g. \"*://*/TVApp/EditTvAppSubmit/*\")",
            ));
        }
        Ok(())
    }

    /// Backoff settings for the fetch engine.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }

    /// Tick settings for the scheduler.
    pub fn processing_config(&self) -> ProcessingConfig {
        ProcessingConfig {
            interval_min: Duration::from_millis(self.interval_min_ms),
            interval_max: Duration::from_millis(self.interval_max_ms),
            retry_enabled: self.retry_enabled,
        }
    }
}
