//! Logger initialization.
//!
//! This module provides functions to initialize the logger with custom formatting.

use std::io::Write;

use crate::config::LogFormat;
use crate::error_handling::InitializationError;
use colored::*;
use log::LevelFilter;

/// Initializes the logger with the specified level and format.
///
/// Configures `env_logger` with custom formatting. Supports both plain text
/// (with colors and emojis) and JSON formats for structured logging.
///
/// `RUST_LOG` is read first and the provided `level` overrides it, so
/// `RUST_LOG=booking_retry=trace` still works for per-module filtering when the
/// CLI level is left at its default.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already installed.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug booking_retry run
/// booking_retry --log-level debug --log-format json run
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    builder.filter_module("html5ever", LevelFilter::Error);
    builder.filter_module("selectors", LevelFilter::Warn);
    builder.filter_module("sqlx", LevelFilter::Warn);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    builder.filter_module("booking_retry", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{}",
                    format_json_line(
                        chrono::Utc::now().timestamp_millis(),
                        record.level(),
                        record.target(),
                        &record.args().to_string(),
                    )
                )
            });
        }
        LogFormat::Plain => {
            colored::control::set_override(true);
            builder.format(|buf, record| {
                let level = record.level();
                let colored_level = match level {
                    log::Level::Error => level.to_string().red(),
                    log::Level::Warn => level.to_string().yellow(),
                    log::Level::Info => level.to_string().green(),
                    log::Level::Debug => level.to_string().blue(),
                    log::Level::Trace => level.to_string().purple(),
                };

                let emoji = match level {
                    log::Level::Error => "❌",
                    log::Level::Warn => "⚠️",
                    log::Level::Info => "✔️",
                    log::Level::Debug => "🔍",
                    log::Level::Trace => "🔬",
                };

                writeln!(
                    buf,
                    "{} {} [{}] {}",
                    emoji,
                    record.target().cyan(),
                    colored_level,
                    record.args()
                )
            });
        }
    }

    // try_init so a second initialization (tests, embedders) returns an error instead of panicking
    builder.try_init().map_err(InitializationError::from)?;

    Ok(())
}

/// One JSON log line: `{"ts":..,"level":..,"target":..,"msg":..}`.
pub fn format_json_line(ts_ms: i64, level: log::Level, target: &str, msg: &str) -> String {
    serde_json::json!({
        "ts": ts_ms,
        "level": level.as_str(),
        "target": target,
        "msg": msg,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_does_not_panic_when_repeated() {
        let first = init_logger_with(LevelFilter::Info, LogFormat::Plain);
        let second = init_logger_with(LevelFilter::Debug, LogFormat::Json);
        // At most one installation can succeed per process
        assert!(!(first.is_ok() && second.is_ok()));
        assert!(matches!(second, Err(InitializationError::LoggerError(_))));
    }

    #[test]
    fn test_json_line_shape() {
        let line = format_json_line(1_715_328_000_000, log::Level::Warn, "booking_retry::fetch", "say \"hi\"");
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["ts"], 1_715_328_000_000i64);
        assert_eq!(parsed["level"], "WARN");
        assert_eq!(parsed["target"], "booking_retry::fetch");
        assert_eq!(parsed["msg"], "say \"hi\"");
    }
}
