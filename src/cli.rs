//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{
    Config, LogFormat, LogLevel, DB_PATH, DEFAULT_BOOKING_URL_PATTERN, DEFAULT_INTERVAL_MAX_MS,
    DEFAULT_INTERVAL_MIN_MS, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, RETRY_BASE_DELAY_MS,
    RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY_MS,
};

#[derive(Debug, Parser)]
#[command(name = "booking_retry", version, about = "Resubmits failed terminal bookings")]
pub struct Cli {
    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, global = true)]
    pub log_format: LogFormat,

    /// SQLite document store
    #[arg(long, env = "BOOKING_RETRY_DB", default_value = DB_PATH, global = true)]
    pub db_path: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the retry scheduler until interrupted
    Run(RunArgs),
    /// Inspect or edit the retry queue
    #[command(subcommand)]
    Queue(QueueCommand),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Lower bound of the tick interval
    #[arg(long, default_value_t = DEFAULT_INTERVAL_MIN_MS)]
    pub interval_min_ms: u64,

    /// Upper bound of the tick interval
    #[arg(long, default_value_t = DEFAULT_INTERVAL_MAX_MS)]
    pub interval_max_ms: u64,

    /// Attempts per resubmission, initial attempt included
    #[arg(long, default_value_t = RETRY_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    #[arg(long, default_value_t = RETRY_BASE_DELAY_MS)]
    pub base_delay_ms: u64,

    #[arg(long, default_value_t = RETRY_MAX_DELAY_MS)]
    pub max_delay_ms: u64,

    /// Per-request timeout
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// Match pattern of the booking submission endpoint
    #[arg(long, default_value = DEFAULT_BOOKING_URL_PATTERN)]
    pub booking_url_pattern: String,

    #[arg(long, env = "BOOKING_RETRY_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Keep the queue but do not start the scheduler
    #[arg(long)]
    pub no_retry: bool,

    /// Read bridge events and messages as JSON lines from stdin
    #[arg(long)]
    pub stdin: bool,
}

#[derive(Debug, Subcommand)]
pub enum QueueCommand {
    /// Print every queue item as one JSON line
    List,
    /// Remove items by id
    Remove {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Put an item back into retry
    Resume { id: String },
    /// Suspend retry for an item
    Pause { id: String },
}

impl Cli {
    /// Library configuration for this invocation.
    pub fn config(&self) -> Config {
        let mut config = Config {
            log_level: self.log_level.clone(),
            log_format: self.log_format.clone(),
            db_path: self.db_path.clone(),
            ..Default::default()
        };
        if let Command::Run(args) = &self.command {
            config.interval_min_ms = args.interval_min_ms;
            config.interval_max_ms = args.interval_max_ms;
            config.max_attempts = args.max_attempts;
            config.base_delay_ms = args.base_delay_ms;
            config.max_delay_ms = args.max_delay_ms;
            config.timeout_seconds = args.timeout_seconds;
            config.booking_url_pattern = args.booking_url_pattern.clone();
            config.user_agent = args.user_agent.clone();
            config.retry_enabled = !args.no_retry;
        }
        config
    }
}
