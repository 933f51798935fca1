//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `booking_retry` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting

use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;

use booking_retry::cli::{Cli, Command, QueueCommand};
use booking_retry::initialization::{init_logger_with, init_store};
use booking_retry::queue::StoreRetryQueue;
use booking_retry::{run_service, QueueItemPatch, RetryQueue, Status};

#[tokio::main]
async fn main() -> Result<()> {
    // .env in the current directory, then next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let cli = Cli::parse();
    init_logger_with(cli.log_level.clone().into(), cli.log_format.clone())
        .context("Failed to initialize logger")?;

    if let Err(e) = execute(cli).await {
        eprintln!("booking_retry error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

async fn execute(cli: Cli) -> Result<()> {
    let config = cli.config();
    match cli.command {
        Command::Run(args) => {
            let report = run_service(config, args.stdin, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl-C: {e}");
                    std::future::pending::<()>().await;
                }
            })
            .await?;
            println!(
                "✅ Stopped after {:.1}s and {} tick{}; {} item{} queued in {}",
                report.elapsed_seconds,
                report.ticks,
                if report.ticks == 1 { "" } else { "s" },
                report.total(),
                if report.total() == 1 { "" } else { "s" },
                report.db_path.display()
            );
            Ok(())
        }
        Command::Queue(command) => {
            let store = init_store(&config.db_path)
                .await
                .with_context(|| format!("Failed to open store at {}", config.db_path.display()))?;
            let queue = StoreRetryQueue::new(store);
            run_queue_command(&queue, command).await
        }
    }
}

async fn run_queue_command(queue: &StoreRetryQueue, command: QueueCommand) -> Result<()> {
    match command {
        QueueCommand::List => {
            for item in queue.get_queue().await? {
                println!("{}", serde_json::to_string(&item)?);
            }
        }
        QueueCommand::Remove { ids } => {
            let removed = queue.remove_multiple_from_queue(&ids).await?;
            println!("Removed {} of {} item(s)", removed.len(), ids.len());
        }
        QueueCommand::Resume { id } => {
            let item = queue
                .update_queue_item(&id, QueueItemPatch::status(Status::InProgress))
                .await
                .with_context(|| format!("Failed to resume {id}"))?;
            println!("{} is {}", item.id, item.status);
        }
        QueueCommand::Pause { id } => {
            let item = queue
                .update_queue_item(&id, QueueItemPatch::status(Status::Paused))
                .await
                .with_context(|| format!("Failed to pause {id}"))?;
            println!("{} is {}", item.id, item.status);
        }
    }
    Ok(())
}
