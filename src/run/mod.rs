//! Long-running service: scheduler, reconciler and optional stdin bridge.

mod bridge;
mod finalize;
mod init;
mod resources;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

use crate::app::shutdown_gracefully;
use crate::config::Config;
use crate::initialization::init_store;
use crate::queue::RetryQueue;

pub use bridge::{serve_lines, CaptureEvent, Inbound};
pub use finalize::{summarize_queue, RunReport};
pub use init::init_services;
pub use resources::Services;

/// Runs the engine until `shutdown` resolves.
///
/// With `read_stdin` set, bridge lines are read from stdin and replies
/// written to stdout; end of input does not stop the engine.
///
/// # Errors
///
/// Fails when the configuration is invalid or the store cannot be opened.
pub async fn run_service<F>(config: Config, read_stdin: bool, shutdown: F) -> Result<RunReport>
where
    F: Future<Output = ()>,
{
    let started = Instant::now();
    config.validate().context("Invalid configuration")?;
    let store = init_store(&config.db_path)
        .await
        .with_context(|| format!("Failed to open store at {}", config.db_path.display()))?;
    let services = init_services(&config, store)?;

    let items = services.queue.get_queue().await?;
    finalize::log_queue_summary(&summarize_queue(&items));
    let cancel = CancellationToken::new();
    let badge = Arc::clone(&services.badge).follow(Arc::clone(&services.store), cancel.clone());
    let reconciler = services.engine.spawn_reconciler(cancel.clone());
    services
        .engine
        .start_processing(config.processing_config())
        .await;

    let mut shutdown = std::pin::pin!(shutdown);
    if read_stdin {
        let input = BufReader::new(tokio::io::stdin());
        tokio::select! {
            result = serve_lines(&services, input, tokio::io::stdout()) => {
                result?;
                info!("Bridge input closed, waiting for shutdown signal");
                shutdown.as_mut().await;
            }
            _ = shutdown.as_mut() => {}
        }
    } else {
        shutdown.await;
    }

    info!("Shutting down");
    let ticks = match services.engine.stats().await {
        Some(stats) => stats.ticks(),
        None => 0,
    };
    shutdown_gracefully(&services.engine, cancel, vec![reconciler, badge]).await;

    let items = services.queue.get_queue().await?;
    let by_status = summarize_queue(&items);
    finalize::log_queue_summary(&by_status);
    Ok(RunReport {
        by_status,
        ticks,
        db_path: config.db_path,
        elapsed_seconds: started.elapsed().as_secs_f64(),
    })
}
