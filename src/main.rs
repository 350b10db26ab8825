//! custodyd
//!
//! Runs a treasury in-process, logging every notification and sweeping
//! proposals whose voting window has closed.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use custody::components::common::logging::init_logging;
use custody::{StaticWeightLedger, SystemClock, Treasury, TreasuryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = TreasuryConfig::from_env().context("Failed to load configuration")?;
    init_logging(&config.log_level, config.log_dir.as_deref()).map_err(anyhow::Error::msg)?;

    let weights = config
        .allocations
        .iter()
        .fold(StaticWeightLedger::new(), |ledger, (holder, weight)| {
            ledger.with_allocation(holder.clone(), *weight)
        });
    info!(
        holders = config.allocations.len(),
        total_weight = weights.total_weight(),
        "Weight ledger seeded"
    );

    let (treasury, sink) =
        Treasury::with_broadcast(config, Arc::new(weights), Arc::new(SystemClock))?;
    let treasury = Arc::new(treasury);
    let interval = Duration::from_secs(treasury.config().finalize_interval_secs);

    let mut events = sink.subscribe();
    let event_logger = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => info!(target: "custody::events", "{}", line),
                    Err(e) => error!("Failed to encode event: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event logger fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let sweeper = {
        let treasury = Arc::clone(&treasury);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let resolved = treasury.finalize_due().await;
                if !resolved.is_empty() {
                    info!(count = resolved.len(), "Finalized due proposals");
                }
            }
        })
    };

    info!(version = custody::version::VERSION, "custodyd running");
    signal::ctrl_c().await.context("Failed to listen for shutdown signal")?;

    info!("Shutting down");
    sweeper.abort();
    event_logger.abort();
    Ok(())
}
