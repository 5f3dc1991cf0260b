//! Periodic ingestion scheduler.
//!
//! Runs a full ingestion cycle over every configured wallet on a fixed
//! interval. Wallets run concurrently; a wallet whose previous run is
//! still in flight is skipped for this cycle rather than queued.

use std::sync::Arc;

use log::{error, info, warn};
use tokio::time::{sleep, Duration};

use crate::application::ingestion::pipeline::IngestionPipeline;
use crate::domain::errors::TrackerError;

/// Interval-driven runner around the ingestion pipeline
pub struct Scheduler {
    pipeline: Arc<IngestionPipeline>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(pipeline: Arc<IngestionPipeline>, interval_secs: u64) -> Self {
        Self {
            pipeline,
            interval: Duration::from_secs(interval_secs),
        }
    }

    /// Run ingestion cycles forever
    pub async fn run(&self) {
        loop {
            info!("Starting ingestion cycle");

            for (wallet_id, result) in self.pipeline.ingest_all().await {
                match result {
                    Ok(outcome) => info!(
                        "Wallet '{}' ingested: {} new, {} balances",
                        wallet_id, outcome.new_count, outcome.updated_balance_count
                    ),
                    Err(TrackerError::IngestInProgress(_)) => warn!(
                        "Wallet '{}' still ingesting, skipped this cycle",
                        wallet_id
                    ),
                    Err(e) => error!("Wallet '{}' ingestion failed: {}", wallet_id, e),
                }
            }

            info!("Ingestion cycle complete");
            sleep(self.interval).await;
        }
    }
}
