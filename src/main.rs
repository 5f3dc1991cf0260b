use std::sync::Arc;

use log::info;

use treasury_indexer::application::ingestion::{IngestionPipeline, Scheduler};
use treasury_indexer::config::{AppConfig, TreasuryConfig};
use treasury_indexer::infrastructure::explorer::ExplorerClient;
use treasury_indexer::infrastructure::multisig::SafeClient;
use treasury_indexer::infrastructure::persistence::{self, RepositoryFactory};
use treasury_indexer::infrastructure::price::PriceClient;
use treasury_indexer::utils::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = AppConfig::from_env();
    let treasury = Arc::new(TreasuryConfig::load(&config.treasury_config_path)?);
    info!(
        "Tracking {} wallets ({} budget allocations)",
        treasury.wallets.len(),
        treasury.budgets.len()
    );

    let connection = persistence::connect(&config.database).await?;
    let repositories = RepositoryFactory::create_repositories(&connection);

    let explorer = ExplorerClient::new(&config.explorer)?;
    let price = PriceClient::new(&config.price, treasury.coingecko_ids.clone())?;
    let safe = SafeClient::new(&config.multisig)?;

    let pipeline = Arc::new(IngestionPipeline::new(
        treasury,
        explorer,
        price,
        safe,
        repositories,
        config.explorer.page_size,
        config.ingest.genesis_block,
    ));

    let scheduler = Scheduler::new(pipeline, config.ingest.interval_secs);

    tokio::select! {
        _ = scheduler.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }

    Ok(())
}
