use std::error::Error;

use log::info;
use migration::{Migrator, MigratorTrait};
use treasury_indexer::config::AppConfig;
use treasury_indexer::infrastructure::persistence;
use treasury_indexer::utils::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let config = AppConfig::from_env();

    info!("Running database migrations");

    let connection = persistence::connect(&config.database).await?;

    Migrator::up(&connection, None).await?;

    info!("Migrations completed");

    Ok(())
}
