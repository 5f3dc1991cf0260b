//! Database connectivity.

use std::time::Duration;

use log::info;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::config::DatabaseConfig;
use crate::infrastructure::persistence::error::DbError;

/// Open the Postgres connection pool the repositories run on.
///
/// The pool stays at the configured size: ingestion is single-writer per
/// wallet and dashboard reads are few. Per-statement sqlx logging is off;
/// the pipeline logs its own progress.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbError> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let connection = Database::connect(options)
        .await
        .map_err(|e| DbError::Connection(format!("cannot open database: {}", e)))?;

    info!(
        "Database connected (pool of {} connections)",
        config.max_connections
    );
    Ok(connection)
}
