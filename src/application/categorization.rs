//! Categorization of stored transactions.
//!
//! The only mutation the store allows after ingestion: tagging a
//! transaction with a budget category and free-text note, under the
//! authenticated surface the presentation layer provides.

use std::sync::Arc;

use log::warn;
use serde::Deserialize;

use crate::config::TreasuryConfig;
use crate::domain::errors::{TrackerError, TrackerResult};
use crate::infrastructure::persistence::Repositories;

/// One categorization request
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryUpdate {
    pub tx_id: i64,
    pub category: String,
    #[serde(default)]
    pub notes: String,
}

/// Applies category and note updates to stored transactions
pub struct CategorizationService {
    treasury: Arc<TreasuryConfig>,
    repos: Repositories,
}

impl CategorizationService {
    pub fn new(treasury: Arc<TreasuryConfig>, repos: Repositories) -> Self {
        Self { treasury, repos }
    }

    /// Set the category and notes of one transaction.
    ///
    /// Fails with `NotFound` for an unknown id and with `Config` when the
    /// category is not in the owning wallet's configured list.
    pub async fn categorize(&self, tx_id: i64, category: &str, notes: &str) -> TrackerResult<()> {
        let row = self
            .repos
            .transaction
            .find_by_id(tx_id)
            .await?
            .ok_or_else(|| TrackerError::NotFound(format!("transaction {}", tx_id)))?;

        let wallet = self.treasury.wallet(&row.wallet_id).ok_or_else(|| {
            TrackerError::Config(format!("wallet '{}' is not configured", row.wallet_id))
        })?;

        if !wallet.allows_category(category) {
            return Err(TrackerError::Config(format!(
                "category '{}' is not configured for wallet '{}'",
                category, wallet.id
            )));
        }

        self.repos
            .transaction
            .set_category(tx_id, category, notes)
            .await?
            .ok_or_else(|| TrackerError::NotFound(format!("transaction {}", tx_id)))?;

        Ok(())
    }

    /// Apply a batch of updates independently. Invalid entries are logged
    /// and skipped; returns the number of rows updated.
    pub async fn categorize_bulk(&self, items: &[CategoryUpdate]) -> u64 {
        let mut updated = 0;
        for item in items {
            match self
                .categorize(item.tx_id, &item.category, &item.notes)
                .await
            {
                Ok(()) => updated += 1,
                Err(e) => {
                    warn!("Skipping categorization of transaction {}: {}", item.tx_id, e);
                }
            }
        }
        updated
    }
}
