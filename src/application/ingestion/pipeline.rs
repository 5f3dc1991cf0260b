//! The ingestion pipeline: pulls a wallet's transfer history from the
//! explorer, normalizes and deduplicates it into the store, prices new
//! outgoing rows, enriches signer data and refreshes the balance cache.
//!
//! A page is only committed once it normalized in full; an explorer error
//! after retries aborts the wallet's run without partial page writes.
//! Value-carrying lists (token, internal) ingest before the normal list so
//! that when one hash appears in several lists, the priced transfer wins
//! the `(wallet, tx_hash)` slot.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use log::{info, warn};
use rust_decimal::prelude::ToPrimitive;

use crate::application::ingestion::retry::RetryHandler;
use crate::application::ingestion::wallet_guard::WalletGuard;
use crate::config::TreasuryConfig;
use crate::domain::errors::{TrackerError, TrackerResult};
use crate::domain::models::{
    BalanceSnapshot, Direction, IngestResult, NewTransaction, TxKind, WalletConfig,
};
use crate::domain::services::normalizer;
use crate::infrastructure::explorer::{ExplorerClient, RawTx, TransferList};
use crate::infrastructure::multisig::SafeClient;
use crate::infrastructure::persistence::Repositories;
use crate::infrastructure::price::{PriceClient, PriceQuote};

/// Transfer lists in ingestion order, with the stored kinds each one
/// contributes (the per-list cursor derives from those kinds)
const TRANSFER_LISTS: [(TransferList, &[&str]); 3] = [
    (TransferList::Token, &[TxKind::Token.as_str()]),
    (TransferList::Internal, &[TxKind::Internal.as_str()]),
    (
        TransferList::Native,
        &[TxKind::Transfer.as_str(), TxKind::ContractCall.as_str()],
    ),
];

/// Select the rows of a fetched page that are new for the wallet.
///
/// Hashes already stored (or already planned earlier in this run) are
/// skipped, which is what makes re-ingestion from an overlapping cursor a
/// no-op. Planned hashes are recorded in `existing` as they are taken.
pub fn plan_page(
    batch: &[RawTx],
    existing: &mut HashSet<String>,
    wallet_id: &str,
    address: &str,
    native_symbol: &str,
) -> Vec<NewTransaction> {
    let mut fresh = Vec::new();
    for raw in batch {
        if existing.contains(&raw.hash) {
            continue;
        }
        existing.insert(raw.hash.clone());
        fresh.push(normalizer::normalize(raw, wallet_id, address, native_symbol));
    }
    fresh
}

/// Build the refreshed snapshot for one holding, given its current quote.
///
/// A holding without a usable quote yields None and its cached row is not
/// written, so the previous value and `last_updated` timestamp survive as
/// the stale marker.
pub fn snapshot_holding(
    wallet_id: &str,
    holding: normalizer::Holding,
    quote: PriceQuote,
) -> Option<BalanceSnapshot> {
    let PriceQuote::Price(price) = quote else {
        return None;
    };
    let amount = holding.amount.to_f64().unwrap_or(0.0);
    let decimals = holding.token_decimals.max(0) as u32;
    Some(BalanceSnapshot {
        wallet_id: wallet_id.to_string(),
        token_symbol: holding.token_symbol,
        token_name: holding.token_name,
        contract_address: holding.contract_address,
        balance_raw: normalizer::unscale_amount(holding.amount, decimals),
        balance_decimal: holding.amount,
        usd_value: amount * price,
        unit_price: price,
    })
}

/// Resolve a wallet id to its configuration and optional chain address.
///
/// Unknown ids are an error; a known wallet without an address is valid
/// and makes ingestion a no-op.
pub fn resolve_wallet<'a>(
    treasury: &'a TreasuryConfig,
    wallet_id: &str,
) -> TrackerResult<(&'a WalletConfig, Option<&'a str>)> {
    let wallet = treasury
        .wallet(wallet_id)
        .ok_or_else(|| TrackerError::NotFound(format!("unknown wallet '{}'", wallet_id)))?;
    Ok((wallet, wallet.address.as_deref()))
}

/// Orchestrates ingestion for the configured wallets
pub struct IngestionPipeline {
    treasury: Arc<TreasuryConfig>,
    explorer: ExplorerClient,
    price: PriceClient,
    safe: SafeClient,
    repos: Repositories,
    guard: WalletGuard,
    retry: RetryHandler,
    page_size: u64,
    genesis_block: u64,
}

impl IngestionPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        treasury: Arc<TreasuryConfig>,
        explorer: ExplorerClient,
        price: PriceClient,
        safe: SafeClient,
        repos: Repositories,
        page_size: u64,
        genesis_block: u64,
    ) -> Self {
        Self {
            treasury,
            explorer,
            price,
            safe,
            repos,
            guard: WalletGuard::new(),
            retry: RetryHandler::new(),
            page_size,
            genesis_block,
        }
    }

    /// Ingest new on-chain activity for one wallet.
    ///
    /// Re-running against unchanged history inserts nothing and alters no
    /// stored category or notes. A concurrent trigger for the same wallet
    /// is rejected with `IngestInProgress`.
    pub async fn ingest(&self, wallet_id: &str) -> TrackerResult<IngestResult> {
        let (_wallet, address) = resolve_wallet(&self.treasury, wallet_id)?;
        let Some(address) = address.map(str::to_string) else {
            info!("Skipping wallet '{}': no address configured", wallet_id);
            return Ok(IngestResult::default());
        };

        let _permit = self
            .guard
            .try_acquire(wallet_id)
            .ok_or_else(|| TrackerError::IngestInProgress(wallet_id.to_string()))?;

        let mut existing = self.repos.transaction.existing_hashes(wallet_id).await?;

        let mut new_count = 0;
        for (list, kinds) in TRANSFER_LISTS {
            new_count += self
                .ingest_list(wallet_id, &address, list, kinds, &mut existing)
                .await?;
        }

        self.enrich_signers(wallet_id, &address).await;
        let updated_balance_count = self.refresh_balances(wallet_id).await?;

        info!(
            "Wallet '{}': {} new transactions, {} balances refreshed",
            wallet_id, new_count, updated_balance_count
        );

        Ok(IngestResult {
            new_count,
            updated_balance_count,
        })
    }

    /// Ingest every configured wallet; wallets run concurrently and report
    /// their outcomes independently
    pub async fn ingest_all(&self) -> Vec<(String, TrackerResult<IngestResult>)> {
        let runs = self.treasury.wallets.iter().map(|wallet| {
            let wallet_id = wallet.id.clone();
            async move {
                let result = self.ingest(&wallet_id).await;
                (wallet_id, result)
            }
        });

        futures::future::join_all(runs).await
    }

    /// Page through one transfer list from the wallet's cursor, committing
    /// each fully-normalized page
    async fn ingest_list(
        &self,
        wallet_id: &str,
        address: &str,
        list: TransferList,
        kinds: &[&str],
        existing: &mut HashSet<String>,
    ) -> TrackerResult<u64> {
        let cursor = self
            .repos
            .transaction
            .latest_block_for_kinds(wallet_id, kinds)
            .await?
            .map(|b| b.max(0) as u64)
            .unwrap_or(self.genesis_block);

        let mut start_block = cursor;
        let mut page = 1;
        let mut inserted_total = 0;
        let mut price_memo: HashMap<(String, NaiveDate), Option<f64>> = HashMap::new();

        loop {
            let batch = self
                .retry
                .execute("explorer list_transactions", || {
                    self.explorer.list_transactions(
                        address,
                        list,
                        start_block,
                        page,
                        self.page_size,
                    )
                })
                .await?;

            if batch.is_empty() {
                break;
            }

            let page_len = batch.len() as u64;
            let max_block = batch
                .iter()
                .map(|t| t.block_number)
                .max()
                .unwrap_or(start_block);

            // The whole page normalizes before anything is written
            let mut fresh = plan_page(
                &batch,
                existing,
                wallet_id,
                address,
                &self.treasury.native_symbol,
            );

            self.price_new_rows(&mut fresh, &mut price_memo).await?;
            inserted_total += self.repos.transaction.insert_new_batch(fresh).await?;

            if page_len < self.page_size {
                break;
            }
            // Advance the cursor past the committed page; when a single
            // block fills a whole page, step the page index instead.
            if max_block > start_block {
                start_block = max_block;
                page = 1;
            } else {
                page += 1;
            }
        }

        Ok(inserted_total)
    }

    /// Attach execution-time USD and native-equivalent values to new
    /// outgoing rows. Oracle misses leave the fields unset; they never
    /// abort the run.
    async fn price_new_rows(
        &self,
        rows: &mut [NewTransaction],
        memo: &mut HashMap<(String, NaiveDate), Option<f64>>,
    ) -> TrackerResult<()> {
        let native_symbol = self.treasury.native_symbol.clone();

        for tx in rows.iter_mut() {
            if tx.direction != Direction::Out || tx.is_error {
                continue;
            }
            let Some(date) = DateTime::from_timestamp(tx.timestamp, 0).map(|dt| dt.date_naive())
            else {
                continue;
            };

            let Some(price) = self.day_price(&tx.token_symbol, date, memo).await? else {
                continue;
            };
            let amount = tx.value_decimal.to_f64().unwrap_or(0.0);
            let fiat = amount * price;
            tx.fiat_value = Some(fiat);

            tx.native_value = if tx.token_symbol == native_symbol {
                Some(amount)
            } else {
                match self.day_price(&native_symbol, date, memo).await? {
                    Some(native_price) if native_price > 0.0 => Some(fiat / native_price),
                    _ => None,
                }
            };
        }

        Ok(())
    }

    /// Historical day price via the store-backed cache, fetching from the
    /// oracle on a miss
    async fn day_price(
        &self,
        symbol: &str,
        date: NaiveDate,
        memo: &mut HashMap<(String, NaiveDate), Option<f64>>,
    ) -> TrackerResult<Option<f64>> {
        if let Some(price) = memo.get(&(symbol.to_string(), date)) {
            return Ok(*price);
        }

        let price = match self.repos.price.get(symbol, date).await? {
            Some(price) => Some(price),
            None => {
                let fetched = self
                    .retry
                    .execute("price historical_price", || {
                        self.price.historical_price(symbol, date)
                    })
                    .await;
                match fetched {
                    Ok(PriceQuote::Price(price)) => {
                        self.repos.price.save_if_absent(symbol, date, price).await?;
                        Some(price)
                    }
                    Ok(PriceQuote::Unavailable) => None,
                    Err(e) => {
                        warn!("No historical price for {} on {}: {}", symbol, date, e);
                        None
                    }
                }
            }
        };

        memo.insert((symbol.to_string(), date), price);
        Ok(price)
    }

    /// Copy signer lists from the multisig service onto stored rows.
    /// Enrichment is best-effort; failures are logged and never abort the
    /// run.
    async fn enrich_signers(&self, wallet_id: &str, address: &str) {
        let executions = match self.safe.executed_transactions(address).await {
            Ok(executions) => executions,
            Err(e) => {
                warn!("Signer lookup failed for wallet '{}': {}", wallet_id, e);
                return;
            }
        };

        let mut updated = 0;
        for execution in executions {
            let signers = execution.signers.join(",");
            match self
                .repos
                .transaction
                .set_signers(wallet_id, &execution.tx_hash, &signers)
                .await
            {
                Ok(count) => updated += count,
                Err(e) => {
                    warn!("Failed to record signers for {}: {}", execution.tx_hash, e);
                }
            }
        }

        if updated > 0 {
            info!(
                "Wallet '{}': signers recorded on {} transactions",
                wallet_id, updated
            );
        }
    }

    /// Recompute the balance cache from stored rows and current quotes.
    ///
    /// A token whose quote is unavailable keeps its previous snapshot,
    /// including the old `last_updated` timestamp, marking it stale.
    async fn refresh_balances(&self, wallet_id: &str) -> TrackerResult<u64> {
        let rows = self.repos.transaction.all_for_wallet(wallet_id).await?;
        let holdings = normalizer::fold_holdings(&rows);

        let mut updated = 0;
        for holding in holdings {
            let fetched = self
                .retry
                .execute("price current_price", || {
                    self.price.current_price(&holding.token_symbol)
                })
                .await;
            let quote = match fetched {
                Ok(quote) => quote,
                Err(e) => {
                    warn!(
                        "Price lookup failed for {}, leaving cached balance stale: {}",
                        holding.token_symbol, e
                    );
                    continue;
                }
            };
            let symbol = holding.token_symbol.clone();
            let Some(snapshot) = snapshot_holding(wallet_id, holding, quote) else {
                warn!("No current price for {}, leaving cached balance stale", symbol);
                continue;
            };

            self.repos.balance.upsert(snapshot).await?;
            updated += 1;
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::infrastructure::explorer::RawTx;

    fn treasury() -> TreasuryConfig {
        TreasuryConfig::from_json_str(
            r#"{
                "native_symbol": "ETH",
                "wallets": [
                    {
                        "id": "treasury",
                        "name": "Main Treasury",
                        "address": "0xabc",
                        "categories": ["Uncategorised", "Ops"]
                    },
                    {
                        "id": "community",
                        "name": "Community",
                        "address": null,
                        "categories": ["Uncategorised"]
                    }
                ],
                "budgets": []
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn unknown_wallet_is_not_found() {
        let config = treasury();
        let err = resolve_wallet(&config, "nope").unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));
    }

    #[test]
    fn wallet_without_address_resolves_to_none() {
        let config = treasury();
        let (wallet, address) = resolve_wallet(&config, "community").unwrap();
        assert_eq!(wallet.id, "community");
        assert!(address.is_none());
    }

    #[test]
    fn deployed_wallet_resolves_its_address() {
        let config = treasury();
        let (_, address) = resolve_wallet(&config, "treasury").unwrap();
        assert_eq!(address, Some("0xabc"));
    }

    fn raw(hash: &str, block: u64) -> RawTx {
        RawTx {
            hash: hash.to_string(),
            block_number: block,
            timestamp: 1_700_000_000,
            from: "0xabc".to_string(),
            to: "0xdef".to_string(),
            value: "1000000000000000000".to_string(),
            token_symbol: None,
            token_name: None,
            token_decimals: None,
            contract_address: None,
            input: None,
            internal: false,
            is_error: false,
        }
    }

    #[test]
    fn planning_skips_stored_hashes() {
        let batch = vec![raw("0x1", 10), raw("0x2", 11)];
        let mut existing: HashSet<String> = ["0x1".to_string()].into_iter().collect();
        let fresh = plan_page(&batch, &mut existing, "treasury", "0xabc", "ETH");
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].tx_hash, "0x2");
    }

    #[test]
    fn replanning_the_same_page_is_a_no_op() {
        let batch = vec![raw("0x1", 10), raw("0x2", 11)];
        let mut existing = HashSet::new();
        let first = plan_page(&batch, &mut existing, "treasury", "0xabc", "ETH");
        assert_eq!(first.len(), 2);
        let second = plan_page(&batch, &mut existing, "treasury", "0xabc", "ETH");
        assert!(second.is_empty());
    }

    #[test]
    fn duplicate_hash_within_a_page_is_taken_once() {
        let batch = vec![raw("0x1", 10), raw("0x1", 10)];
        let mut existing = HashSet::new();
        let fresh = plan_page(&batch, &mut existing, "treasury", "0xabc", "ETH");
        assert_eq!(fresh.len(), 1);
    }

    fn eth_holding(amount: i64) -> normalizer::Holding {
        normalizer::Holding {
            token_symbol: "ETH".to_string(),
            token_name: "ETH".to_string(),
            contract_address: None,
            token_decimals: 18,
            amount: rust_decimal::Decimal::from(amount),
        }
    }

    #[test]
    fn quoted_holding_becomes_a_snapshot() {
        let snapshot =
            snapshot_holding("treasury", eth_holding(3), PriceQuote::Price(2000.0)).unwrap();
        assert_eq!(snapshot.wallet_id, "treasury");
        assert_eq!(snapshot.token_symbol, "ETH");
        assert_eq!(snapshot.usd_value, 6000.0);
        assert_eq!(snapshot.unit_price, 2000.0);
        assert_eq!(snapshot.balance_raw, "3000000000000000000");
    }

    #[test]
    fn unavailable_quote_leaves_the_cached_row_untouched() {
        assert!(snapshot_holding("treasury", eth_holding(3), PriceQuote::Unavailable).is_none());
    }
}
