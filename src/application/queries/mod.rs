//! Read-side service consumed by the presentation layer.
//!
//! Assembles stored rows and a current-price fallback map, then delegates
//! the arithmetic to the aggregation engine. Everything returned here is
//! plain structured data; rendering lives outside this crate.

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;

use crate::config::TreasuryConfig;
use crate::domain::errors::{TrackerError, TrackerResult};
use crate::domain::models::{
    BudgetComparison, CategorySpend, MonthlyBurn, TxCounts, TxFilter, WalletConfig,
};
use crate::domain::services::aggregator;
use crate::infrastructure::persistence::entities::{balances, transactions};
use crate::infrastructure::persistence::Repositories;
use crate::infrastructure::price::PriceClient;

const DEFAULT_PAGE_SIZE: u64 = 100;
const MAX_PAGE_SIZE: u64 = 1000;

/// One transaction as returned to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct TransactionView {
    pub id: i64,
    pub tx_hash: String,
    pub block_number: i64,
    pub timestamp: i64,
    pub from_address: String,
    pub to_address: String,
    pub value_decimal: Decimal,
    pub token_symbol: String,
    pub token_name: String,
    pub contract_address: Option<String>,
    pub kind: String,
    pub direction: String,
    pub category: String,
    pub notes: String,
    pub signers: Option<Vec<String>>,
    pub fiat_value: Option<f64>,
    pub native_value: Option<f64>,
    pub is_error: bool,
}

impl From<transactions::Model> for TransactionView {
    fn from(model: transactions::Model) -> Self {
        Self {
            id: model.id,
            tx_hash: model.tx_hash,
            block_number: model.block_number,
            timestamp: model.timestamp,
            from_address: model.from_address,
            to_address: model.to_address,
            value_decimal: model.value_decimal,
            token_symbol: model.token_symbol,
            token_name: model.token_name,
            contract_address: model.contract_address,
            kind: model.kind,
            direction: model.direction,
            category: model.category,
            notes: model.notes,
            signers: model
                .signers
                .map(|s| s.split(',').map(str::to_string).collect()),
            fiat_value: model.fiat_value,
            native_value: model.native_value,
            is_error: model.is_error,
        }
    }
}

/// A page of transactions plus the total match count
#[derive(Debug, Clone, Serialize)]
pub struct TxPage {
    pub transactions: Vec<TransactionView>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// One cached balance as returned to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct BalanceView {
    pub token_symbol: String,
    pub token_name: String,
    pub contract_address: Option<String>,
    pub balance_decimal: Decimal,
    pub usd_value: f64,
    pub unit_price: f64,
    pub last_updated: DateTimeWithTimeZone,
}

impl From<balances::Model> for BalanceView {
    fn from(model: balances::Model) -> Self {
        Self {
            token_symbol: model.token_symbol,
            token_name: model.token_name,
            contract_address: model.contract_address,
            balance_decimal: model.balance_decimal,
            usd_value: model.usd_value,
            unit_price: model.unit_price,
            last_updated: model.last_updated,
        }
    }
}

/// Read-only queries over the transaction store and balance cache
pub struct QueryService {
    treasury: Arc<TreasuryConfig>,
    repos: Repositories,
    price: PriceClient,
    budget_display_cap: f64,
}

impl QueryService {
    pub fn new(
        treasury: Arc<TreasuryConfig>,
        repos: Repositories,
        price: PriceClient,
        budget_display_cap: f64,
    ) -> Self {
        Self {
            treasury,
            repos,
            price,
            budget_display_cap,
        }
    }

    /// Transaction counts for a wallet
    pub async fn get_counts(&self, wallet_id: &str) -> TrackerResult<TxCounts> {
        self.wallet(wallet_id)?;
        let rows = self.repos.transaction.all_for_wallet(wallet_id).await?;
        Ok(aggregator::counts(&rows))
    }

    /// Outgoing spend per category and token
    pub async fn get_category_breakdown(
        &self,
        wallet_id: &str,
    ) -> TrackerResult<Vec<CategorySpend>> {
        self.wallet(wallet_id)?;
        let rows = self.repos.transaction.all_for_wallet(wallet_id).await?;
        let prices = self.fallback_prices(&rows).await;
        Ok(aggregator::category_breakdown(&rows, &prices))
    }

    /// Outgoing spend per UTC calendar month and token
    pub async fn get_monthly_burn(&self, wallet_id: &str) -> TrackerResult<Vec<MonthlyBurn>> {
        self.wallet(wallet_id)?;
        let rows = self.repos.transaction.all_for_wallet(wallet_id).await?;
        let prices = self.fallback_prices(&rows).await;
        Ok(aggregator::monthly_burn(
            &rows,
            &prices,
            &self.treasury.native_symbol,
        ))
    }

    /// Budget-vs-actual for the wallet's configured categories
    pub async fn get_budget_comparison(
        &self,
        wallet_id: &str,
    ) -> TrackerResult<BudgetComparison> {
        let wallet = self.wallet(wallet_id)?.clone();
        let rows = self.repos.transaction.all_for_wallet(wallet_id).await?;
        let prices = self.fallback_prices(&rows).await;
        Ok(aggregator::budget_comparison(
            &rows,
            &wallet.categories,
            &self.treasury.budgets,
            &prices,
            &self.treasury.native_symbol,
            self.budget_display_cap,
        ))
    }

    /// Filtered transaction listing, newest first
    pub async fn list_transactions(
        &self,
        wallet_id: &str,
        filter: TxFilter,
    ) -> TrackerResult<TxPage> {
        self.wallet(wallet_id)?;
        let limit = match filter.limit {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        let offset = filter.offset;

        let (rows, total) = self
            .repos
            .transaction
            .find_filtered(wallet_id, &filter, limit, offset)
            .await?;

        Ok(TxPage {
            transactions: rows.into_iter().map(TransactionView::from).collect(),
            total,
            limit,
            offset,
        })
    }

    /// Cached balance snapshots for a wallet
    pub async fn get_balances(&self, wallet_id: &str) -> TrackerResult<Vec<BalanceView>> {
        self.wallet(wallet_id)?;
        let rows = self.repos.balance.for_wallet(wallet_id).await?;
        Ok(rows.into_iter().map(BalanceView::from).collect())
    }

    /// Distinct token symbols seen in a wallet's history
    pub async fn list_tokens(&self, wallet_id: &str) -> TrackerResult<Vec<String>> {
        self.wallet(wallet_id)?;
        let tokens = self.repos.transaction.distinct_tokens(wallet_id).await?;
        Ok(tokens)
    }

    fn wallet(&self, wallet_id: &str) -> TrackerResult<&WalletConfig> {
        self.treasury
            .wallet(wallet_id)
            .ok_or_else(|| TrackerError::NotFound(format!("unknown wallet '{}'", wallet_id)))
    }

    /// Current prices for every symbol in the row set plus the native
    /// token. Aggregation must not fail on a price outage, so an oracle
    /// error degrades to an empty map and unpriced rows contribute zero.
    async fn fallback_prices(&self, rows: &[transactions::Model]) -> HashMap<String, f64> {
        let mut symbols: Vec<String> = vec![self.treasury.native_symbol.clone()];
        for row in rows {
            if !symbols.contains(&row.token_symbol) {
                symbols.push(row.token_symbol.clone());
            }
        }

        match self.price.current_prices(&symbols).await {
            Ok(prices) => prices,
            Err(e) => {
                warn!(
                    "Current price lookup failed, aggregating without fallback prices: {}",
                    e
                );
                HashMap::new()
            }
        }
    }
}
