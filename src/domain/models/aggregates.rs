//! Typed result records for the aggregation engine.
//!
//! Every dashboard view returns one of these fixed shapes so consumers and
//! tests have a stable contract.

use rust_decimal::Decimal;
use serde::Serialize;

/// Outcome of one ingestion run for a wallet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestResult {
    /// Newly inserted transaction rows
    pub new_count: u64,
    /// Balance snapshot rows refreshed with a fresh quote
    pub updated_balance_count: u64,
}

/// Transaction counts for a wallet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TxCounts {
    pub total: u64,
    pub incoming: u64,
    pub outgoing: u64,
    pub uncategorised: u64,
}

/// Outgoing spend grouped by category and token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    pub category: String,
    pub token_symbol: String,
    pub total_amount: Decimal,
    pub total_usd: f64,
    pub tx_count: u64,
}

/// Outgoing spend for one calendar month (UTC) and token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBurn {
    /// Calendar month in `YYYY-MM` form
    pub month: String,
    pub token_symbol: String,
    pub total_amount: Decimal,
    pub total_usd: f64,
    pub total_native: f64,
}

/// Budget-vs-actual for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetLine {
    pub category: String,
    pub group: String,
    pub spent_usd: f64,
    pub spent_native: f64,
    pub quarterly_ceiling: f64,
    pub semester_ceiling: f64,
    pub shared_id: Option<String>,
    /// Raw `spent / semester_ceiling`; 0 when the ceiling is 0
    pub ratio_used: f64,
    /// `ratio_used` capped at the configured display maximum
    pub display_ratio: f64,
}

/// Usage of a shared budget pool across its member categories
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedPoolUsage {
    pub shared_id: String,
    pub categories: Vec<String>,
    pub ceiling: f64,
    pub spent_usd: f64,
    pub ratio_used: f64,
    pub display_ratio: f64,
}

/// Full budget-comparison view for a wallet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetComparison {
    /// Lines grouped in configured group order, `Other` last
    pub lines: Vec<BudgetLine>,
    pub shared_pools: Vec<SharedPoolUsage>,
    /// Group names in output order
    pub groups: Vec<String>,
    pub total_spent_usd: f64,
}
