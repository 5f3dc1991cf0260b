pub mod aggregates;
pub mod balance;
pub mod budget;
pub mod transaction;
pub mod wallet;

pub use aggregates::{
    BudgetComparison, BudgetLine, CategorySpend, IngestResult, MonthlyBurn, SharedPoolUsage,
    TxCounts,
};
pub use balance::BalanceSnapshot;
pub use budget::BudgetAllocation;
pub use transaction::{Direction, NewTransaction, TxFilter, TxKind};
pub use wallet::WalletConfig;

/// Sentinel category assigned to every transaction at ingestion time
pub const UNCATEGORISED: &str = "Uncategorised";
