pub mod balance_repository;
pub mod price_repository;
pub mod transaction_repository;

pub use balance_repository::BalanceRepository;
pub use price_repository::PriceRepository;
pub use transaction_repository::TransactionRepository;

/// Collection of all repositories
#[derive(Clone)]
pub struct Repositories {
    /// Repository for transaction operations
    pub transaction: TransactionRepository,
    /// Repository for balance snapshot operations
    pub balance: BalanceRepository,
    /// Repository for the historical price cache
    pub price: PriceRepository,
}

impl Repositories {
    /// Create a new Repositories instance
    pub fn new(
        transaction: TransactionRepository,
        balance: BalanceRepository,
        price: PriceRepository,
    ) -> Self {
        Self {
            transaction,
            balance,
            price,
        }
    }
}
