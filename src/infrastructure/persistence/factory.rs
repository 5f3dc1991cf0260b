use sea_orm::DatabaseConnection;

use crate::infrastructure::persistence::repositories::{
    BalanceRepository, PriceRepository, Repositories, TransactionRepository,
};

/// Factory for creating repositories
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create all repositories over one shared connection pool
    pub fn create_repositories(conn: &DatabaseConnection) -> Repositories {
        let conn = conn.clone();

        Repositories::new(
            Self::create_transaction_repository(conn.clone()),
            Self::create_balance_repository(conn.clone()),
            Self::create_price_repository(conn),
        )
    }

    /// Create a transaction repository
    pub fn create_transaction_repository(conn: DatabaseConnection) -> TransactionRepository {
        TransactionRepository::new(conn)
    }

    /// Create a balance repository
    pub fn create_balance_repository(conn: DatabaseConnection) -> BalanceRepository {
        BalanceRepository::new(conn)
    }

    /// Create a price repository
    pub fn create_price_repository(conn: DatabaseConnection) -> PriceRepository {
        PriceRepository::new(conn)
    }
}
