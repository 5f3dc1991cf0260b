pub mod balances;
pub mod token_prices;
pub mod transactions;
