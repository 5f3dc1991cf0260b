use thiserror::Error;

/// Error type for database operations
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SeaORM
    #[error("database error: {0}")]
    SeaOrm(#[from] sea_orm::DbErr),
    /// Connection error
    #[error("connection error: {0}")]
    Connection(String),
}
