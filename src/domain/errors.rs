use thiserror::Error;

use crate::infrastructure::explorer::ExplorerError;
use crate::infrastructure::multisig::MultisigError;
use crate::infrastructure::persistence::DbError;
use crate::infrastructure::price::PriceError;

/// Error taxonomy for ingestion, categorization and query operations.
///
/// `Conflict` covers duplicate inserts reaching the store outside the
/// idempotent path; the repositories absorb those, so it rarely surfaces.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Explorer or price service unreachable or returned a malformed
    /// response, after retries
    #[error("external service error: {0}")]
    ExternalService(String),
    /// Invalid or missing configuration, or a write rejected by it
    #[error("configuration error: {0}")]
    Config(String),
    /// Unknown wallet or transaction id
    #[error("not found: {0}")]
    NotFound(String),
    /// Duplicate insert attempted outside the idempotent path
    #[error("conflict: {0}")]
    Conflict(String),
    /// A second ingestion trigger for a wallet whose run is still in flight
    #[error("ingestion already in progress for wallet '{0}'")]
    IngestInProgress(String),
    /// Storage-layer failure
    #[error("database error: {0}")]
    Database(#[from] DbError),
}

pub type TrackerResult<T> = Result<T, TrackerError>;

impl From<ExplorerError> for TrackerError {
    fn from(err: ExplorerError) -> Self {
        TrackerError::ExternalService(err.to_string())
    }
}

impl From<PriceError> for TrackerError {
    fn from(err: PriceError) -> Self {
        TrackerError::ExternalService(err.to_string())
    }
}

impl From<MultisigError> for TrackerError {
    fn from(err: MultisigError) -> Self {
        TrackerError::ExternalService(err.to_string())
    }
}
