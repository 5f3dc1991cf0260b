use thiserror::Error;

/// Error type for Safe Transaction Service calls
#[derive(Debug, Error)]
pub enum MultisigError {
    /// Request failed to reach the service
    #[error("multisig service network error: {0}")]
    Network(String),
    /// Response body could not be interpreted
    #[error("multisig service parse error: {0}")]
    Parse(String),
}
