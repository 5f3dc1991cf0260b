use thiserror::Error;

/// Error type for price oracle calls
#[derive(Debug, Error)]
pub enum PriceError {
    /// Request failed to reach the price service
    #[error("price service network error: {0}")]
    Network(String),
    /// Response body could not be interpreted
    #[error("price service parse error: {0}")]
    Parse(String),
}
