use thiserror::Error;

/// Error type for chain explorer API calls
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// Request failed to reach the explorer
    #[error("explorer network error: {0}")]
    Network(String),
    /// Response body could not be interpreted
    #[error("explorer parse error: {0}")]
    Parse(String),
    /// The explorer answered with an error status
    #[error("explorer API error: {0}")]
    Api(String),
}
