pub mod client;
pub mod error;

pub use client::{ExplorerClient, RawTx, TransferList};
pub use error::ExplorerError;
