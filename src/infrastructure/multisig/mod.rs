pub mod client;
pub mod error;

pub use client::{MultisigExecution, SafeClient};
pub use error::MultisigError;
