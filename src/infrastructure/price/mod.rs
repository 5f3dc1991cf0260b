pub mod client;
pub mod error;

pub use client::{PriceClient, PriceQuote};
pub use error::PriceError;
