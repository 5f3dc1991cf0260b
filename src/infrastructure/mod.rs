pub mod explorer;
pub mod multisig;
pub mod persistence;
pub mod price;
