use rust_decimal::Decimal;
use serde::Serialize;

/// A freshly computed balance snapshot for one wallet and token, ready to
/// overwrite the cached row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceSnapshot {
    pub wallet_id: String,
    pub token_symbol: String,
    pub token_name: String,
    pub contract_address: Option<String>,
    /// Raw amount in the token's smallest unit
    pub balance_raw: String,
    pub balance_decimal: Decimal,
    pub usd_value: f64,
    pub unit_price: f64,
}
