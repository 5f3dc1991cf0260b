use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a transaction relative to the owning wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in" => Some(Direction::In),
            "out" => Some(Direction::Out),
            _ => None,
        }
    }
}

/// Kind of transfer a transaction represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TxKind {
    /// Plain native-token transfer
    Transfer,
    /// Token (e.g. ERC-20) transfer
    Token,
    /// Contract-initiated native transfer
    Internal,
    /// Native transfer carrying call data
    ContractCall,
}

impl TxKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TxKind::Transfer => "transfer",
            TxKind::Token => "token",
            TxKind::Internal => "internal",
            TxKind::ContractCall => "contract-call",
        }
    }
}

/// A normalized transaction ready for insertion.
///
/// The raw integer amount is kept alongside the decimal-converted amount so
/// the canonical value never goes through floating point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub wallet_id: String,
    pub tx_hash: String,
    pub block_number: i64,
    pub timestamp: i64,
    pub from_address: String,
    pub to_address: String,
    /// Raw amount in the token's smallest unit
    pub value_raw: String,
    /// Amount scaled by the token's decimals
    pub value_decimal: Decimal,
    pub token_symbol: String,
    pub token_name: String,
    pub token_decimals: i32,
    /// None for the native token
    pub contract_address: Option<String>,
    pub kind: TxKind,
    pub direction: Direction,
    pub is_error: bool,
    /// USD value at execution time, when a historical price was available
    pub fiat_value: Option<f64>,
    /// Native-token-equivalent value at execution time
    pub native_value: Option<f64>,
}

/// Filter for transaction listings. Dates are inclusive UTC calendar days;
/// the search term matches hash, addresses and notes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TxFilter {
    pub direction: Option<Direction>,
    pub category: Option<String>,
    pub token: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub search: Option<String>,
    /// 0 means "use the default page size"
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}
