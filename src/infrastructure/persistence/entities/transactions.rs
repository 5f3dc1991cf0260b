//! Transaction entity for SeaORM

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub wallet_id: String,
    pub tx_hash: String,
    pub block_number: i64,
    /// Block timestamp, unix seconds (UTC)
    pub timestamp: i64,
    pub from_address: String,
    pub to_address: String,
    /// Raw amount in the token's smallest unit
    pub value: String,
    pub value_decimal: Decimal,
    pub token_symbol: String,
    pub token_name: String,
    pub token_decimals: i32,
    pub contract_address: Option<String>,
    pub kind: String,
    pub direction: String,
    pub category: String,
    pub notes: String,
    /// Comma-joined sorted signer addresses, when known
    pub signers: Option<String>,
    /// USD value at execution time; never rewritten once set
    pub fiat_value: Option<f64>,
    pub native_value: Option<f64>,
    pub is_error: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
