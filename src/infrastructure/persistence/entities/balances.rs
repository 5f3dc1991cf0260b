//! Balance snapshot entity for SeaORM

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "balances")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub wallet_id: String,
    pub token_symbol: String,
    pub token_name: String,
    pub contract_address: Option<String>,
    /// Raw amount in the token's smallest unit
    pub balance: String,
    pub balance_decimal: Decimal,
    pub usd_value: f64,
    pub unit_price: f64,
    /// When this snapshot was last refreshed with a live quote
    pub last_updated: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
