use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::domain::models::BalanceSnapshot;
use crate::infrastructure::persistence::entities::balances;
use crate::infrastructure::persistence::error::DbError;

/// Repository for balance snapshot operations
#[derive(Clone)]
pub struct BalanceRepository {
    conn: DatabaseConnection,
}

impl BalanceRepository {
    /// Create a new BalanceRepository
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Overwrite the snapshot for a wallet and token, stamping it with the
    /// current time. Rows whose refresh failed are simply not written, so
    /// their previous value and timestamp survive.
    pub async fn upsert(&self, snapshot: BalanceSnapshot) -> Result<(), DbError> {
        let model = balances::ActiveModel {
            wallet_id: Set(snapshot.wallet_id),
            token_symbol: Set(snapshot.token_symbol),
            token_name: Set(snapshot.token_name),
            contract_address: Set(snapshot.contract_address),
            balance: Set(snapshot.balance_raw),
            balance_decimal: Set(snapshot.balance_decimal),
            usd_value: Set(snapshot.usd_value),
            unit_price: Set(snapshot.unit_price),
            last_updated: Set(Utc::now().into()),
            ..Default::default()
        };

        balances::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    balances::Column::WalletId,
                    balances::Column::TokenSymbol,
                ])
                .update_columns([
                    balances::Column::TokenName,
                    balances::Column::ContractAddress,
                    balances::Column::Balance,
                    balances::Column::BalanceDecimal,
                    balances::Column::UsdValue,
                    balances::Column::UnitPrice,
                    balances::Column::LastUpdated,
                ])
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }

    /// Cached snapshots for a wallet
    pub async fn for_wallet(&self, wallet_id: &str) -> Result<Vec<balances::Model>, DbError> {
        let rows = balances::Entity::find()
            .filter(balances::Column::WalletId.eq(wallet_id))
            .order_by_asc(balances::Column::TokenSymbol)
            .all(&self.conn)
            .await?;

        Ok(rows)
    }
}
