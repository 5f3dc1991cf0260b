use std::collections::HashSet;

use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::domain::models::{NewTransaction, TxFilter, UNCATEGORISED};
use crate::infrastructure::persistence::entities::transactions;
use crate::infrastructure::persistence::error::DbError;

/// Repository for transaction operations
#[derive(Clone)]
pub struct TransactionRepository {
    conn: DatabaseConnection,
}

impl TransactionRepository {
    /// Create a new TransactionRepository
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a page of normalized transactions, skipping rows whose
    /// `(wallet_id, tx_hash)` already exists. Returns the number actually
    /// inserted; duplicates are a no-op at the storage layer.
    pub async fn insert_new_batch(&self, txs: Vec<NewTransaction>) -> Result<u64, DbError> {
        if txs.is_empty() {
            return Ok(0);
        }

        let models: Vec<transactions::ActiveModel> = txs
            .into_iter()
            .map(|tx| transactions::ActiveModel {
                wallet_id: Set(tx.wallet_id),
                tx_hash: Set(tx.tx_hash),
                block_number: Set(tx.block_number),
                timestamp: Set(tx.timestamp),
                from_address: Set(tx.from_address),
                to_address: Set(tx.to_address),
                value: Set(tx.value_raw),
                value_decimal: Set(tx.value_decimal),
                token_symbol: Set(tx.token_symbol),
                token_name: Set(tx.token_name),
                token_decimals: Set(tx.token_decimals),
                contract_address: Set(tx.contract_address),
                kind: Set(tx.kind.as_str().to_string()),
                direction: Set(tx.direction.as_str().to_string()),
                category: Set(UNCATEGORISED.to_string()),
                notes: Set(String::new()),
                signers: Set(None),
                fiat_value: Set(tx.fiat_value),
                native_value: Set(tx.native_value),
                is_error: Set(tx.is_error),
                ..Default::default()
            })
            .collect();

        let inserted = transactions::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([
                    transactions::Column::WalletId,
                    transactions::Column::TxHash,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(inserted)
    }

    /// Hashes of every stored transaction for a wallet
    pub async fn existing_hashes(&self, wallet_id: &str) -> Result<HashSet<String>, DbError> {
        let hashes: Vec<String> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::TxHash)
            .filter(transactions::Column::WalletId.eq(wallet_id))
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(hashes.into_iter().collect())
    }

    /// Most recent stored block for a wallet, restricted to the given
    /// transaction kinds. None when the wallet has no stored history.
    pub async fn latest_block_for_kinds(
        &self,
        wallet_id: &str,
        kinds: &[&str],
    ) -> Result<Option<i64>, DbError> {
        let result = transactions::Entity::find()
            .filter(transactions::Column::WalletId.eq(wallet_id))
            .filter(transactions::Column::Kind.is_in(kinds.iter().copied()))
            .order_by_desc(transactions::Column::BlockNumber)
            .one(&self.conn)
            .await?;

        Ok(result.map(|t| t.block_number))
    }

    /// All stored rows for a wallet, ascending by timestamp
    pub async fn all_for_wallet(
        &self,
        wallet_id: &str,
    ) -> Result<Vec<transactions::Model>, DbError> {
        let rows = transactions::Entity::find()
            .filter(transactions::Column::WalletId.eq(wallet_id))
            .order_by_asc(transactions::Column::Timestamp)
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    /// Get a transaction by its row id
    pub async fn find_by_id(&self, id: i64) -> Result<Option<transactions::Model>, DbError> {
        let result = transactions::Entity::find_by_id(id).one(&self.conn).await?;
        Ok(result)
    }

    /// Update the category and notes of one transaction. Returns None when
    /// the id does not exist.
    pub async fn set_category(
        &self,
        id: i64,
        category: &str,
        notes: &str,
    ) -> Result<Option<transactions::Model>, DbError> {
        let Some(existing) = transactions::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut model: transactions::ActiveModel = existing.into();
        model.category = Set(category.to_string());
        model.notes = Set(notes.to_string());
        let updated = model.update(&self.conn).await?;

        Ok(Some(updated))
    }

    /// Set the signer list on the row matching a wallet and hash. Returns
    /// the number of rows updated.
    pub async fn set_signers(
        &self,
        wallet_id: &str,
        tx_hash: &str,
        signers: &str,
    ) -> Result<u64, DbError> {
        let result = transactions::Entity::update_many()
            .col_expr(transactions::Column::Signers, Expr::value(signers))
            .filter(transactions::Column::WalletId.eq(wallet_id))
            .filter(transactions::Column::TxHash.eq(tx_hash))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    /// Find transactions matching a filter, newest first, with the total
    /// match count for pagination
    pub async fn find_filtered(
        &self,
        wallet_id: &str,
        filter: &TxFilter,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<transactions::Model>, u64), DbError> {
        let condition = Self::filter_condition(wallet_id, filter);

        let total = transactions::Entity::find()
            .filter(condition.clone())
            .count(&self.conn)
            .await?;

        let rows = transactions::Entity::find()
            .filter(condition)
            .order_by_desc(transactions::Column::Timestamp)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await?;

        Ok((rows, total))
    }

    /// Distinct token symbols seen in a wallet's history
    pub async fn distinct_tokens(&self, wallet_id: &str) -> Result<Vec<String>, DbError> {
        let tokens: Vec<String> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::TokenSymbol)
            .distinct()
            .filter(transactions::Column::WalletId.eq(wallet_id))
            .order_by_asc(transactions::Column::TokenSymbol)
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(tokens)
    }

    fn filter_condition(wallet_id: &str, filter: &TxFilter) -> Condition {
        let mut condition =
            Condition::all().add(transactions::Column::WalletId.eq(wallet_id));

        if let Some(direction) = filter.direction {
            condition = condition.add(transactions::Column::Direction.eq(direction.as_str()));
        }
        if let Some(category) = &filter.category {
            condition = condition.add(transactions::Column::Category.eq(category.as_str()));
        }
        if let Some(token) = &filter.token {
            condition = condition.add(transactions::Column::TokenSymbol.eq(token.as_str()));
        }
        if let Some(from) = filter.date_from {
            if let Some(start) = from.and_hms_opt(0, 0, 0) {
                condition = condition
                    .add(transactions::Column::Timestamp.gte(start.and_utc().timestamp()));
            }
        }
        if let Some(to) = filter.date_to {
            if let Some(start) = to.and_hms_opt(0, 0, 0) {
                // Inclusive of the whole end day
                condition = condition.add(
                    transactions::Column::Timestamp.lt(start.and_utc().timestamp() + 86_400),
                );
            }
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            condition = condition.add(
                Condition::any()
                    .add(transactions::Column::TxHash.contains(search))
                    .add(transactions::Column::FromAddress.contains(search))
                    .add(transactions::Column::ToAddress.contains(search))
                    .add(transactions::Column::Notes.contains(search)),
            );
        }

        condition
    }
}
