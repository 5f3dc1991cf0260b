use chrono::NaiveDate;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};

use crate::infrastructure::persistence::entities::token_prices;
use crate::infrastructure::persistence::error::DbError;

/// Repository for the historical price cache
#[derive(Clone)]
pub struct PriceRepository {
    conn: DatabaseConnection,
}

impl PriceRepository {
    /// Create a new PriceRepository
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Cached price for a symbol on a UTC calendar day
    pub async fn get(&self, symbol: &str, date: NaiveDate) -> Result<Option<f64>, DbError> {
        let result = token_prices::Entity::find_by_id((symbol.to_string(), date))
            .one(&self.conn)
            .await?;

        Ok(result.map(|p| p.price))
    }

    /// Cache a price for a symbol and day. An existing entry wins; cached
    /// prices are never rewritten.
    pub async fn save_if_absent(
        &self,
        symbol: &str,
        date: NaiveDate,
        price: f64,
    ) -> Result<(), DbError> {
        let model = token_prices::ActiveModel {
            symbol: Set(symbol.to_string()),
            date: Set(date),
            price: Set(price),
        };

        token_prices::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    token_prices::Column::Symbol,
                    token_prices::Column::Date,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }
}
