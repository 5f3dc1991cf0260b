use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if !manager.has_table("transactions").await? {
            // Create transactions table
            manager
                .create_table(
                    Table::create()
                        .table(Transactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Transactions::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Transactions::WalletId).string().not_null())
                        .col(ColumnDef::new(Transactions::TxHash).string().not_null())
                        .col(
                            ColumnDef::new(Transactions::BlockNumber)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Transactions::Timestamp)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Transactions::FromAddress)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Transactions::ToAddress).string().not_null())
                        .col(
                            ColumnDef::new(Transactions::Value)
                                .string()
                                .not_null()
                                .default("0"),
                        )
                        .col(
                            ColumnDef::new(Transactions::ValueDecimal)
                                .decimal_len(38, 18)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Transactions::TokenSymbol)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Transactions::TokenName).string().not_null())
                        .col(
                            ColumnDef::new(Transactions::TokenDecimals)
                                .integer()
                                .not_null()
                                .default(18),
                        )
                        .col(ColumnDef::new(Transactions::ContractAddress).string().null())
                        .col(ColumnDef::new(Transactions::Kind).string().not_null())
                        .col(ColumnDef::new(Transactions::Direction).string().not_null())
                        .col(
                            ColumnDef::new(Transactions::Category)
                                .string()
                                .not_null()
                                .default("Uncategorised"),
                        )
                        .col(
                            ColumnDef::new(Transactions::Notes)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(ColumnDef::new(Transactions::Signers).string().null())
                        .col(ColumnDef::new(Transactions::FiatValue).double().null())
                        .col(ColumnDef::new(Transactions::NativeValue).double().null())
                        .col(
                            ColumnDef::new(Transactions::IsError)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .to_owned(),
                )
                .await?;

            // Uniqueness of (wallet_id, tx_hash) is enforced here, not in
            // application code, so overlapping ingestion runs cannot insert
            // duplicate rows.
            manager
                .create_index(
                    Index::create()
                        .name("transactions_wallet_tx_hash")
                        .table(Transactions::Table)
                        .col(Transactions::WalletId)
                        .col(Transactions::TxHash)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("transactions_wallet_id")
                        .table(Transactions::Table)
                        .col(Transactions::WalletId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("transactions_timestamp")
                        .table(Transactions::Table)
                        .col(Transactions::Timestamp)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("transactions_category")
                        .table(Transactions::Table)
                        .col(Transactions::Category)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("transactions_direction")
                        .table(Transactions::Table)
                        .col(Transactions::Direction)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("transactions_token_symbol")
                        .table(Transactions::Table)
                        .col(Transactions::TokenSymbol)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        if !manager.has_table("balances").await? {
            // Create balances table
            manager
                .create_table(
                    Table::create()
                        .table(Balances::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Balances::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Balances::WalletId).string().not_null())
                        .col(ColumnDef::new(Balances::TokenSymbol).string().not_null())
                        .col(ColumnDef::new(Balances::TokenName).string().not_null())
                        .col(ColumnDef::new(Balances::ContractAddress).string().null())
                        .col(
                            ColumnDef::new(Balances::Balance)
                                .string()
                                .not_null()
                                .default("0"),
                        )
                        .col(
                            ColumnDef::new(Balances::BalanceDecimal)
                                .decimal_len(38, 18)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Balances::UsdValue).double().not_null())
                        .col(ColumnDef::new(Balances::UnitPrice).double().not_null())
                        .col(
                            ColumnDef::new(Balances::LastUpdated)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One snapshot row per wallet and token
            manager
                .create_index(
                    Index::create()
                        .name("balances_wallet_token")
                        .table(Balances::Table)
                        .col(Balances::WalletId)
                        .col(Balances::TokenSymbol)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("balances_wallet_id")
                        .table(Balances::Table)
                        .col(Balances::WalletId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        if !manager.has_table("token_prices").await? {
            // Create token_prices table (historical price cache)
            manager
                .create_table(
                    Table::create()
                        .table(TokenPrices::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(TokenPrices::Symbol).string().not_null())
                        .col(ColumnDef::new(TokenPrices::Date).date().not_null())
                        .col(ColumnDef::new(TokenPrices::Price).double().not_null())
                        .primary_key(
                            Index::create()
                                .col(TokenPrices::Symbol)
                                .col(TokenPrices::Date),
                        )
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order
        manager
            .drop_table(Table::drop().table(TokenPrices::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Balances::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;

        Ok(())
    }
}

// Transactions table
#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    WalletId,
    TxHash,
    BlockNumber,
    Timestamp,
    FromAddress,
    ToAddress,
    Value,
    ValueDecimal,
    TokenSymbol,
    TokenName,
    TokenDecimals,
    ContractAddress,
    Kind,
    Direction,
    Category,
    Notes,
    Signers,
    FiatValue,
    NativeValue,
    IsError,
}

// Balances table
#[derive(Iden)]
enum Balances {
    Table,
    Id,
    WalletId,
    TokenSymbol,
    TokenName,
    ContractAddress,
    Balance,
    BalanceDecimal,
    UsdValue,
    UnitPrice,
    LastUpdated,
}

// Token prices table
#[derive(Iden)]
enum TokenPrices {
    Table,
    Symbol,
    Date,
    Price,
}
