//! Create company, stock, user_share, share_price_history and transaction_history tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Company::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Company::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Company::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Company::Symbol).string_len(8).not_null().unique_key())
                    .col(ColumnDef::new(Company::Capital).decimal_len(20, 2).not_null().default(0))
                    .col(ColumnDef::new(Company::IssuedShares).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Company::CreatorId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Company::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Stock::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Stock::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Stock::CompanyId).string_len(32).not_null().unique_key())
                    .col(ColumnDef::new(Stock::Price).big_integer().not_null())
                    .col(ColumnDef::new(Stock::BoughtToday).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Stock::SoldToday).big_integer().not_null().default(0))
                    .check(Expr::col(Stock::Price).gte(10))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_company")
                            .from(Stock::Table, Stock::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserShare::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserShare::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(UserShare::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(UserShare::CompanyId).string_len(32).not_null())
                    .col(ColumnDef::new(UserShare::Quantity).big_integer().not_null().default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_share_company")
                            .from(UserShare::Table, UserShare::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_share_user")
                            .from(UserShare::Table, UserShare::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one holding row per (user, company)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_share_unique")
                    .table(UserShare::Table)
                    .col(UserShare::UserId)
                    .col(UserShare::CompanyId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_share_company_id")
                    .table(UserShare::Table)
                    .col(UserShare::CompanyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SharePriceHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SharePriceHistory::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SharePriceHistory::StockId).string_len(32).not_null())
                    .col(ColumnDef::new(SharePriceHistory::Price).big_integer().not_null())
                    .col(
                        ColumnDef::new(SharePriceHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_share_price_history_stock")
                            .from(SharePriceHistory::Table, SharePriceHistory::StockId)
                            .to(Stock::Table, Stock::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (stock_id, created_at) for chart queries
        manager
            .create_index(
                Index::create()
                    .name("idx_share_price_history_stock_created")
                    .table(SharePriceHistory::Table)
                    .col(SharePriceHistory::StockId)
                    .col(SharePriceHistory::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TransactionHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionHistory::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TransactionHistory::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(TransactionHistory::Amount).decimal_len(20, 2).not_null())
                    .col(ColumnDef::new(TransactionHistory::Description).text().not_null())
                    .col(
                        ColumnDef::new(TransactionHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_history_user")
                            .from(TransactionHistory::Table, TransactionHistory::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transaction_history_user_id")
                    .table(TransactionHistory::Table)
                    .col(TransactionHistory::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TransactionHistory::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(SharePriceHistory::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserShare::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Stock::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Company::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Company {
    Table,
    Id,
    Name,
    Symbol,
    Capital,
    IssuedShares,
    CreatorId,
    CreatedAt,
}

#[derive(Iden)]
enum Stock {
    Table,
    Id,
    CompanyId,
    Price,
    BoughtToday,
    SoldToday,
}

#[derive(Iden)]
enum UserShare {
    Table,
    Id,
    UserId,
    CompanyId,
    Quantity,
}

#[derive(Iden)]
enum SharePriceHistory {
    Table,
    Id,
    StockId,
    Price,
    CreatedAt,
}

#[derive(Iden)]
enum TransactionHistory {
    Table,
    Id,
    UserId,
    Amount,
    Description,
    CreatedAt,
}
