//! Create party, party_stance and user tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Party::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Party::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Party::Name).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Party::CreatedAt)
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
                    .table(PartyStance::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PartyStance::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(PartyStance::PartyId).string_len(32).not_null())
                    .col(ColumnDef::new(PartyStance::Issue).string_len(128).not_null())
                    .col(ColumnDef::new(PartyStance::Stance).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_party_stance_party")
                            .from(PartyStance::Table, PartyStance::PartyId)
                            .to(Party::Table, Party::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(User::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(User::Username).string_len(128).not_null().unique_key())
                    .col(ColumnDef::new(User::Token).string_len(64).unique_key())
                    .col(
                        ColumnDef::new(User::Role)
                            .string_len(16)
                            .not_null()
                            .default("representative"),
                    )
                    .col(ColumnDef::new(User::PartyId).string_len(32))
                    .col(ColumnDef::new(User::Balance).decimal_len(20, 2).not_null().default(0))
                    .col(ColumnDef::new(User::IsAdmin).boolean().not_null().default(false))
                    .col(ColumnDef::new(User::IsBanned).boolean().not_null().default(false))
                    .col(ColumnDef::new(User::IsActive).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_party")
                            .from(User::Table, User::PartyId)
                            .to(Party::Table, Party::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: role (office holders are stripped in bulk each election)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_role")
                    .table(User::Table)
                    .col(User::Role)
                    .to_owned(),
            )
            .await?;

        // Index: party_id (membership counts for empty-party cleanup)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_party_id")
                    .table(User::Table)
                    .col(User::PartyId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(PartyStance::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Party::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum User {
    Table,
    Id,
    Username,
    Token,
    Role,
    PartyId,
    Balance,
    IsAdmin,
    IsBanned,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum Party {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum PartyStance {
    Table,
    Id,
    PartyId,
    Issue,
    Stance,
}
