//! Create bill, per-chamber vote and game_tracker tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bill::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bill::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Bill::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Bill::Content).text().not_null())
                    .col(ColumnDef::new(Bill::CreatorId).string_len(32).not_null())
                    .col(ColumnDef::new(Bill::Stage).string_len(16).not_null().default("house"))
                    .col(ColumnDef::new(Bill::Status).string_len(16).not_null().default("queued"))
                    .col(ColumnDef::new(Bill::Pool).integer())
                    .col(
                        ColumnDef::new(Bill::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bill_creator")
                            .from(Bill::Table, Bill::CreatorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (stage, status, pool) - every bill tick selects by all three
        manager
            .create_index(
                Index::create()
                    .name("idx_bill_stage_status_pool")
                    .table(Bill::Table)
                    .col(Bill::Stage)
                    .col(Bill::Status)
                    .col(Bill::Pool)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (queue draw order)
        manager
            .create_index(
                Index::create()
                    .name("idx_bill_created_at")
                    .table(Bill::Table)
                    .col(Bill::CreatedAt)
                    .to_owned(),
            )
            .await?;

        for chamber in [
            BillVote::HouseTable,
            BillVote::SenateTable,
            BillVote::PresidentialTable,
        ] {
            create_vote_table(manager, chamber).await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(GameTracker::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GameTracker::Id).integer().not_null().primary_key())
                    .col(ColumnDef::new(GameTracker::BillPool).integer().not_null().default(1))
                    .check(Expr::col(GameTracker::BillPool).between(1, 3))
                    .to_owned(),
            )
            .await?;

        let seed = Query::insert()
            .into_table(GameTracker::Table)
            .columns([GameTracker::Id, GameTracker::BillPool])
            .values_panic([1.into(), 1.into()])
            .to_owned();
        manager.exec_stmt(seed).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GameTracker::Table).to_owned())
            .await?;

        for chamber in [
            BillVote::PresidentialTable,
            BillVote::SenateTable,
            BillVote::HouseTable,
        ] {
            manager
                .drop_table(Table::drop().table(chamber).to_owned())
                .await?;
        }

        manager
            .drop_table(Table::drop().table(Bill::Table).to_owned())
            .await
    }
}

/// The three chamber tables share one layout.
async fn create_vote_table(manager: &SchemaManager<'_>, table: BillVote) -> Result<(), DbErr> {
    let name = table.to_string();

    manager
        .create_table(
            Table::create()
                .table(table)
                .if_not_exists()
                .col(ColumnDef::new(BillVote::Id).string_len(32).not_null().primary_key())
                .col(ColumnDef::new(BillVote::BillId).string_len(32).not_null())
                .col(ColumnDef::new(BillVote::VoterId).string_len(32).not_null())
                .col(ColumnDef::new(BillVote::VoteYes).boolean().not_null())
                .col(
                    ColumnDef::new(BillVote::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .default(Expr::current_timestamp()),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name(format!("fk_{name}_bill"))
                        .from(table, BillVote::BillId)
                        .to(Bill::Table, Bill::Id)
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .to_owned(),
        )
        .await?;

    // Unique index: (bill_id, voter_id) - one vote per member per chamber
    manager
        .create_index(
            Index::create()
                .name(format!("idx_{name}_unique"))
                .table(table)
                .col(BillVote::BillId)
                .col(BillVote::VoterId)
                .unique()
                .to_owned(),
        )
        .await
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Bill {
    Table,
    Id,
    Title,
    Content,
    CreatorId,
    Stage,
    Status,
    Pool,
    CreatedAt,
}

#[derive(Iden, Clone, Copy)]
enum BillVote {
    #[iden = "bill_vote_house"]
    HouseTable,
    #[iden = "bill_vote_senate"]
    SenateTable,
    #[iden = "bill_vote_presidential"]
    PresidentialTable,
    Id,
    BillId,
    VoterId,
    VoteYes,
    CreatedAt,
}

#[derive(Iden)]
enum GameTracker {
    Table,
    Id,
    BillPool,
}
