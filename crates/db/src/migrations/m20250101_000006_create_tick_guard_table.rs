//! Create tick_guard table migration.
//!
//! One row per advancement job, starting at the epoch so the first tick
//! always claims its slot.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const JOBS: [&str; 4] = ["election:president", "election:senate", "bills", "economy"];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TickGuard::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TickGuard::Job).string_len(64).not_null().primary_key())
                    .col(
                        ColumnDef::new(TickGuard::LastTickAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        let mut seed = Query::insert();
        seed.into_table(TickGuard::Table)
            .columns([TickGuard::Job, TickGuard::LastTickAt]);
        for job in JOBS {
            seed.values_panic([job.into(), Expr::cust("'epoch'::timestamptz")]);
        }
        manager.exec_stmt(seed).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TickGuard::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TickGuard {
    Table,
    Job,
    LastTickAt,
}
