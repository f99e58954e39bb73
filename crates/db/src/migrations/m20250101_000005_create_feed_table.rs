//! Create feed table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Feed::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Feed::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Feed::UserId).string_len(32))
                    .col(ColumnDef::new(Feed::Content).text().not_null())
                    .col(
                        ColumnDef::new(Feed::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: created_at (feed is read newest-first)
        manager
            .create_index(
                Index::create()
                    .name("idx_feed_created_at")
                    .table(Feed::Table)
                    .col(Feed::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_feed_user_id")
                    .table(Feed::Table)
                    .col(Feed::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Feed::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Feed {
    Table,
    Id,
    UserId,
    Content,
    CreatedAt,
}
