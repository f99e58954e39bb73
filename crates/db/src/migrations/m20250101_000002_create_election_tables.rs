//! Create election, candidate, candidate_snapshot and election_vote tables migration.
//!
//! Also inserts the two election rows; the engine never creates them.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Election::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Election::Id).integer().not_null().primary_key())
                    .col(ColumnDef::new(Election::Kind).string_len(16).not_null().unique_key())
                    .col(ColumnDef::new(Election::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Election::DaysLeft).integer().not_null())
                    .col(ColumnDef::new(Election::Seats).integer().not_null().default(1))
                    .check(Expr::col(Election::DaysLeft).gte(0))
                    .to_owned(),
            )
            .await?;

        let seed = Query::insert()
            .into_table(Election::Table)
            .columns([
                Election::Id,
                Election::Kind,
                Election::Status,
                Election::DaysLeft,
                Election::Seats,
            ])
            .values_panic([1.into(), "president".into(), "candidate".into(), 5.into(), 1.into()])
            .values_panic([2.into(), "senate".into(), "candidate".into(), 2.into(), 3.into()])
            .to_owned();
        manager.exec_stmt(seed).await?;

        manager
            .create_table(
                Table::create()
                    .table(Candidate::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Candidate::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Candidate::UserId).string_len(32).not_null().unique_key())
                    .col(ColumnDef::new(Candidate::ElectionKind).string_len(16).not_null())
                    .col(ColumnDef::new(Candidate::Votes).big_integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Candidate::Donations)
                            .decimal_len(20, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Candidate::VotesPerHour)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Candidate::DonationsPerHour)
                            .decimal_len(20, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Candidate::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_candidate_user")
                            .from(Candidate::Table, Candidate::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_candidate_election_kind")
                    .table(Candidate::Table)
                    .col(Candidate::ElectionKind)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CandidateSnapshot::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CandidateSnapshot::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CandidateSnapshot::CandidateId).string_len(32).not_null())
                    .col(ColumnDef::new(CandidateSnapshot::ElectionKind).string_len(16).not_null())
                    .col(ColumnDef::new(CandidateSnapshot::Votes).big_integer().not_null())
                    .col(ColumnDef::new(CandidateSnapshot::Donations).decimal_len(20, 2).not_null())
                    .col(
                        ColumnDef::new(CandidateSnapshot::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_candidate_snapshot_candidate")
                            .from(CandidateSnapshot::Table, CandidateSnapshot::CandidateId)
                            .to(Candidate::Table, Candidate::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_candidate_snapshot_candidate_id")
                    .table(CandidateSnapshot::Table)
                    .col(CandidateSnapshot::CandidateId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ElectionVote::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ElectionVote::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(ElectionVote::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(ElectionVote::ElectionKind).string_len(16).not_null())
                    .col(ColumnDef::new(ElectionVote::CandidateId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(ElectionVote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_election_vote_candidate")
                            .from(ElectionVote::Table, ElectionVote::CandidateId)
                            .to(Candidate::Table, Candidate::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one ballot per (voter, race, candidate)
        manager
            .create_index(
                Index::create()
                    .name("idx_election_vote_unique")
                    .table(ElectionVote::Table)
                    .col(ElectionVote::UserId)
                    .col(ElectionVote::ElectionKind)
                    .col(ElectionVote::CandidateId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_election_vote_election_kind")
                    .table(ElectionVote::Table)
                    .col(ElectionVote::ElectionKind)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ElectionVote::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(CandidateSnapshot::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Candidate::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Election::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Election {
    Table,
    Id,
    Kind,
    Status,
    DaysLeft,
    Seats,
}

#[derive(Iden)]
enum Candidate {
    Table,
    Id,
    UserId,
    ElectionKind,
    Votes,
    Donations,
    VotesPerHour,
    DonationsPerHour,
    CreatedAt,
}

#[derive(Iden)]
enum CandidateSnapshot {
    Table,
    Id,
    CandidateId,
    ElectionKind,
    Votes,
    Donations,
    CreatedAt,
}

#[derive(Iden)]
enum ElectionVote {
    Table,
    Id,
    UserId,
    ElectionKind,
    CandidateId,
    CreatedAt,
}
