//! Election, candidate and ballot repositories.
//!
//! These run inside an election tick, so every method borrows the caller's
//! connection or transaction instead of holding a pool.

use crate::entities::{
    Candidate, CandidateSnapshot, Election, ElectionVote, candidate, candidate_snapshot, election,
    election::{ElectionKind, ElectionStatus},
    election_vote,
};
use polity_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, sea_query::Expr,
};

/// Election repository for database operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElectionRepository;

impl ElectionRepository {
    /// Create a new election repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Get the election row for `kind`.
    ///
    /// The rows are seeded by migration; a missing row is a setup fault.
    pub async fn get_by_kind<C>(&self, conn: &C, kind: ElectionKind) -> AppResult<election::Model>
    where
        C: ConnectionTrait,
    {
        Election::find()
            .filter(election::Column::Kind.eq(kind))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Election: {kind}")))
    }

    /// Persist a phase change or countdown step.
    ///
    /// `seats` is left untouched when `None`.
    pub async fn save_phase<C>(
        &self,
        conn: &C,
        id: i32,
        status: ElectionStatus,
        days_left: i32,
        seats: Option<i32>,
    ) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let mut update = Election::update_many()
            .col_expr(election::Column::Status, Expr::value(status))
            .col_expr(election::Column::DaysLeft, Expr::value(days_left));
        if let Some(seats) = seats {
            update = update.col_expr(election::Column::Seats, Expr::value(seats));
        }

        update
            .filter(election::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

/// Candidate repository for database operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateRepository;

impl CandidateRepository {
    /// Create a new candidate repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Count candidates running in `kind`.
    pub async fn count_by_kind<C>(&self, conn: &C, kind: ElectionKind) -> AppResult<u64>
    where
        C: ConnectionTrait,
    {
        use sea_orm::PaginatorTrait;

        Candidate::find()
            .filter(candidate::Column::ElectionKind.eq(kind))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All candidates in `kind`, most votes first.
    pub async fn find_by_kind<C>(
        &self,
        conn: &C,
        kind: ElectionKind,
    ) -> AppResult<Vec<candidate::Model>>
    where
        C: ConnectionTrait,
    {
        Candidate::find()
            .filter(candidate::Column::ElectionKind.eq(kind))
            .order_by_desc(candidate::Column::Votes)
            .order_by_asc(candidate::Column::Id)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Add one hour of campaign accrual to every candidate in `kind`.
    pub async fn accrue<C>(&self, conn: &C, kind: ElectionKind) -> AppResult<u64>
    where
        C: ConnectionTrait,
    {
        let result = Candidate::update_many()
            .col_expr(
                candidate::Column::Votes,
                Expr::col(candidate::Column::Votes).add(Expr::col(candidate::Column::VotesPerHour)),
            )
            .col_expr(
                candidate::Column::Donations,
                Expr::col(candidate::Column::Donations)
                    .add(Expr::col(candidate::Column::DonationsPerHour)),
            )
            .filter(candidate::Column::ElectionKind.eq(kind))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Append campaign snapshot rows.
    pub async fn insert_snapshots<C>(
        &self,
        conn: &C,
        snapshots: Vec<candidate_snapshot::ActiveModel>,
    ) -> AppResult<u64>
    where
        C: ConnectionTrait,
    {
        if snapshots.is_empty() {
            return Ok(0);
        }

        CandidateSnapshot::insert_many(snapshots)
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove every candidate in `kind`. Snapshots go with them.
    pub async fn delete_by_kind<C>(&self, conn: &C, kind: ElectionKind) -> AppResult<u64>
    where
        C: ConnectionTrait,
    {
        let result = Candidate::delete_many()
            .filter(candidate::Column::ElectionKind.eq(kind))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}

/// Election ballot repository for database operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElectionVoteRepository;

impl ElectionVoteRepository {
    /// Create a new election vote repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Remove every ballot cast in `kind`.
    pub async fn delete_by_kind<C>(&self, conn: &C, kind: ElectionKind) -> AppResult<u64>
    where
        C: ConnectionTrait,
    {
        let result = ElectionVote::delete_many()
            .filter(election_vote::Column::ElectionKind.eq(kind))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_candidate(id: &str, votes: i64) -> candidate::Model {
        candidate::Model {
            id: id.to_string(),
            user_id: format!("user_{id}"),
            election_kind: ElectionKind::Senate,
            votes,
            donations: Decimal::new(1050, 2),
            votes_per_hour: 2,
            donations_per_hour: Decimal::ONE,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_kind_found() {
        let row = election::Model {
            id: 1,
            kind: ElectionKind::President,
            status: ElectionStatus::Voting,
            days_left: 3,
            seats: 1,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[row]])
            .into_connection();

        let repo = ElectionRepository::new();
        let result = repo.get_by_kind(&db, ElectionKind::President).await.unwrap();

        assert_eq!(result.status, ElectionStatus::Voting);
        assert_eq!(result.days_left, 3);
    }

    #[tokio::test]
    async fn test_get_by_kind_missing_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<election::Model>::new()])
            .into_connection();

        let repo = ElectionRepository::new();
        let result = repo.get_by_kind(&db, ElectionKind::Senate).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_kind() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                create_test_candidate("c1", 10),
                create_test_candidate("c2", 7),
            ]])
            .into_connection();

        let repo = CandidateRepository::new();
        let result = repo.find_by_kind(&db, ElectionKind::Senate).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].votes, 10);
    }

    #[tokio::test]
    async fn test_count_by_kind() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(7))
            }]])
            .into_connection();

        let repo = CandidateRepository::new();
        let count = repo.count_by_kind(&db, ElectionKind::Senate).await.unwrap();

        assert_eq!(count, 7);
    }

    #[tokio::test]
    async fn test_insert_snapshots_empty_skips_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let repo = CandidateRepository::new();
        assert_eq!(repo.insert_snapshots(&db, Vec::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_snapshots() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let snapshot = candidate_snapshot::ActiveModel {
            id: Set("snap1".to_string()),
            candidate_id: Set("c1".to_string()),
            election_kind: Set(ElectionKind::Senate),
            votes: Set(12),
            donations: Set(Decimal::new(1150, 2)),
            created_at: Set(Utc::now().into()),
        };

        let repo = CandidateRepository::new();
        assert_eq!(repo.insert_snapshots(&db, vec![snapshot]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_votes_by_kind() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 9,
            }])
            .into_connection();

        let repo = ElectionVoteRepository::new();
        let deleted = repo
            .delete_by_kind(&db, ElectionKind::President)
            .await
            .unwrap();

        assert_eq!(deleted, 9);
    }
}
