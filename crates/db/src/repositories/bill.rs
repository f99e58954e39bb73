//! Bill, chamber vote and pool tracker repositories.

use crate::entities::{
    Bill, BillVoteHouse, BillVotePresidential, BillVoteSenate, GameTracker, bill,
    bill::{BillStage, BillStatus},
    bill_vote_house, bill_vote_presidential, bill_vote_senate, game_tracker,
};
use polity_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};

/// A legislative chamber. Each one keeps its ballots in its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chamber {
    /// `bill_vote_house`
    House,
    /// `bill_vote_senate`
    Senate,
    /// `bill_vote_presidential`
    Presidential,
}

impl Chamber {
    /// Chambers in the order a bill tick resolves them.
    ///
    /// A bill promoted out of one chamber lands in the one resolved just
    /// before it, so it cannot be tallied twice in the same tick.
    pub const RESOLUTION_ORDER: [Self; 3] = [Self::Presidential, Self::Senate, Self::House];

    /// The bill stage this chamber votes on.
    #[must_use]
    pub const fn stage(self) -> BillStage {
        match self {
            Self::House => BillStage::House,
            Self::Senate => BillStage::Senate,
            Self::Presidential => BillStage::Presidential,
        }
    }

    /// Lowercase name used in logs and error context.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::House => "house",
            Self::Senate => "senate",
            Self::Presidential => "presidential",
        }
    }
}

impl From<BillStage> for Chamber {
    fn from(stage: BillStage) -> Self {
        match stage {
            BillStage::House => Self::House,
            BillStage::Senate => Self::Senate,
            BillStage::Presidential => Self::Presidential,
        }
    }
}

/// Yes/no counts for one bill in one chamber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteTally {
    /// Ballots in favour.
    pub yes: u64,
    /// Ballots against.
    pub no: u64,
}

impl VoteTally {
    /// A strict majority of cast ballots is required; ties fail.
    #[must_use]
    pub const fn carried(&self) -> bool {
        self.yes > self.no
    }
}

/// Bill repository for database operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct BillRepository;

impl BillRepository {
    /// Create a new bill repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Bills currently being voted on in `stage` within `pool`, oldest first.
    pub async fn find_voting<C>(
        &self,
        conn: &C,
        stage: BillStage,
        pool: i32,
    ) -> AppResult<Vec<bill::Model>>
    where
        C: ConnectionTrait,
    {
        Bill::find()
            .filter(bill::Column::Stage.eq(stage))
            .filter(bill::Column::Status.eq(BillStatus::Voting))
            .filter(bill::Column::Pool.eq(pool))
            .order_by_asc(bill::Column::CreatedAt)
            .order_by_asc(bill::Column::Id)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// The queued House bill that has waited longest.
    pub async fn find_oldest_queued<C>(&self, conn: &C) -> AppResult<Option<bill::Model>>
    where
        C: ConnectionTrait,
    {
        Bill::find()
            .filter(bill::Column::Stage.eq(BillStage::House))
            .filter(bill::Column::Status.eq(BillStatus::Queued))
            .order_by_asc(bill::Column::CreatedAt)
            .order_by_asc(bill::Column::Id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Move a bill to a new stage, status and pool.
    pub async fn move_to<C>(
        &self,
        conn: &C,
        bill_id: &str,
        stage: BillStage,
        status: BillStatus,
        pool: Option<i32>,
    ) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let result = Bill::update_many()
            .col_expr(bill::Column::Stage, Expr::value(stage))
            .col_expr(bill::Column::Status, Expr::value(status))
            .col_expr(bill::Column::Pool, Expr::value(pool))
            .filter(bill::Column::Id.eq(bill_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Bill: {bill_id}")));
        }
        Ok(())
    }
}

/// Chamber ballot repository. The `Chamber` picks the vote table.
#[derive(Debug, Clone, Copy, Default)]
pub struct BillVoteRepository;

impl BillVoteRepository {
    /// Create a new bill vote repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Count the chamber's ballots on a bill.
    pub async fn tally<C>(&self, conn: &C, chamber: Chamber, bill_id: &str) -> AppResult<VoteTally>
    where
        C: ConnectionTrait,
    {
        let yes = count_ballots(conn, chamber, bill_id, true)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let no = count_ballots(conn, chamber, bill_id, false)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(VoteTally { yes, no })
    }
}

async fn count_ballots<C>(
    conn: &C,
    chamber: Chamber,
    bill_id: &str,
    vote_yes: bool,
) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    match chamber {
        Chamber::House => {
            BillVoteHouse::find()
                .filter(bill_vote_house::Column::BillId.eq(bill_id))
                .filter(bill_vote_house::Column::VoteYes.eq(vote_yes))
                .count(conn)
                .await
        }
        Chamber::Senate => {
            BillVoteSenate::find()
                .filter(bill_vote_senate::Column::BillId.eq(bill_id))
                .filter(bill_vote_senate::Column::VoteYes.eq(vote_yes))
                .count(conn)
                .await
        }
        Chamber::Presidential => {
            BillVotePresidential::find()
                .filter(bill_vote_presidential::Column::BillId.eq(bill_id))
                .filter(bill_vote_presidential::Column::VoteYes.eq(vote_yes))
                .count(conn)
                .await
        }
    }
}

/// Repository for the singleton game tracker row.
#[derive(Debug, Clone, Copy, Default)]
pub struct GameTrackerRepository;

impl GameTrackerRepository {
    /// Create a new game tracker repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// The pool the next bill tick will tally.
    pub async fn current_pool<C>(&self, conn: &C) -> AppResult<i32>
    where
        C: ConnectionTrait,
    {
        GameTracker::find_by_id(game_tracker::TRACKER_ID)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .map(|tracker| tracker.bill_pool)
            .ok_or_else(|| AppError::NotFound("Game tracker row".to_string()))
    }

    /// Store the pool for the next bill tick.
    pub async fn set_pool<C>(&self, conn: &C, pool: i32) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        GameTracker::update_many()
            .col_expr(game_tracker::Column::BillPool, Expr::value(pool))
            .filter(game_tracker::Column::Id.eq(game_tracker::TRACKER_ID))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
