//! Bill advancer.
//!
//! Bills vote in three rotating pools. Each tick closes the current pool:
//! the chambers are resolved top-down (presidential, senate, house) so a
//! bill promoted into a chamber is never tallied again in the same tick.
//! The oldest queued bill then takes the freed slot and the pool rotates.

use std::sync::Arc;

use chrono::{Duration, Utc};
use polity_common::{AppError, AppResult};
use polity_db::{
    entities::bill::{self, BillStage, BillStatus},
    repositories::{
        BillRepository, BillVoteRepository, Chamber, GameTrackerRepository, PartyRepository,
        TickGuardRepository, VoteTally,
    },
};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::feed::FeedService;

/// Guard key for the bill tick.
const JOB: &str = "bills";

/// Number of rotating voting pools.
pub const POOL_COUNT: i32 = 3;

/// The pool that closes on the tick after `pool`.
#[must_use]
pub const fn next_pool(pool: i32) -> i32 {
    if pool >= POOL_COUNT { 1 } else { pool + 1 }
}

/// Where a tallied bill goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Signed into law.
    Passed,
    /// Moves up to the given chamber and keeps voting in the same pool.
    Promoted(Chamber),
    /// Voted down; stays at its current stage.
    Defeated,
}

/// Decide a bill's fate from its chamber tally.
#[must_use]
pub const fn resolve(chamber: Chamber, tally: VoteTally) -> Resolution {
    if !tally.carried() {
        return Resolution::Defeated;
    }
    match chamber {
        Chamber::House => Resolution::Promoted(Chamber::Senate),
        Chamber::Senate => Resolution::Promoted(Chamber::Presidential),
        Chamber::Presidential => Resolution::Passed,
    }
}

/// Outcome of one bill tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillTickReport {
    pub skipped: bool,
    /// The pool whose bills were resolved.
    pub closed_pool: Option<i32>,
    /// The pool the next tick will resolve.
    pub next_pool: Option<i32>,
    pub passed: usize,
    pub defeated: usize,
    pub promoted: usize,
    /// Id of the queued bill that entered voting, if any.
    pub drawn: Option<String>,
    pub parties_removed: u64,
}

impl BillTickReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Resolves one bill pool per tick.
#[derive(Clone)]
pub struct BillAdvancer {
    db: Arc<DatabaseConnection>,
    bill_repo: BillRepository,
    ballot_repo: BillVoteRepository,
    tracker_repo: GameTrackerRepository,
    party_repo: PartyRepository,
    guard_repo: TickGuardRepository,
    feed: FeedService,
    min_interval: Duration,
}

impl BillAdvancer {
    /// Create a new bill advancer.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        party_repo: PartyRepository,
        min_interval: Duration,
    ) -> Self {
        Self {
            db,
            bill_repo: BillRepository::new(),
            ballot_repo: BillVoteRepository::new(),
            tracker_repo: GameTrackerRepository::new(),
            party_repo,
            guard_repo: TickGuardRepository::new(),
            feed: FeedService::new(),
            min_interval,
        }
    }

    /// Run one bill tick.
    ///
    /// Any failure before the commit rolls the whole tick back, pool
    /// rotation included. Empty-party cleanup runs after the commit and
    /// never fails the tick.
    pub async fn advance(&self) -> AppResult<BillTickReport> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !self
            .guard_repo
            .try_claim(&txn, JOB, Utc::now(), self.min_interval)
            .await?
        {
            txn.commit()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            info!("Bills already advanced within interval; skipping");
            return Ok(BillTickReport::skipped());
        }

        let pool = self.tracker_repo.current_pool(&txn).await?;
        if !(1..=POOL_COUNT).contains(&pool) {
            return Err(AppError::stage(
                "pool",
                format!("game tracker holds invalid bill pool {pool}"),
            ));
        }
        info!(pool = pool, "Closing bill pool");

        let mut report = BillTickReport {
            closed_pool: Some(pool),
            ..BillTickReport::default()
        };

        for chamber in Chamber::RESOLUTION_ORDER {
            self.resolve_chamber(&txn, chamber, pool, &mut report)
                .await
                .map_err(|e| AppError::stage(chamber.as_str(), e))?;
        }

        if let Some(drawn) = self.bill_repo.find_oldest_queued(&txn).await? {
            self.bill_repo
                .move_to(
                    &txn,
                    &drawn.id,
                    BillStage::House,
                    BillStatus::Voting,
                    Some(pool),
                )
                .await?;
            info!(bill_id = %drawn.id, pool = pool, "Queued bill entered voting");
            report.drawn = Some(drawn.id);
        }

        let next = next_pool(pool);
        self.tracker_repo.set_pool(&txn, next).await?;
        report.next_pool = Some(next);

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        report.parties_removed = self.remove_empty_parties().await;

        info!(
            closed_pool = pool,
            next_pool = next,
            passed = report.passed,
            defeated = report.defeated,
            promoted = report.promoted,
            drawn = ?report.drawn,
            parties_removed = report.parties_removed,
            "Bill tick finished"
        );
        Ok(report)
    }

    async fn resolve_chamber<C>(
        &self,
        conn: &C,
        chamber: Chamber,
        pool: i32,
        report: &mut BillTickReport,
    ) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let bills = self
            .bill_repo
            .find_voting(conn, chamber.stage(), pool)
            .await?;

        for bill in bills {
            let tally = self.ballot_repo.tally(conn, chamber, &bill.id).await?;
            let resolution = resolve(chamber, tally);
            debug!(
                bill_id = %bill.id,
                chamber = chamber.as_str(),
                yes = tally.yes,
                no = tally.no,
                ?resolution,
                "Tallied bill"
            );

            match resolution {
                Resolution::Passed => {
                    self.bill_repo
                        .move_to(conn, &bill.id, bill.stage, BillStatus::Passed, bill.pool)
                        .await?;
                    self.announce(conn, &bill, "has been signed into law".to_string())
                        .await?;
                    info!(bill_id = %bill.id, "Bill passed");
                    report.passed += 1;
                }
                Resolution::Promoted(to) => {
                    self.bill_repo
                        .move_to(conn, &bill.id, to.stage(), BillStatus::Voting, bill.pool)
                        .await?;
                    info!(bill_id = %bill.id, to = to.as_str(), "Bill promoted");
                    report.promoted += 1;
                }
                Resolution::Defeated => {
                    self.bill_repo
                        .move_to(conn, &bill.id, bill.stage, BillStatus::Defeated, bill.pool)
                        .await?;
                    self.announce(
                        conn,
                        &bill,
                        format!("was defeated in the {} vote", chamber.as_str()),
                    )
                    .await?;
                    info!(bill_id = %bill.id, chamber = chamber.as_str(), "Bill defeated");
                    report.defeated += 1;
                }
            }
        }

        Ok(())
    }

    async fn announce<C>(&self, conn: &C, bill: &bill::Model, what: String) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        self.feed
            .post(
                conn,
                Some(&bill.creator_id),
                format!("Bill \"{}\" {what}", bill.title),
            )
            .await
    }

    /// Delete parties with no members. Failures are logged and ignored.
    async fn remove_empty_parties(&self) -> u64 {
        let empty = match self.party_repo.find_empty().await {
            Ok(parties) => parties,
            Err(e) => {
                warn!(error = %e, "Failed to look up empty parties");
                return 0;
            }
        };

        let ids: Vec<String> = empty.into_iter().map(|party| party.id).collect();
        match self.party_repo.delete_with_stances(&ids).await {
            Ok(removed) => {
                if removed > 0 {
                    info!(removed = removed, "Removed empty parties");
                }
                removed
            }
            Err(e) => {
                warn!(error = %e, "Failed to remove empty parties");
                0
            }
        }
    }
}
