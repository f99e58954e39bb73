//! Election advancer.
//!
//! One tick is one simulated day. The President and Senate races advance
//! independently, each in its own transaction, so a failure in one never
//! rolls back the other.
//!
//! Every phase counts down one day per tick. When a tick finds a phase on
//! its last day it performs the transition instead:
//!
//! | from      | to        | President | Senate | side effects                         |
//! |-----------|-----------|-----------|--------|--------------------------------------|
//! | candidate | voting    | 5 days    | 2 days | senate seats recomputed              |
//! | voting    | concluded | 4 days    | 3 days | winners seated, feed entries         |
//! | concluded | candidate | 5 days    | 2 days | candidates and ballots deleted       |

use std::{collections::HashMap, sync::Arc};

use chrono::{Duration, Utc};
use polity_common::{AppError, AppResult};
use polity_db::{
    entities::{
        candidate,
        election::{ElectionKind, ElectionStatus},
        user::UserRole,
    },
    repositories::{
        CandidateRepository, ElectionRepository, ElectionVoteRepository, TickGuardRepository,
        UserRepository,
    },
};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::{
    feed::FeedService,
    random::{self, RandomService, RandomSource},
};

/// Minimum Senate size regardless of how few candidates declare.
pub const MIN_SENATE_SEATS: i32 = 3;

/// Days spent in a phase, by the phase being entered.
const fn phase_length(kind: ElectionKind, phase: ElectionStatus) -> i32 {
    match (kind, phase) {
        (ElectionKind::President, ElectionStatus::Candidate | ElectionStatus::Voting) => 5,
        (ElectionKind::President, ElectionStatus::Concluded) => 4,
        (ElectionKind::Senate, ElectionStatus::Candidate | ElectionStatus::Voting) => 2,
        (ElectionKind::Senate, ElectionStatus::Concluded) => 3,
    }
}

/// The phase that follows `status` in the cycle.
const fn next_phase(status: ElectionStatus) -> ElectionStatus {
    match status {
        ElectionStatus::Candidate => ElectionStatus::Voting,
        ElectionStatus::Voting => ElectionStatus::Concluded,
        ElectionStatus::Concluded => ElectionStatus::Candidate,
    }
}

/// What one tick does to an election row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStep {
    /// Stay in the phase with one day fewer.
    CountDown { days_left: i32 },
    /// Enter `to` with a fresh countdown.
    Advance { to: ElectionStatus, days_left: i32 },
}

/// Decide the step for an election currently in `status` with `days_left`.
///
/// The last day of a phase (`days_left <= 1`) transitions, so the stored
/// value never goes below 1.
#[must_use]
pub const fn next_step(kind: ElectionKind, status: ElectionStatus, days_left: i32) -> PhaseStep {
    if days_left > 1 {
        return PhaseStep::CountDown {
            days_left: days_left - 1,
        };
    }

    let to = next_phase(status);
    PhaseStep::Advance {
        to,
        days_left: phase_length(kind, to),
    }
}

/// Senate seats for a race with `candidate_count` declared candidates.
#[must_use]
pub fn senate_seats(candidate_count: u64) -> i32 {
    let half = i32::try_from(candidate_count.div_ceil(2)).unwrap_or(i32::MAX);
    half.max(MIN_SENATE_SEATS)
}

/// Pick the President among `candidates`.
///
/// The top vote total wins; a tie at the top is broken uniformly at
/// random. `None` when nobody ran.
pub fn select_president<'a>(
    candidates: &'a [candidate::Model],
    random: &dyn RandomSource,
) -> Option<&'a candidate::Model> {
    let top = candidates.iter().map(|c| c.votes).max()?;
    let tied: Vec<&candidate::Model> = candidates.iter().filter(|c| c.votes == top).collect();

    let winner = random::pick(random, &tied).copied();
    if tied.len() > 1 {
        debug!(
            tie_set = tied.len(),
            votes = top,
            winner = ?winner.map(|c| &c.user_id),
            "Broke presidential tie"
        );
    }
    winner
}

/// Pick up to `seats` Senators among `candidates`.
///
/// Everyone strictly above the last provisional seat's vote count wins;
/// the seats left over go to a uniform random subset of the candidates
/// tied at that count.
pub fn select_senators<'a>(
    candidates: &'a [candidate::Model],
    seats: usize,
    random: &dyn RandomSource,
) -> Vec<&'a candidate::Model> {
    if seats == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<&candidate::Model> = candidates.iter().collect();
    ranked.sort_by(|a, b| b.votes.cmp(&a.votes).then_with(|| a.id.cmp(&b.id)));

    if ranked.len() <= seats {
        return ranked;
    }

    let threshold = ranked[seats - 1].votes;
    let mut winners: Vec<&candidate::Model> =
        ranked.iter().copied().filter(|c| c.votes > threshold).collect();
    let mut tied: Vec<&candidate::Model> =
        ranked.iter().copied().filter(|c| c.votes == threshold).collect();

    let remaining = seats - winners.len();
    if tied.len() > remaining {
        random::shuffle(random, &mut tied);
        debug!(
            tie_set = tied.len(),
            seats = remaining,
            votes = threshold,
            "Broke senate tie for the last seats"
        );
    }
    tied.truncate(remaining);
    winners.extend(tied);
    winners
}

/// Result of one race within an election tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum RaceOutcome {
    /// Another tick already advanced this race within the minimum interval.
    Skipped,
    /// The phase lost a day.
    #[serde(rename_all = "camelCase")]
    CountedDown {
        status: ElectionStatus,
        days_left: i32,
    },
    /// The phase ended and the next began.
    #[serde(rename_all = "camelCase")]
    Advanced {
        from: ElectionStatus,
        to: ElectionStatus,
        days_left: i32,
        elected: usize,
        appointed: usize,
    },
    /// The race's transaction was rolled back.
    Failed { error: String },
}

impl RaceOutcome {
    /// Whether this race failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl std::fmt::Display for RaceOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skipped => f.write_str("skipped"),
            Self::CountedDown { status, days_left } => {
                write!(f, "{status}: {days_left} days left")
            }
            Self::Advanced {
                from,
                to,
                days_left,
                elected,
                appointed,
            } => {
                write!(f, "{from} -> {to} ({days_left} days)")?;
                if *to == ElectionStatus::Concluded {
                    write!(f, ", {elected} elected, {appointed} appointed")?;
                }
                Ok(())
            }
            Self::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Outcome of one election tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElectionTickReport {
    pub president: RaceOutcome,
    pub senate: RaceOutcome,
}

impl ElectionTickReport {
    /// Whether both races succeeded or were skipped.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !self.president.is_failure() && !self.senate.is_failure()
    }
}

/// Users seated by a concluded race.
#[derive(Debug, Default)]
struct Seating {
    elected: usize,
    appointed: usize,
}

/// Advances both elections by one day.
#[derive(Clone)]
pub struct ElectionAdvancer {
    db: Arc<DatabaseConnection>,
    election_repo: ElectionRepository,
    candidate_repo: CandidateRepository,
    ballot_repo: ElectionVoteRepository,
    user_repo: UserRepository,
    guard_repo: TickGuardRepository,
    feed: FeedService,
    random: RandomService,
    min_interval: Duration,
}

impl ElectionAdvancer {
    /// Create a new election advancer.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        user_repo: UserRepository,
        random: RandomService,
        min_interval: Duration,
    ) -> Self {
        Self {
            db,
            election_repo: ElectionRepository::new(),
            candidate_repo: CandidateRepository::new(),
            ballot_repo: ElectionVoteRepository::new(),
            user_repo,
            guard_repo: TickGuardRepository::new(),
            feed: FeedService::new(),
            random,
            min_interval,
        }
    }

    /// Run one tick for both races.
    pub async fn advance(&self) -> ElectionTickReport {
        let president = self.run_race(ElectionKind::President).await;
        let senate = self.run_race(ElectionKind::Senate).await;

        let report = ElectionTickReport { president, senate };
        info!(
            president = %report.president,
            senate = %report.senate,
            "Election tick finished"
        );
        report
    }

    async fn run_race(&self, kind: ElectionKind) -> RaceOutcome {
        match self.advance_race(kind).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let e = AppError::stage(kind.as_str(), e);
                error!(election = %kind, error = %e, "Election race failed; rolled back");
                RaceOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn advance_race(&self, kind: ElectionKind) -> AppResult<RaceOutcome> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let job = format!("election:{kind}");
        let claimed = self
            .guard_repo
            .try_claim(&txn, &job, Utc::now(), self.min_interval)
            .await?;
        if !claimed {
            txn.commit()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            info!(election = %kind, "Election already advanced within interval; skipping");
            return Ok(RaceOutcome::Skipped);
        }

        let election = self.election_repo.get_by_kind(&txn, kind).await?;

        let outcome = match next_step(kind, election.status, election.days_left) {
            PhaseStep::CountDown { days_left } => {
                self.election_repo
                    .save_phase(&txn, election.id, election.status, days_left, None)
                    .await?;
                RaceOutcome::CountedDown {
                    status: election.status,
                    days_left,
                }
            }
            PhaseStep::Advance { to, days_left } => {
                let mut seats = None;
                let mut seating = Seating::default();

                match to {
                    ElectionStatus::Voting => {
                        if kind == ElectionKind::Senate {
                            let declared = self.candidate_repo.count_by_kind(&txn, kind).await?;
                            let recomputed = senate_seats(declared);
                            info!(candidates = declared, seats = recomputed, "Senate seats set");
                            seats = Some(recomputed);
                        }
                    }
                    ElectionStatus::Concluded => {
                        seating = match kind {
                            ElectionKind::President => self.seat_president(&txn).await?,
                            ElectionKind::Senate => {
                                self.seat_senate(&txn, election.seats).await?
                            }
                        };
                    }
                    ElectionStatus::Candidate => {
                        let ballots = self.ballot_repo.delete_by_kind(&txn, kind).await?;
                        let candidates = self.candidate_repo.delete_by_kind(&txn, kind).await?;
                        info!(
                            election = %kind,
                            ballots = ballots,
                            candidates = candidates,
                            "Election cycle reset"
                        );
                    }
                }

                self.election_repo
                    .save_phase(&txn, election.id, to, days_left, seats)
                    .await?;

                RaceOutcome::Advanced {
                    from: election.status,
                    to,
                    days_left,
                    elected: seating.elected,
                    appointed: seating.appointed,
                }
            }
        };

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(outcome)
    }

    async fn seat_president<C>(&self, conn: &C) -> AppResult<Seating>
    where
        C: ConnectionTrait,
    {
        self.user_repo.strip_role(conn, UserRole::President).await?;

        let candidates = self
            .candidate_repo
            .find_by_kind(conn, ElectionKind::President)
            .await?;

        let Some(winner) = select_president(&candidates, self.random.as_ref()) else {
            info!("No presidential candidates; the office stays vacant");
            return Ok(Seating::default());
        };

        self.user_repo
            .grant_role(conn, &winner.user_id, UserRole::President)
            .await?;

        let names = self.usernames(conn, &[winner.user_id.clone()]).await?;
        self.feed
            .post(
                conn,
                Some(&winner.user_id),
                format!(
                    "{} has been elected President with {} votes",
                    display_name(&names, &winner.user_id),
                    winner.votes
                ),
            )
            .await?;

        info!(user_id = %winner.user_id, votes = winner.votes, "President elected");
        Ok(Seating {
            elected: 1,
            appointed: 0,
        })
    }

    async fn seat_senate<C>(&self, conn: &C, seats: i32) -> AppResult<Seating>
    where
        C: ConnectionTrait,
    {
        self.user_repo.strip_role(conn, UserRole::Senator).await?;

        let seats = usize::try_from(seats).unwrap_or(0);
        let candidates = self
            .candidate_repo
            .find_by_kind(conn, ElectionKind::Senate)
            .await?;
        let winners = select_senators(&candidates, seats, self.random.as_ref());

        let winner_ids: Vec<String> = winners.iter().map(|c| c.user_id.clone()).collect();
        let names = self.usernames(conn, &winner_ids).await?;

        for winner in &winners {
            self.user_repo
                .grant_role(conn, &winner.user_id, UserRole::Senator)
                .await?;
            self.feed
                .post(
                    conn,
                    Some(&winner.user_id),
                    format!(
                        "{} has been elected to the Senate with {} votes",
                        display_name(&names, &winner.user_id),
                        winner.votes
                    ),
                )
                .await?;
        }

        let missing = seats.saturating_sub(winners.len());
        let mut appointed = 0;
        if missing > 0 {
            let mut pool = self.user_repo.find_appointable(conn, &winner_ids).await?;
            random::shuffle(self.random.as_ref(), &mut pool);
            pool.truncate(missing);

            if pool.len() < missing {
                warn!(
                    seats = missing,
                    eligible = pool.len(),
                    "Not enough eligible users to fill the Senate"
                );
            }

            for user in &pool {
                self.user_repo
                    .grant_role(conn, &user.id, UserRole::Senator)
                    .await?;
                self.feed
                    .post(
                        conn,
                        Some(&user.id),
                        format!("{} has been appointed to the Senate", user.username),
                    )
                    .await?;
                debug!(user_id = %user.id, "Appointed senator");
            }
            appointed = pool.len();
        }

        info!(
            seats = seats,
            elected = winners.len(),
            appointed = appointed,
            "Senate seated"
        );
        Ok(Seating {
            elected: winners.len(),
            appointed,
        })
    }

    async fn usernames<C>(&self, conn: &C, ids: &[String]) -> AppResult<HashMap<String, String>>
    where
        C: ConnectionTrait,
    {
        Ok(self
            .user_repo
            .find_by_ids(conn, ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user.username))
            .collect())
    }
}

fn display_name<'a>(names: &'a HashMap<String, String>, user_id: &'a str) -> &'a str {
    names.get(user_id).map_or(user_id, String::as_str)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::random::{ScriptedRandom, SeededRandom};
    use polity_db::entities::{election, user};
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn cand(id: &str, votes: i64) -> candidate::Model {
        candidate::Model {
            id: id.to_string(),
            user_id: format!("user_{id}"),
            election_kind: ElectionKind::Senate,
            votes,
            donations: Decimal::ZERO,
            votes_per_hour: 0,
            donations_per_hour: Decimal::ZERO,
            created_at: Utc::now().into(),
        }
    }

    fn member(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            token: None,
            role: UserRole::Representative,
            party_id: None,
            balance: Decimal::ZERO,
            is_admin: false,
            is_banned: false,
            is_active: true,
            created_at: Utc::now().into(),
        }
    }

    fn exec(rows: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: rows,
        }
    }

    fn election_row(kind: ElectionKind, status: ElectionStatus, days_left: i32) -> election::Model {
        election::Model {
            id: match kind {
                ElectionKind::President => 1,
                ElectionKind::Senate => 2,
            },
            kind,
            status,
            days_left,
            seats: if kind == ElectionKind::Senate { 3 } else { 1 },
        }
    }

    fn advancer(db: MockDatabase, random: RandomService) -> ElectionAdvancer {
        let db = Arc::new(db.into_connection());
        ElectionAdvancer::new(
            Arc::clone(&db),
            UserRepository::new(db),
            random,
            Duration::hours(12),
        )
    }

    /// Run one tick and return the report with every statement it sent.
    async fn advance_logged(
        db: MockDatabase,
        random: RandomService,
    ) -> (ElectionTickReport, Vec<String>) {
        let db = Arc::new(db.into_connection());
        let advancer = ElectionAdvancer::new(
            Arc::clone(&db),
            UserRepository::new(Arc::clone(&db)),
            random,
            Duration::hours(12),
        );
        let report = advancer.advance().await;
        drop(advancer);

        let statements = Arc::try_unwrap(db)
            .unwrap()
            .into_transaction_log()
            .iter()
            .flat_map(|txn| txn.statements().iter().map(ToString::to_string))
            .collect();
        (report, statements)
    }

    #[test]
    fn test_countdown_decrements() {
        assert_eq!(
            next_step(ElectionKind::President, ElectionStatus::Voting, 4),
            PhaseStep::CountDown { days_left: 3 }
        );
    }

    #[test]
    fn test_transition_constants() {
        use ElectionKind::{President, Senate};
        use ElectionStatus::{Candidate, Concluded, Voting};

        let cases = [
            (President, Candidate, Voting, 5),
            (President, Voting, Concluded, 4),
            (President, Concluded, Candidate, 5),
            (Senate, Candidate, Voting, 2),
            (Senate, Voting, Concluded, 3),
            (Senate, Concluded, Candidate, 2),
        ];

        for (kind, from, to, days_left) in cases {
            assert_eq!(
                next_step(kind, from, 1),
                PhaseStep::Advance { to, days_left },
                "{kind} {from}"
            );
        }
    }

    #[test]
    fn test_zero_days_left_transitions_instead_of_going_negative() {
        assert_eq!(
            next_step(ElectionKind::Senate, ElectionStatus::Candidate, 0),
            PhaseStep::Advance {
                to: ElectionStatus::Voting,
                days_left: 2
            }
        );
    }

    #[test]
    fn test_cycle_order_over_many_ticks() {
        for kind in [ElectionKind::President, ElectionKind::Senate] {
            let mut status = ElectionStatus::Candidate;
            let mut days_left = phase_length(kind, status);
            let mut visited = vec![status];

            for _ in 0..60 {
                match next_step(kind, status, days_left) {
                    PhaseStep::CountDown { days_left: next } => {
                        assert_eq!(next, days_left - 1);
                        days_left = next;
                    }
                    PhaseStep::Advance { to, days_left: next } => {
                        assert_eq!(to, next_phase(status));
                        status = to;
                        days_left = next;
                        visited.push(status);
                    }
                }
                assert!(days_left >= 1);
            }

            assert_eq!(
                &visited[..4],
                &[
                    ElectionStatus::Candidate,
                    ElectionStatus::Voting,
                    ElectionStatus::Concluded,
                    ElectionStatus::Candidate
                ]
            );
        }
    }

    #[test]
    fn test_senate_seats() {
        assert_eq!(senate_seats(0), 3);
        assert_eq!(senate_seats(5), 3);
        assert_eq!(senate_seats(6), 3);
        assert_eq!(senate_seats(7), 4);
        assert_eq!(senate_seats(10), 5);
        assert_eq!(senate_seats(11), 6);
    }

    #[test]
    fn test_president_tie_is_fair_and_excludes_runner_up() {
        let candidates = vec![cand("a", 10), cand("b", 10), cand("c", 5)];
        let random = SeededRandom::new(2024);

        let trials = 2000;
        let mut a_wins = 0;
        for _ in 0..trials {
            let winner = select_president(&candidates, &random).unwrap();
            assert_ne!(winner.id, "c");
            if winner.id == "a" {
                a_wins += 1;
            }
        }

        let share = f64::from(a_wins) / f64::from(trials);
        assert!((0.4..0.6).contains(&share), "a won {share:.3} of ties");
    }

    #[test]
    fn test_president_without_candidates() {
        assert!(select_president(&[], &SeededRandom::new(1)).is_none());
    }

    #[test]
    fn test_president_clear_winner_ignores_random() {
        let candidates = vec![cand("a", 3), cand("b", 9)];
        let winner = select_president(&candidates, &ScriptedRandom::new(vec![1])).unwrap();
        assert_eq!(winner.id, "b");
    }

    #[test]
    fn test_senate_tie_for_last_seat() {
        let candidates = vec![cand("a", 5), cand("b", 3), cand("c", 3), cand("d", 1)];
        let random = SeededRandom::new(99);

        let mut saw_b = false;
        let mut saw_c = false;
        for _ in 0..200 {
            let winners: Vec<&str> = select_senators(&candidates, 2, &random)
                .iter()
                .map(|c| c.id.as_str())
                .collect();

            assert_eq!(winners.len(), 2);
            assert!(winners.contains(&"a"));
            assert!(!winners.contains(&"d"));
            let b = winners.contains(&"b");
            let c = winners.contains(&"c");
            assert!(b ^ c);
            saw_b |= b;
            saw_c |= c;
        }

        assert!(saw_b && saw_c);
    }

    #[test]
    fn test_senate_fewer_candidates_than_seats() {
        let candidates = vec![cand("a", 1), cand("b", 4)];
        let winners = select_senators(&candidates, 3, &SeededRandom::new(5));
        assert_eq!(winners.len(), 2);
        assert_eq!(winners[0].id, "b");
    }

    #[test]
    fn test_senate_zero_seats() {
        let candidates = vec![cand("a", 1)];
        assert!(select_senators(&candidates, 0, &SeededRandom::new(5)).is_empty());
    }

    #[test]
    fn test_outcome_display() {
        let advanced = RaceOutcome::Advanced {
            from: ElectionStatus::Voting,
            to: ElectionStatus::Concluded,
            days_left: 3,
            elected: 2,
            appointed: 1,
        };
        assert_eq!(
            advanced.to_string(),
            "voting -> concluded (3 days), 2 elected, 1 appointed"
        );
        assert_eq!(
            RaceOutcome::CountedDown {
                status: ElectionStatus::Candidate,
                days_left: 4
            }
            .to_string(),
            "candidate: 4 days left"
        );
        assert_eq!(RaceOutcome::Skipped.to_string(), "skipped");
    }

    #[tokio::test]
    async fn test_both_races_skipped_inside_interval() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([exec(0), exec(0)]);
        let report = advancer(db, Arc::new(SeededRandom::new(1))).advance().await;

        assert_eq!(report.president, RaceOutcome::Skipped);
        assert_eq!(report.senate, RaceOutcome::Skipped);
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_countdown_tick() {
        // president: guard, save; senate: guard refused
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(1), exec(1), exec(0)])
            .append_query_results([[election_row(
                ElectionKind::President,
                ElectionStatus::Voting,
                3,
            )]]);

        let report = advancer(db, Arc::new(SeededRandom::new(1))).advance().await;

        assert_eq!(
            report.president,
            RaceOutcome::CountedDown {
                status: ElectionStatus::Voting,
                days_left: 2
            }
        );
        assert_eq!(report.senate, RaceOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_senate_opens_voting_with_recomputed_seats() {
        // president skipped; senate: guard, count, save
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0), exec(1), exec(1)])
            .append_query_results([[election_row(
                ElectionKind::Senate,
                ElectionStatus::Candidate,
                1,
            )]])
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(9))
            }]]);

        let report = advancer(db, Arc::new(SeededRandom::new(1))).advance().await;

        assert_eq!(
            report.senate,
            RaceOutcome::Advanced {
                from: ElectionStatus::Candidate,
                to: ElectionStatus::Voting,
                days_left: 2,
                elected: 0,
                appointed: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_cycle_reset_deletes_race_rows() {
        // president: guard, delete ballots, delete candidates, save; senate skipped
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(1), exec(12), exec(3), exec(1), exec(0)])
            .append_query_results([[election_row(
                ElectionKind::President,
                ElectionStatus::Concluded,
                1,
            )]]);

        let (report, statements) = advance_logged(db, Arc::new(SeededRandom::new(1))).await;

        assert_eq!(
            report.president,
            RaceOutcome::Advanced {
                from: ElectionStatus::Concluded,
                to: ElectionStatus::Candidate,
                days_left: 5,
                elected: 0,
                appointed: 0,
            }
        );

        let deletes: Vec<&String> = statements
            .iter()
            .filter(|sql| sql.starts_with("DELETE"))
            .collect();
        assert_eq!(deletes.len(), 2, "{deletes:?}");
        assert!(deletes.iter().any(|sql| sql.contains(r#"FROM "election_vote""#)));
        assert!(deletes.iter().any(|sql| sql.contains(r#"FROM "candidate""#)));
        for sql in deletes {
            assert!(sql.contains(r#""election_kind" = 'president'"#), "{sql}");
            assert!(!sql.contains("'senate'"), "{sql}");
        }
    }

    #[tokio::test]
    async fn test_president_concludes_with_scripted_tie_break() {
        // guard, strip, grant, feed, save; then senate skipped
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(1), exec(1), exec(1), exec(1), exec(1), exec(0)])
            .append_query_results([[election_row(
                ElectionKind::President,
                ElectionStatus::Voting,
                1,
            )]])
            .append_query_results([vec![cand("a", 10), cand("b", 10), cand("c", 5)]])
            .append_query_results([[member("user_b", "bob")]]);

        let (report, statements) = advance_logged(db, Arc::new(ScriptedRandom::new(vec![1]))).await;

        assert_eq!(
            report.president,
            RaceOutcome::Advanced {
                from: ElectionStatus::Voting,
                to: ElectionStatus::Concluded,
                days_left: 4,
                elected: 1,
                appointed: 0,
            }
        );

        let role_writes: Vec<&String> = statements
            .iter()
            .filter(|sql| sql.starts_with(r#"UPDATE "user" SET "role""#))
            .collect();
        assert_eq!(role_writes.len(), 2, "{role_writes:?}");
        assert!(role_writes[0].contains(r#"'representative' WHERE "user"."role" = 'president'"#));
        assert!(role_writes[1].contains(r#"'president' WHERE "user"."id" = 'user_b'"#));
        assert!(
            statements
                .iter()
                .any(|sql| sql.starts_with(r#"INSERT INTO "feed""#) && sql.contains("bob has been elected President"))
        );
    }

    #[tokio::test]
    async fn test_senate_appoints_when_short_of_candidates() {
        // president skipped; senate (3 seats, 1 candidate):
        // guard, strip, grant+feed winner, grant+feed x2 appointees, save
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                exec(0),
                exec(1),
                exec(2),
                exec(1),
                exec(1),
                exec(1),
                exec(1),
                exec(1),
                exec(1),
                exec(1),
            ])
            .append_query_results([[election_row(
                ElectionKind::Senate,
                ElectionStatus::Voting,
                1,
            )]])
            .append_query_results([vec![cand("a", 4)]])
            .append_query_results([[member("user_a", "alice")]])
            .append_query_results([vec![
                member("user_x", "xavier"),
                member("user_y", "yara"),
                member("user_z", "zed"),
            ]]);

        let (report, statements) = advance_logged(db, Arc::new(SeededRandom::new(3))).await;

        assert_eq!(
            report.senate,
            RaceOutcome::Advanced {
                from: ElectionStatus::Voting,
                to: ElectionStatus::Concluded,
                days_left: 3,
                elected: 1,
                appointed: 2,
            }
        );

        // Only Senators are demoted, and the appointee pool holds no office
        assert!(statements.iter().any(|sql| sql
            .contains(r#"SET "role" = 'representative' WHERE "user"."role" = 'senator'"#)));
        assert!(!statements.iter().any(|sql| sql.contains(r#"WHERE "user"."role" = 'president'"#)));
        let pool_query = statements
            .iter()
            .find(|sql| sql.starts_with("SELECT") && sql.contains(r#""user"."is_banned" = FALSE"#))
            .unwrap();
        assert!(pool_query.contains(r#""user"."role" = 'representative'"#), "{pool_query}");

        let seated: Vec<&String> = statements
            .iter()
            .filter(|sql| sql.contains(r#"SET "role" = 'senator' WHERE "user"."id""#))
            .collect();
        assert_eq!(seated.len(), 3);
        assert!(seated[0].contains("'user_a'"));
        for sql in &seated[1..] {
            assert!(
                ["'user_x'", "'user_y'", "'user_z'"]
                    .iter()
                    .any(|id| sql.contains(id)),
                "{sql}"
            );
        }
    }

    #[tokio::test]
    async fn test_failed_race_does_not_block_the_other() {
        // president: guard ok, election query fails; senate: countdown
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(1), exec(1), exec(1)])
            .append_query_results([Vec::<election::Model>::new()])
            .append_query_results([[election_row(
                ElectionKind::Senate,
                ElectionStatus::Candidate,
                2,
            )]]);

        let report = advancer(db, Arc::new(SeededRandom::new(1))).advance().await;

        assert!(report.president.is_failure());
        assert_eq!(
            report.senate,
            RaceOutcome::CountedDown {
                status: ElectionStatus::Candidate,
                days_left: 1
            }
        );
        assert!(!report.is_success());
    }
}
