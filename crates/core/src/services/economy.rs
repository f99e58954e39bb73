//! Economy advancer.
//!
//! One tick is one simulated hour: dissolve companies nobody holds,
//! reprice every stock from the hour's trading, pay dividends, mint one
//! share per company, hand the CEO seat to the largest holder and grow the
//! campaigns of elections that are open for voting.

use std::{collections::HashSet, sync::Arc};

use chrono::{Duration, Utc};
use polity_common::{AppError, AppResult, IdGenerator};
use polity_db::{
    entities::{
        candidate_snapshot, company,
        election::{ElectionKind, ElectionStatus},
        share_price_history, transaction_history, user_share,
    },
    repositories::{
        CandidateRepository, CompanyRepository, ElectionRepository, LedgerRepository,
        ShareRepository, StockRepository, TickGuardRepository, UserRepository,
    },
};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseConnection, Set, TransactionTrait};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::feed::FeedService;

/// Guard key for the economy tick.
const JOB: &str = "economy";

/// Floor price of any stock.
pub const MIN_PRICE: i64 = 10;

/// Price after one hour of trading.
///
/// Net demand moves the price one unit per share. An hour with no trades
/// decays it by 1%, rounded up. The result never drops below
/// [`MIN_PRICE`].
#[must_use]
pub const fn reprice(price: i64, bought: i64, sold: i64) -> i64 {
    let change = if bought == 0 && sold == 0 {
        // ceil(price * 0.01)
        -(price.saturating_add(99) / 100)
    } else {
        bought.saturating_sub(sold)
    };

    let next = price.saturating_add(change);
    if next < MIN_PRICE { MIN_PRICE } else { next }
}

/// Hourly dividend for a holding of `quantity` shares at `price`.
///
/// Ten percent of market cap is paid out pro rata, which reduces to
/// `quantity * price / 10`.
#[must_use]
pub fn dividend(quantity: i64, price: i64) -> Decimal {
    (Decimal::from(quantity) * Decimal::from(price) / Decimal::TEN).round_dp(2)
}

/// The holder entitled to the CEO seat: largest quantity, lowest user id
/// on a tie.
#[must_use]
pub fn pick_ceo(holders: &[user_share::Model]) -> Option<&user_share::Model> {
    holders.iter().max_by(|a, b| {
        a.quantity
            .cmp(&b.quantity)
            .then_with(|| b.user_id.cmp(&a.user_id))
    })
}

/// Outcome of one economy tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomyTickReport {
    pub skipped: bool,
    pub companies_dissolved: usize,
    pub stocks_repriced: usize,
    pub dividends_paid: usize,
    pub dividends_total: Decimal,
    pub shares_minted: usize,
    pub ceo_changes: usize,
    pub candidates_accrued: u64,
}

impl EconomyTickReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    /// One-line description for the trigger response.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.skipped {
            return "Economy already advanced within the minimum interval".to_string();
        }

        format!(
            "Repriced {} stocks, dissolved {} companies, paid {} dividends totalling {}, \
             minted {} shares, {} CEO changes, accrued {} candidates",
            self.stocks_repriced,
            self.companies_dissolved,
            self.dividends_paid,
            self.dividends_total,
            self.shares_minted,
            self.ceo_changes,
            self.candidates_accrued
        )
    }
}

/// Advances the market and campaigns by one hour.
#[derive(Clone)]
pub struct EconomyAdvancer {
    db: Arc<DatabaseConnection>,
    company_repo: CompanyRepository,
    stock_repo: StockRepository,
    share_repo: ShareRepository,
    ledger_repo: LedgerRepository,
    user_repo: UserRepository,
    election_repo: ElectionRepository,
    candidate_repo: CandidateRepository,
    guard_repo: TickGuardRepository,
    feed: FeedService,
    id_gen: IdGenerator,
    min_interval: Duration,
}

impl EconomyAdvancer {
    /// Create a new economy advancer.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        user_repo: UserRepository,
        min_interval: Duration,
    ) -> Self {
        Self {
            db,
            company_repo: CompanyRepository::new(),
            stock_repo: StockRepository::new(),
            share_repo: ShareRepository::new(),
            ledger_repo: LedgerRepository::new(),
            user_repo,
            election_repo: ElectionRepository::new(),
            candidate_repo: CandidateRepository::new(),
            guard_repo: TickGuardRepository::new(),
            feed: FeedService::new(),
            id_gen: IdGenerator::new(),
            min_interval,
        }
    }

    /// Run one economy tick inside a single transaction.
    pub async fn advance(&self) -> AppResult<EconomyTickReport> {
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
            info!("Economy already advanced within interval; skipping");
            return Ok(EconomyTickReport::skipped());
        }

        let mut report = EconomyTickReport::default();

        let dissolved = self
            .dissolve_abandoned(&txn, &mut report)
            .await
            .map_err(|e| AppError::stage("dissolution", e))?;

        for company in self.company_repo.find_all(&txn).await? {
            if dissolved.contains(&company.id) {
                continue;
            }
            self.advance_company(&txn, &company, &mut report)
                .await
                .map_err(|e| AppError::stage(format!("company {}", company.symbol), e))?;
        }

        for kind in [ElectionKind::President, ElectionKind::Senate] {
            report.candidates_accrued += self
                .accrue_campaigns(&txn, kind)
                .await
                .map_err(|e| AppError::stage(format!("campaign {kind}"), e))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(summary = %report.summary(), "Economy tick finished");
        Ok(report)
    }

    /// Dissolve every company without shareholders, returning their ids.
    async fn dissolve_abandoned<C>(
        &self,
        conn: &C,
        report: &mut EconomyTickReport,
    ) -> AppResult<HashSet<String>>
    where
        C: ConnectionTrait,
    {
        let mut dissolved = HashSet::new();
        for company in self.company_repo.find_without_holders(conn).await? {
            self.company_repo.dissolve(conn, &company.id).await?;
            self.feed
                .post(
                    conn,
                    None,
                    format!(
                        "{} ({}) has been dissolved after losing its last shareholder",
                        company.name, company.symbol
                    ),
                )
                .await?;
            info!(company_id = %company.id, symbol = %company.symbol, "Company dissolved");
            report.companies_dissolved += 1;
            dissolved.insert(company.id);
        }
        Ok(dissolved)
    }

    async fn advance_company<C>(
        &self,
        conn: &C,
        company: &company::Model,
        report: &mut EconomyTickReport,
    ) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let holders = self.share_repo.find_holders(conn, &company.id).await?;

        match self.stock_repo.find_by_company(conn, &company.id).await? {
            Some(stock) => {
                let price = reprice(stock.price, stock.bought_today, stock.sold_today);
                self.stock_repo.reprice(conn, &stock.id, price).await?;
                self.stock_repo
                    .record_price(
                        conn,
                        share_price_history::ActiveModel {
                            id: Set(self.id_gen.generate()),
                            stock_id: Set(stock.id.clone()),
                            price: Set(price),
                            created_at: Set(Utc::now().into()),
                        },
                    )
                    .await?;
                debug!(
                    symbol = %company.symbol,
                    from = stock.price,
                    to = price,
                    bought = stock.bought_today,
                    sold = stock.sold_today,
                    "Repriced stock"
                );
                report.stocks_repriced += 1;

                if company.issued_shares > 0 {
                    self.pay_dividends(conn, company, &holders, price, report)
                        .await?;
                }
            }
            None => {
                warn!(company_id = %company.id, "Company has no stock row; skipping price and dividends");
            }
        }

        self.company_repo.mint_share(conn, &company.id).await?;
        report.shares_minted += 1;

        if let Some(ceo) = pick_ceo(&holders)
            && ceo.user_id != company.creator_id
        {
            self.company_repo
                .set_ceo(conn, &company.id, &ceo.user_id)
                .await?;
            info!(
                symbol = %company.symbol,
                from = %company.creator_id,
                to = %ceo.user_id,
                "CEO changed"
            );
            report.ceo_changes += 1;
        }

        Ok(())
    }

    async fn pay_dividends<C>(
        &self,
        conn: &C,
        company: &company::Model,
        holders: &[user_share::Model],
        price: i64,
        report: &mut EconomyTickReport,
    ) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        for holding in holders {
            let amount = dividend(holding.quantity, price);
            if amount <= Decimal::ZERO {
                continue;
            }

            self.user_repo
                .credit_balance(conn, &holding.user_id, amount)
                .await?;
            self.ledger_repo
                .record(
                    conn,
                    transaction_history::ActiveModel {
                        id: Set(self.id_gen.generate()),
                        user_id: Set(holding.user_id.clone()),
                        amount: Set(amount),
                        description: Set(format!(
                            "Dividend from {} ({}): {} shares at {}",
                            company.name, company.symbol, holding.quantity, price
                        )),
                        created_at: Set(Utc::now().into()),
                    },
                )
                .await?;

            report.dividends_paid += 1;
            report.dividends_total += amount;
        }
        Ok(())
    }

    /// Accrue one hour of campaigning when `kind` is open for voting.
    async fn accrue_campaigns<C>(&self, conn: &C, kind: ElectionKind) -> AppResult<u64>
    where
        C: ConnectionTrait,
    {
        let election = self.election_repo.get_by_kind(conn, kind).await?;
        if election.status != ElectionStatus::Voting {
            return Ok(0);
        }

        let accrued = self.candidate_repo.accrue(conn, kind).await?;

        let now = Utc::now();
        let snapshots: Vec<candidate_snapshot::ActiveModel> = self
            .candidate_repo
            .find_by_kind(conn, kind)
            .await?
            .into_iter()
            .map(|candidate| candidate_snapshot::ActiveModel {
                id: Set(self.id_gen.generate()),
                candidate_id: Set(candidate.id),
                election_kind: Set(kind),
                votes: Set(candidate.votes),
                donations: Set(candidate.donations),
                created_at: Set(now.into()),
            })
            .collect();
        self.candidate_repo.insert_snapshots(conn, snapshots).await?;

        debug!(election = %kind, candidates = accrued, "Accrued campaigns");
        Ok(accrued)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use polity_db::entities::{candidate, election, stock};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn exec(rows: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: rows,
        }
    }

    fn holding(user_id: &str, quantity: i64) -> user_share::Model {
        user_share::Model {
            id: format!("share_{user_id}"),
            user_id: user_id.to_string(),
            company_id: "co1".to_string(),
            quantity,
        }
    }

    fn test_company(creator_id: &str, issued_shares: i64) -> company::Model {
        named_company("co1", "Acme", "ACME", creator_id, issued_shares)
    }

    fn named_company(
        id: &str,
        name: &str,
        symbol: &str,
        creator_id: &str,
        issued_shares: i64,
    ) -> company::Model {
        company::Model {
            id: id.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            capital: Decimal::new(100_000, 2),
            issued_shares,
            creator_id: creator_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn test_stock(price: i64, bought: i64, sold: i64) -> stock::Model {
        stock::Model {
            id: "stock1".to_string(),
            company_id: "co1".to_string(),
            price,
            bought_today: bought,
            sold_today: sold,
        }
    }

    fn election_row(kind: ElectionKind, status: ElectionStatus) -> election::Model {
        election::Model {
            id: match kind {
                ElectionKind::President => 1,
                ElectionKind::Senate => 2,
            },
            kind,
            status,
            days_left: 2,
            seats: 3,
        }
    }

    fn advancer(db: MockDatabase) -> EconomyAdvancer {
        let db = Arc::new(db.into_connection());
        EconomyAdvancer::new(
            Arc::clone(&db),
            UserRepository::new(db),
            Duration::minutes(30),
        )
    }

    #[test]
    fn test_idle_stock_decays_one_percent_rounded_up() {
        assert_eq!(reprice(100, 0, 0), 99);
        assert_eq!(reprice(150, 0, 0), 148);
        assert_eq!(reprice(1000, 0, 0), 990);
    }

    #[test]
    fn test_price_never_below_floor() {
        assert_eq!(reprice(10, 0, 0), MIN_PRICE);
        assert_eq!(reprice(11, 0, 0), MIN_PRICE);
        assert_eq!(reprice(40, 0, 500), MIN_PRICE);
    }

    #[test]
    fn test_net_demand_moves_price() {
        assert_eq!(reprice(100, 7, 2), 105);
        assert_eq!(reprice(100, 2, 7), 95);
        assert_eq!(reprice(100, 3, 3), 100);
    }

    #[test]
    fn test_sole_owner_receives_tenth_of_market_cap() {
        let issued = 1_000;
        let price = 57;
        let market_cap = Decimal::from(issued * price);

        assert_eq!(
            dividend(issued, price),
            market_cap * Decimal::new(10, 2)
        );
    }

    #[test]
    fn test_dividend_rounds_to_cents() {
        assert_eq!(dividend(3, 11), Decimal::new(330, 2));
        assert_eq!(dividend(0, 500), Decimal::ZERO);
    }

    #[test]
    fn test_ceo_tie_goes_to_lowest_user_id() {
        let holders = vec![holding("user_c", 40), holding("user_b", 50), holding("user_a", 50)];
        assert_eq!(pick_ceo(&holders).unwrap().user_id, "user_a");
        assert!(pick_ceo(&[]).is_none());
    }

    #[test]
    fn test_summary() {
        let report = EconomyTickReport {
            stocks_repriced: 2,
            dividends_paid: 3,
            dividends_total: Decimal::new(12_345, 2),
            shares_minted: 2,
            ..EconomyTickReport::default()
        };
        let summary = report.summary();
        assert!(summary.starts_with("Repriced 2 stocks"));
        assert!(summary.contains("totalling 123.45"));

        assert!(EconomyTickReport::skipped().summary().contains("already advanced"));
    }

    #[tokio::test]
    async fn test_skipped_inside_interval() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([exec(0)]);

        let report = advancer(db).advance().await.unwrap();

        assert!(report.skipped);
        assert_eq!(report.stocks_repriced, 0);
    }

    #[tokio::test]
    async fn test_company_tick() {
        // guard, reprice, history, credit, ledger, mint, ceo
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                exec(1),
                exec(1),
                exec(1),
                exec(1),
                exec(1),
                exec(1),
                exec(1),
            ])
            .append_query_results([Vec::<company::Model>::new(), vec![test_company("user_b", 100)]])
            .append_query_results([vec![holding("user_a", 10)]])
            .append_query_results([[test_stock(100, 0, 0)]])
            .append_query_results([
                [election_row(ElectionKind::President, ElectionStatus::Candidate)],
                [election_row(ElectionKind::Senate, ElectionStatus::Concluded)],
            ]);

        let report = advancer(db).advance().await.unwrap();

        assert_eq!(report.companies_dissolved, 0);
        assert_eq!(report.stocks_repriced, 1);
        assert_eq!(report.dividends_paid, 1);
        assert_eq!(report.dividends_total, Decimal::new(9900, 2));
        assert_eq!(report.shares_minted, 1);
        assert_eq!(report.ceo_changes, 1);
        assert_eq!(report.candidates_accrued, 0);
    }

    #[tokio::test]
    async fn test_dissolved_company_gets_no_price_or_dividend() {
        // guard, dissolve (4), feed; then the surviving company:
        // reprice, history, credit, ledger, mint, ceo
        let dead = named_company("co_dead", "Bust", "BUST", "user_z", 10);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                exec(1),
                exec(3),
                exec(1),
                exec(0),
                exec(1),
                exec(1),
                exec(1),
                exec(1),
                exec(1),
                exec(1),
                exec(1),
                exec(1),
            ])
            .append_query_results([
                vec![dead.clone()],
                vec![dead, test_company("user_b", 100)],
            ])
            .append_query_results([vec![holding("user_a", 10)]])
            .append_query_results([[test_stock(100, 0, 0)]])
            .append_query_results([
                [election_row(ElectionKind::President, ElectionStatus::Candidate)],
                [election_row(ElectionKind::Senate, ElectionStatus::Candidate)],
            ]);

        let db = Arc::new(db.into_connection());
        let advancer = EconomyAdvancer::new(
            Arc::clone(&db),
            UserRepository::new(Arc::clone(&db)),
            Duration::minutes(30),
        );
        let report = advancer.advance().await.unwrap();
        drop(advancer);

        assert_eq!(report.companies_dissolved, 1);
        assert_eq!(report.stocks_repriced, 1);
        assert_eq!(report.dividends_paid, 1);
        assert_eq!(report.shares_minted, 1);

        let statements: Vec<String> = Arc::try_unwrap(db)
            .unwrap()
            .into_transaction_log()
            .iter()
            .flat_map(|txn| txn.statements().iter().map(ToString::to_string))
            .collect();

        assert!(
            statements
                .iter()
                .any(|sql| sql.starts_with(r#"DELETE FROM "company""#) && sql.contains("'co_dead'"))
        );
        // After dissolution nothing is written for the dead company
        let dissolved_at = statements
            .iter()
            .position(|sql| sql.starts_with(r#"DELETE FROM "company""#))
            .unwrap();
        for sql in &statements[dissolved_at + 1..] {
            assert!(!sql.contains("'co_dead'"), "{sql}");
        }
        assert!(
            statements
                .iter()
                .any(|sql| sql.starts_with(r#"UPDATE "company""#) && sql.contains("'co1'"))
        );
    }

    #[tokio::test]
    async fn test_campaign_accrual_writes_snapshots() {
        // guard, accrue, snapshots
        let candidate = candidate::Model {
            id: "cand1".to_string(),
            user_id: "user_a".to_string(),
            election_kind: ElectionKind::Senate,
            votes: 12,
            donations: Decimal::new(500, 2),
            votes_per_hour: 0,
            donations_per_hour: Decimal::ZERO,
            created_at: Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(1), exec(1), exec(1)])
            .append_query_results([Vec::<company::Model>::new(), Vec::new()])
            .append_query_results([
                [election_row(ElectionKind::President, ElectionStatus::Concluded)],
                [election_row(ElectionKind::Senate, ElectionStatus::Voting)],
            ])
            .append_query_results([[candidate]]);

        let report = advancer(db).advance().await.unwrap();

        assert_eq!(report.candidates_accrued, 1);
    }

    #[tokio::test]
    async fn test_failure_rolls_back_tick() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([exec(1)]);

        let result = advancer(db).advance().await;

        assert!(matches!(result, Err(AppError::StageProcessing { .. })));
    }
}
