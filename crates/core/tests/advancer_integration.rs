//! Advancer integration tests.
//!
//! Each test drives one advancer against its own `PostgreSQL` database,
//! reset to the seeded state, and checks the rows the tick left behind.
//! Run with: `cargo test -p polity-core --test advancer_integration -- --ignored`
//!
//! Connection settings come from the `TEST_DB_*` variables read by
//! `polity_db::test_utils::TestDbConfig`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use polity_core::{BillAdvancer, EconomyAdvancer, ElectionAdvancer, RaceOutcome, SeededRandom};
use polity_db::{
    entities::{
        Bill, BillVoteHouse, Company, Feed, SharePriceHistory, Stock, User, UserShare, bill,
        bill::{BillStage, BillStatus},
        bill_vote_house, company,
        election::{ElectionKind, ElectionStatus},
        stock, user,
        user::UserRole,
        user_share,
    },
    repositories::{ElectionRepository, GameTrackerRepository, PartyRepository, UserRepository},
    test_utils::TestDatabase,
};
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection, EntityTrait, PaginatorTrait, Set};

/// A fresh database in seed state plus a pooled connection to hand to an
/// advancer.
async fn seeded() -> (TestDatabase, Arc<DatabaseConnection>) {
    let db = TestDatabase::isolated().await.expect("Failed to create database");
    db.reset_to_seed().await.unwrap();
    let pool = Database::connect(&db.config.database_url()).await.unwrap();
    (db, Arc::new(pool))
}

async fn add_user(
    conn: &DatabaseConnection,
    id: &str,
    role: UserRole,
    is_banned: bool,
    is_active: bool,
) {
    User::insert(user::ActiveModel {
        id: Set(id.to_string()),
        username: Set(format!("{id}_name")),
        token: Set(None),
        role: Set(role),
        party_id: Set(None),
        balance: Set(Decimal::ZERO),
        is_admin: Set(false),
        is_banned: Set(is_banned),
        is_active: Set(is_active),
        created_at: Set(Utc::now().into()),
    })
    .exec_without_returning(conn)
    .await
    .unwrap();
}

async fn role_of(conn: &DatabaseConnection, id: &str) -> UserRole {
    User::find_by_id(id).one(conn).await.unwrap().unwrap().role
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_senate_appointments_leave_other_offices_alone() {
    let (db, pool) = seeded().await;
    let conn = db.connection();

    add_user(conn, "u_pres", UserRole::President, false, true).await;
    add_user(conn, "u_rep1", UserRole::Representative, false, true).await;
    add_user(conn, "u_rep2", UserRole::Representative, false, true).await;
    add_user(conn, "u_banned", UserRole::Representative, true, true).await;
    add_user(conn, "u_idle", UserRole::Representative, false, false).await;

    let elections = ElectionRepository::new();
    // President mid-campaign; Senate closes its vote with nobody running
    elections
        .save_phase(conn, 1, ElectionStatus::Candidate, 3, None)
        .await
        .unwrap();
    elections
        .save_phase(conn, 2, ElectionStatus::Voting, 1, Some(3))
        .await
        .unwrap();

    let advancer = ElectionAdvancer::new(
        Arc::clone(&pool),
        UserRepository::new(Arc::clone(&pool)),
        Arc::new(SeededRandom::new(17)),
        Duration::zero(),
    );
    let report = advancer.advance().await;

    assert_eq!(
        report.president,
        RaceOutcome::CountedDown {
            status: ElectionStatus::Candidate,
            days_left: 2
        }
    );
    assert_eq!(
        report.senate,
        RaceOutcome::Advanced {
            from: ElectionStatus::Voting,
            to: ElectionStatus::Concluded,
            days_left: 3,
            elected: 0,
            appointed: 2,
        }
    );

    assert_eq!(role_of(conn, "u_pres").await, UserRole::President);
    assert_eq!(role_of(conn, "u_rep1").await, UserRole::Senator);
    assert_eq!(role_of(conn, "u_rep2").await, UserRole::Senator);
    assert_eq!(role_of(conn, "u_banned").await, UserRole::Representative);
    assert_eq!(role_of(conn, "u_idle").await, UserRole::Representative);

    let senate = elections
        .get_by_kind(conn, ElectionKind::Senate)
        .await
        .unwrap();
    assert_eq!(senate.status, ElectionStatus::Concluded);
    assert_eq!(senate.days_left, 3);

    let appointed = Feed::find()
        .all(conn)
        .await
        .unwrap()
        .into_iter()
        .filter(|entry| entry.content.contains("appointed to the Senate"))
        .count();
    assert_eq!(appointed, 2);

    drop(advancer);
    drop(pool);
    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_bill_tick_promotes_draws_and_rotates() {
    let (db, pool) = seeded().await;
    let conn = db.connection();

    add_user(conn, "author", UserRole::Representative, false, true).await;
    let now = Utc::now();
    for (id, status, pool_slot, age) in [
        ("h1", BillStatus::Voting, Some(1), 2),
        ("q1", BillStatus::Queued, None, 1),
    ] {
        Bill::insert(bill::ActiveModel {
            id: Set(id.to_string()),
            title: Set(format!("Act {id}")),
            content: Set("Be it enacted".to_string()),
            creator_id: Set("author".to_string()),
            stage: Set(BillStage::House),
            status: Set(status),
            pool: Set(pool_slot),
            created_at: Set((now - Duration::hours(age)).into()),
        })
        .exec_without_returning(conn)
        .await
        .unwrap();
    }
    for (id, vote_yes) in [("v1", true), ("v2", true), ("v3", false)] {
        BillVoteHouse::insert(bill_vote_house::ActiveModel {
            id: Set(id.to_string()),
            bill_id: Set("h1".to_string()),
            voter_id: Set(format!("voter_{id}")),
            vote_yes: Set(vote_yes),
            created_at: Set(now.into()),
        })
        .exec_without_returning(conn)
        .await
        .unwrap();
    }

    let advancer = BillAdvancer::new(
        Arc::clone(&pool),
        PartyRepository::new(Arc::clone(&pool)),
        Duration::minutes(30),
    );
    let report = advancer.advance().await.unwrap();

    assert_eq!(report.closed_pool, Some(1));
    assert_eq!(report.next_pool, Some(2));
    assert_eq!(report.promoted, 1);
    assert_eq!(report.drawn.as_deref(), Some("q1"));

    let promoted = Bill::find_by_id("h1").one(conn).await.unwrap().unwrap();
    assert_eq!(promoted.stage, BillStage::Senate);
    assert_eq!(promoted.status, BillStatus::Voting);
    assert_eq!(promoted.pool, Some(1));

    let drawn = Bill::find_by_id("q1").one(conn).await.unwrap().unwrap();
    assert_eq!(drawn.stage, BillStage::House);
    assert_eq!(drawn.status, BillStatus::Voting);
    assert_eq!(drawn.pool, Some(1));

    assert_eq!(GameTrackerRepository::new().current_pool(conn).await.unwrap(), 2);

    // A second call inside the interval changes nothing
    let again = advancer.advance().await.unwrap();
    assert!(again.skipped);
    assert_eq!(GameTrackerRepository::new().current_pool(conn).await.unwrap(), 2);

    drop(advancer);
    drop(pool);
    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_economy_tick_dissolves_reprices_and_pays() {
    let (db, pool) = seeded().await;
    let conn = db.connection();

    add_user(conn, "founder", UserRole::Representative, false, true).await;
    add_user(conn, "holder", UserRole::Representative, false, true).await;

    for (id, symbol) in [("co_live", "LIVE"), ("co_dead", "DEAD")] {
        Company::insert(company::ActiveModel {
            id: Set(id.to_string()),
            name: Set(format!("{symbol} Corp")),
            symbol: Set(symbol.to_string()),
            capital: Set(Decimal::new(100_000, 2)),
            issued_shares: Set(10),
            creator_id: Set("founder".to_string()),
            created_at: Set(Utc::now().into()),
        })
        .exec_without_returning(conn)
        .await
        .unwrap();
        Stock::insert(stock::ActiveModel {
            id: Set(format!("stock_{id}")),
            company_id: Set(id.to_string()),
            price: Set(100),
            bought_today: Set(0),
            sold_today: Set(0),
        })
        .exec_without_returning(conn)
        .await
        .unwrap();
    }
    UserShare::insert(user_share::ActiveModel {
        id: Set("share1".to_string()),
        user_id: Set("holder".to_string()),
        company_id: Set("co_live".to_string()),
        quantity: Set(10),
    })
    .exec_without_returning(conn)
    .await
    .unwrap();

    let advancer = EconomyAdvancer::new(
        Arc::clone(&pool),
        UserRepository::new(Arc::clone(&pool)),
        Duration::minutes(30),
    );
    let report = advancer.advance().await.unwrap();

    assert_eq!(report.companies_dissolved, 1);
    assert_eq!(report.stocks_repriced, 1);
    assert_eq!(report.dividends_total, Decimal::new(9900, 2));

    assert!(Company::find_by_id("co_dead").one(conn).await.unwrap().is_none());
    assert!(Stock::find_by_id("stock_co_dead").one(conn).await.unwrap().is_none());

    let live = Company::find_by_id("co_live").one(conn).await.unwrap().unwrap();
    assert_eq!(live.issued_shares, 11);
    assert_eq!(live.creator_id, "holder");

    let stock = Stock::find_by_id("stock_co_live").one(conn).await.unwrap().unwrap();
    assert_eq!(stock.price, 99);
    assert_eq!(SharePriceHistory::find().count(conn).await.unwrap(), 1);

    let holder = User::find_by_id("holder").one(conn).await.unwrap().unwrap();
    assert_eq!(holder.balance, Decimal::new(9900, 2));

    drop(advancer);
    drop(pool);
    db.drop_database().await.unwrap();
}
