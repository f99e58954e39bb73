//! Database migrations.
//!
//! Schema migrations for the advancement store. Seed rows for the two
//! elections, the bill pool tracker and the tick guards ship with the
//! tables that hold them.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_user_table;
mod m20250101_000002_create_election_tables;
mod m20250101_000003_create_bill_tables;
mod m20250101_000004_create_market_tables;
mod m20250101_000005_create_feed_table;
mod m20250101_000006_create_tick_guard_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_user_table::Migration),
            Box::new(m20250101_000002_create_election_tables::Migration),
            Box::new(m20250101_000003_create_bill_tables::Migration),
            Box::new(m20250101_000004_create_market_tables::Migration),
            Box::new(m20250101_000005_create_feed_table::Migration),
            Box::new(m20250101_000006_create_tick_guard_table::Migration),
        ]
    }
}
