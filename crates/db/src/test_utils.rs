//! Test utilities for database operations.
//!
//! Provides helpers for setting up and tearing down test databases.

use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::migrations::Migrator;

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "polity_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "polity_test".to_string()),
            database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "polity_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    /// Get URL for connecting to postgres database (for creating test DB).
    #[must_use]
    pub fn postgres_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/postgres",
            self.username, self.password, self.host, self.port
        )
    }
}

/// A test database context that manages the lifecycle of a test database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: DatabaseConnection,
    /// Database configuration.
    pub config: TestDbConfig,
    /// Created by [`Self::isolated`]; dropped by [`Self::drop_database`].
    owned: bool,
}

impl TestDatabase {
    /// Connect to the shared test database named by `TEST_DB_*`.
    pub async fn new() -> Result<Self, DbErr> {
        let config = TestDbConfig::default();
        Self::with_config(config).await
    }

    /// Connect to an existing database and run migrations.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to test database");

        Ok(Self {
            conn,
            config,
            owned: false,
        })
    }

    /// Create and migrate a throwaway database.
    ///
    /// Advancer tests rewrite the singleton rows, so each one gets its own
    /// database. Remove it with [`Self::drop_database`].
    pub async fn isolated() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        config.database = format!("polity_test_{}", &suffix[..12]);

        let admin = Database::connect(&config.postgres_url()).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{}\"", config.database),
            ))
            .await?;
        admin.close().await?;

        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Created isolated test database");

        Ok(Self {
            conn,
            config,
            owned: true,
        })
    }

    /// Get the database connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Clean up all data in the test database (truncate all tables).
    ///
    /// This also removes the seed rows; follow with [`Self::reset_to_seed`]
    /// before driving an advancer.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        // Get all table names
        let tables = self
            .conn
            .query_all(Statement::from_string(
                DatabaseBackend::Postgres,
                "SELECT tablename FROM pg_tables WHERE schemaname = 'public'".to_string(),
            ))
            .await?;

        // Truncate each table
        for row in tables {
            if let Ok(table_name) = row.try_get::<String>("", "tablename") {
                // Skip migration table
                if table_name == "seaql_migrations" {
                    continue;
                }

                let truncate = format!("TRUNCATE TABLE \"{table_name}\" CASCADE");
                self.conn
                    .execute(Statement::from_string(DatabaseBackend::Postgres, truncate))
                    .await?;
            }
        }

        info!("Cleaned up test database");
        Ok(())
    }

    /// Close the connection. A database from [`Self::isolated`] is also
    /// dropped, along with any other sessions still attached to it.
    pub async fn drop_database(self) -> Result<(), DbErr> {
        self.conn.close().await?;
        if !self.owned {
            return Ok(());
        }

        let admin = Database::connect(&self.config.postgres_url()).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!(
                    "DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)",
                    self.config.database
                ),
            ))
            .await?;
        admin.close().await?;

        info!(database = %self.config.database, "Dropped test database");
        Ok(())
    }

    /// Truncate everything, then restore the rows the engine expects to
    /// exist: both elections in their first candidacy phase, pool 1 and
    /// tick guards at the epoch.
    pub async fn reset_to_seed(&self) -> Result<(), DbErr> {
        self.cleanup().await?;

        for sql in [
            "INSERT INTO election (id, kind, status, days_left, seats) VALUES \
             (1, 'president', 'candidate', 5, 1), (2, 'senate', 'candidate', 2, 3)",
            "INSERT INTO game_tracker (id, bill_pool) VALUES (1, 1)",
            "INSERT INTO tick_guard (job, last_tick_at) VALUES \
             ('election:president', 'epoch'), ('election:senate', 'epoch'), \
             ('bills', 'epoch'), ('economy', 'epoch')",
        ] {
            self.conn
                .execute(Statement::from_string(DatabaseBackend::Postgres, sql))
                .await?;
        }

        info!("Reset test database to seed state");
        Ok(())
    }
}
