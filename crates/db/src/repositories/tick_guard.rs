//! Tick guard repository.

use crate::entities::{TickGuard, tick_guard};
use chrono::{DateTime, Duration, Utc};
use polity_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, sea_query::Expr};

/// Repository for per-job tick claims.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickGuardRepository;

impl TickGuardRepository {
    /// Create a new tick guard repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Claim the `job` slot at `now` if the last claim is at least
    /// `min_interval` old.
    ///
    /// A single conditional update: when it touches no row, another tick
    /// already ran inside the interval and the caller must skip. Inside a
    /// transaction the row stays locked until commit.
    pub async fn try_claim<C>(
        &self,
        conn: &C,
        job: &str,
        now: DateTime<Utc>,
        min_interval: Duration,
    ) -> AppResult<bool>
    where
        C: ConnectionTrait,
    {
        let cutoff = now
            .checked_sub_signed(min_interval)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let result = TickGuard::update_many()
            .col_expr(tick_guard::Column::LastTickAt, Expr::value(now))
            .filter(tick_guard::Column::Job.eq(job))
            .filter(tick_guard::Column::LastTickAt.lte(cutoff))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}
