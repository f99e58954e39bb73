//! User repository.

use std::sync::Arc;

use crate::entities::{Candidate, User, candidate, user, user::UserRole};
use polity_common::{AppError, AppResult};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    sea_query::{Expr, Query},
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by session token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Users with the given ids, in id order.
    pub async fn find_by_ids<C>(&self, conn: &C, ids: &[String]) -> AppResult<Vec<user::Model>>
    where
        C: ConnectionTrait,
    {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.iter().cloned()))
            .order_by_asc(user::Column::Id)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Demote every holder of `role` to representative.
    pub async fn strip_role<C>(&self, conn: &C, role: UserRole) -> AppResult<u64>
    where
        C: ConnectionTrait,
    {
        let result = User::update_many()
            .col_expr(user::Column::Role, Expr::value(UserRole::Representative))
            .filter(user::Column::Role.eq(role))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Give `role` to a single user.
    pub async fn grant_role<C>(&self, conn: &C, user_id: &str, role: UserRole) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let result = User::update_many()
            .col_expr(user::Column::Role, Expr::value(role))
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("User: {user_id}")));
        }
        Ok(())
    }

    /// Users who could be appointed to an unfilled seat.
    ///
    /// Active, not banned, holding no office, not running in any race and
    /// not in `exclude`. Sitting Senators must already be stripped.
    pub async fn find_appointable<C>(
        &self,
        conn: &C,
        exclude: &[String],
    ) -> AppResult<Vec<user::Model>>
    where
        C: ConnectionTrait,
    {
        User::find()
            .filter(user::Column::IsActive.eq(true))
            .filter(user::Column::IsBanned.eq(false))
            .filter(user::Column::Role.eq(UserRole::Representative))
            .filter(
                user::Column::Id.not_in_subquery(
                    Query::select()
                        .column(candidate::Column::UserId)
                        .from(Candidate)
                        .to_owned(),
                ),
            )
            .filter(user::Column::Id.is_not_in(exclude.iter().cloned()))
            .order_by_asc(user::Column::Id)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Add `amount` to a user's balance.
    pub async fn credit_balance<C>(&self, conn: &C, user_id: &str, amount: Decimal) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        User::update_many()
            .col_expr(
                user::Column::Balance,
                Expr::col(user::Column::Balance).add(amount),
            )
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
