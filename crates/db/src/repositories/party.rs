//! Party repository.

use std::sync::Arc;

use crate::entities::{Party, PartyStance, User, party, party_stance, user};
use polity_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, sea_query::Query,
};

/// Party repository for database operations.
#[derive(Clone)]
pub struct PartyRepository {
    db: Arc<DatabaseConnection>,
}

impl PartyRepository {
    /// Create a new party repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Parties no user belongs to.
    pub async fn find_empty(&self) -> AppResult<Vec<party::Model>> {
        Party::find()
            .filter(
                party::Column::Id.not_in_subquery(
                    Query::select()
                        .column(user::Column::PartyId)
                        .from(User)
                        .and_where(user::Column::PartyId.is_not_null())
                        .to_owned(),
                ),
            )
            .order_by_asc(party::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete parties together with their stances.
    ///
    /// Returns the number of parties removed.
    pub async fn delete_with_stances(&self, party_ids: &[String]) -> AppResult<u64> {
        if party_ids.is_empty() {
            return Ok(0);
        }

        PartyStance::delete_many()
            .filter(party_stance::Column::PartyId.is_in(party_ids.iter().cloned()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let result = Party::delete_many()
            .filter(party::Column::Id.is_in(party_ids.iter().cloned()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
