//! Feed repository.

use crate::entities::{Feed, feed};
use polity_common::{AppError, AppResult};
use sea_orm::{ConnectionTrait, EntityTrait};

/// Feed repository for database operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedRepository;

impl FeedRepository {
    /// Create a new feed repository.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Append an entry.
    pub async fn create<C>(&self, conn: &C, entry: feed::ActiveModel) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        Feed::insert(entry)
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    #[tokio::test]
    async fn test_create() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let entry = feed::ActiveModel {
            id: Set("feed1".to_string()),
            user_id: Set(Some("user1".to_string())),
            content: Set("alice was elected president".to_string()),
            created_at: Set(Utc::now().into()),
        };

        let repo = FeedRepository::new();
        repo.create(&db, entry).await.unwrap();

        assert_eq!(db.into_transaction_log().len(), 1);
    }
}
