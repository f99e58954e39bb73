//! Feed service.

use chrono::Utc;
use polity_common::{AppResult, IdGenerator};
use polity_db::{entities::feed, repositories::FeedRepository};
use sea_orm::{ConnectionTrait, Set};

/// Writes public feed entries on behalf of the advancers.
#[derive(Clone, Default)]
pub struct FeedService {
    feed_repo: FeedRepository,
    id_gen: IdGenerator,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            feed_repo: FeedRepository::new(),
            id_gen: IdGenerator::new(),
        }
    }

    /// Post an entry, optionally about a specific user.
    pub async fn post<C>(&self, conn: &C, user_id: Option<&str>, content: String) -> AppResult<()>
    where
        C: ConnectionTrait,
    {
        let entry = feed::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.map(str::to_string)),
            content: Set(content),
            created_at: Set(Utc::now().into()),
        };

        self.feed_repo.create(conn, entry).await
    }
}
