//! Last successful tick per advancement job.
//!
//! Each advancer claims its row with a conditional update inside its
//! transaction, so a duplicate trigger either waits on the row lock and
//! then finds the interval not yet elapsed, or runs after the first commit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tick_guard")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub job: String,

    pub last_tick_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
