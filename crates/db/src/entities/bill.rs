//! Bill entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Chamber a bill is currently before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum BillStage {
    #[sea_orm(string_value = "house")]
    House,
    #[sea_orm(string_value = "senate")]
    Senate,
    #[sea_orm(string_value = "presidential")]
    Presidential,
}

/// Lifecycle status. `Passed` and `Defeated` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum BillStatus {
    #[sea_orm(string_value = "queued")]
    Queued,
    #[sea_orm(string_value = "voting")]
    Voting,
    #[sea_orm(string_value = "passed")]
    Passed,
    #[sea_orm(string_value = "defeated")]
    Defeated,
}

impl BillStatus {
    /// Whether the bill has left the pipeline for good.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Defeated)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bill")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    #[sea_orm(indexed)]
    pub creator_id: String,

    pub stage: BillStage,

    pub status: BillStatus,

    /// Voting pool (1..=3); unset while queued
    #[sea_orm(nullable)]
    pub pool: Option<i32>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Creator,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
