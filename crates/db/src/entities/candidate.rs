//! Candidate entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::election::ElectionKind;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "candidate")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// A user may run in only one race at a time
    #[sea_orm(unique)]
    pub user_id: String,

    #[sea_orm(indexed)]
    pub election_kind: ElectionKind,

    pub votes: i64,

    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub donations: Decimal,

    /// Campaign accrual per hour while voting is open
    pub votes_per_hour: i64,

    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub donations_per_hour: Decimal,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
