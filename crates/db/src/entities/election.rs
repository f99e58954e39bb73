//! Election entity. One row per election kind, never deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which race an election row drives.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ElectionKind {
    #[sea_orm(string_value = "president")]
    President,
    #[sea_orm(string_value = "senate")]
    Senate,
}

impl ElectionKind {
    /// Lowercase name used in logs and guard keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::President => "president",
            Self::Senate => "senate",
        }
    }
}

impl std::fmt::Display for ElectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Election phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ElectionStatus {
    #[sea_orm(string_value = "candidate")]
    Candidate,
    #[sea_orm(string_value = "voting")]
    Voting,
    #[sea_orm(string_value = "concluded")]
    Concluded,
}

impl ElectionStatus {
    /// Lowercase name, as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Candidate => "candidate",
            Self::Voting => "voting",
            Self::Concluded => "concluded",
        }
    }
}

impl std::fmt::Display for ElectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "election")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,

    #[sea_orm(unique)]
    pub kind: ElectionKind,

    pub status: ElectionStatus,

    /// Days remaining in the current phase
    pub days_left: i32,

    /// Seats up for election (always 1 for president)
    pub seats: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
