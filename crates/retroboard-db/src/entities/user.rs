//! User entity for accounts that can belong to several teams

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// User UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Login name (unique)
    #[sea_orm(unique)]
    pub name: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// When the account was created
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// User is a member of teams
    #[sea_orm(has_many = "super::user_team::Entity")]
    TeamMemberships,
}

impl Related<super::user_team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TeamMemberships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
