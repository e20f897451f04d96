//! Team entity: the workspace every retro record hangs off

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "teams")]
pub struct Model {
    /// Team slug (primary key), derived from the name at signup
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Display name as typed at signup.
    ///
    /// Not unique: older rows may differ from each other only by
    /// surrounding whitespace or letter case.
    pub name: String,

    /// Hashed team password
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// When the team signed up (unset on the oldest rows)
    pub date_created: Option<ChronoDateTimeUtc>,

    /// Consecutive failed logins
    pub failed_login_attempts: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::column_definition::Entity")]
    ColumnDefinitions,

    #[sea_orm(has_many = "super::thought::Entity")]
    Thoughts,

    #[sea_orm(has_many = "super::board::Entity")]
    Boards,

    #[sea_orm(has_many = "super::action_item::Entity")]
    ActionItems,

    #[sea_orm(has_many = "super::user_team::Entity")]
    Members,

    #[sea_orm(has_many = "super::feedback::Entity")]
    Feedback,
}

impl Related<super::column_definition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ColumnDefinitions.def()
    }
}

impl Related<super::thought::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Thoughts.def()
    }
}

impl Related<super::board::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Boards.def()
    }
}

impl Related<super::action_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActionItems.def()
    }
}

impl Related<super::user_team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::feedback::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Feedback.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Derive a team slug from its display name.
///
/// Lowercases and swaps each space for a hyphen. Nothing is trimmed, so
/// `"name0 "` becomes `"name0-"`.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}
