//! ColumnDefinition entity: the titled columns of a team's retro board

use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

/// Topics and titles every new team starts with
pub const DEFAULT_COLUMNS: [(&str, &str); 3] =
    [("happy", "Happy"), ("confused", "Confused"), ("sad", "Sad")];

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "column_definitions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owning team (unique together with `topic`)
    pub team_id: String,

    /// Stable column key shared across teams, e.g. "happy"
    pub topic: String,

    /// Title shown on the board
    pub title: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::team::Entity",
        from = "Column::TeamId",
        to = "super::team::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Team,

    #[sea_orm(has_many = "super::thought::Entity")]
    Thoughts,
}

impl Related<super::team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl Related<super::thought::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Thoughts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// The default column set for a freshly created team, ready to insert.
pub fn default_columns(team_id: &str) -> Vec<ActiveModel> {
    DEFAULT_COLUMNS
        .iter()
        .map(|&(topic, title)| ActiveModel {
            team_id: Set(String::from(team_id)),
            topic: Set(String::from(topic)),
            title: Set(String::from(title)),
            ..Default::default()
        })
        .collect()
}
