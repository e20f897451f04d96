//! Thought entity: a single retro item posted into a team's column

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "thoughts")]
pub struct Model {
    /// Monotonically increasing id
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    pub hearts: i32,

    /// Column key, matched against `column_definitions.topic`
    pub topic: String,

    pub discussed: bool,

    pub team_id: String,

    /// The owning team's column with the same topic, if it has one
    pub column_definition_id: Option<i32>,

    /// Archived board this thought was captured into
    pub board_id: Option<i32>,

    pub created_at: ChronoDateTimeUtc,
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

    #[sea_orm(
        belongs_to = "super::column_definition::Entity",
        from = "Column::ColumnDefinitionId",
        to = "super::column_definition::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    ColumnDefinition,

    #[sea_orm(
        belongs_to = "super::board::Entity",
        from = "Column::BoardId",
        to = "super::board::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Board,
}

impl Related<super::team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl Related<super::column_definition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ColumnDefinition.def()
    }
}

impl Related<super::board::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Board.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
