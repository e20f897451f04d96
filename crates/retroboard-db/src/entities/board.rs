//! Board entity: an archived snapshot of a team's thoughts

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "boards")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub team_id: String,

    /// When the board was archived
    pub date_created: ChronoDateTimeUtc,
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

    /// Thoughts captured into this board
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
