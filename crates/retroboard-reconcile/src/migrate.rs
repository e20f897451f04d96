//! Entity migrators
//!
//! One function per dependent record kind, each taking the losing and the
//! surviving team. [`DependentKind::ALL`] is the order the orchestrator runs
//! them in: column definitions go first, so that thoughts are re-linked
//! against the survivor's columns only.
//!
//! Every migrator reads the loser's rows of its kind and then writes once per
//! row. Re-running a migrator after a partial failure is safe: rows that were
//! already moved no longer belong to the loser and are not read again.

use std::collections::HashMap;
use std::fmt;

use retroboard_db::entities::{
    action_item, board, column_definition, feedback, team, thought, user_team,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Serialize;
use tracing::debug;

use crate::error::{ReconcileError, Result};

/// Kinds of records that hang off a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependentKind {
    ColumnDefinitions,
    Thoughts,
    Boards,
    ActionItems,
    UserTeams,
    Feedback,
}

impl DependentKind {
    /// Every kind, in the order migrations must run.
    pub const ALL: [DependentKind; 6] = [
        DependentKind::ColumnDefinitions,
        DependentKind::Thoughts,
        DependentKind::Boards,
        DependentKind::ActionItems,
        DependentKind::UserTeams,
        DependentKind::Feedback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DependentKind::ColumnDefinitions => "column_definitions",
            DependentKind::Thoughts => "thoughts",
            DependentKind::Boards => "boards",
            DependentKind::ActionItems => "action_items",
            DependentKind::UserTeams => "user_teams",
            DependentKind::Feedback => "feedback",
        }
    }

    /// Move or remove every record of this kind owned by `loser`.
    pub async fn migrate<C>(
        &self,
        conn: &C,
        loser: &team::Model,
        survivor: &team::Model,
    ) -> Result<MigrationOutcome>
    where
        C: ConnectionTrait,
    {
        let result = match self {
            DependentKind::ColumnDefinitions => delete_column_definitions(conn, loser).await,
            DependentKind::Thoughts => move_thoughts(conn, loser, survivor).await,
            DependentKind::Boards => move_boards(conn, loser, survivor).await,
            DependentKind::ActionItems => move_action_items(conn, loser, survivor).await,
            DependentKind::UserTeams => merge_user_teams(conn, loser, survivor).await,
            DependentKind::Feedback => move_feedback(conn, loser, survivor).await,
        };

        let outcome = result.map_err(|source| ReconcileError::Migration {
            kind: *self,
            loser: loser.id.clone(),
            survivor: survivor.id.clone(),
            source,
        })?;

        debug!(
            kind = %self,
            loser = %loser.id,
            survivor = %survivor.id,
            moved = outcome.moved,
            removed = outcome.removed,
            "Migrated dependent records"
        );

        Ok(outcome)
    }
}

impl fmt::Display for DependentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows touched by one migrator run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationOutcome {
    /// Rows re-pointed at the survivor
    pub moved: u64,
    /// Rows deleted instead of moved
    pub removed: u64,
}

impl MigrationOutcome {
    pub fn merge(&mut self, other: MigrationOutcome) {
        self.moved += other.moved;
        self.removed += other.removed;
    }
}

/// The survivor keeps its own columns; the loser's are dropped.
pub async fn delete_column_definitions<C>(
    conn: &C,
    loser: &team::Model,
) -> Result<MigrationOutcome, DbErr>
where
    C: ConnectionTrait,
{
    let columns = column_definition::Entity::find()
        .filter(column_definition::Column::TeamId.eq(loser.id.as_str()))
        .order_by_asc(column_definition::Column::Id)
        .all(conn)
        .await?;

    let mut outcome = MigrationOutcome::default();
    for column in columns {
        column.delete(conn).await?;
        outcome.removed += 1;
    }

    Ok(outcome)
}

/// Re-parent thoughts and re-link each one to the survivor's column with the
/// same topic, or to no column if the survivor has none.
pub async fn move_thoughts<C>(
    conn: &C,
    loser: &team::Model,
    survivor: &team::Model,
) -> Result<MigrationOutcome, DbErr>
where
    C: ConnectionTrait,
{
    let survivor_columns: HashMap<String, i32> = column_definition::Entity::find()
        .filter(column_definition::Column::TeamId.eq(survivor.id.as_str()))
        .all(conn)
        .await?
        .into_iter()
        .map(|column| (column.topic, column.id))
        .collect();

    let thoughts = thought::Entity::find()
        .filter(thought::Column::TeamId.eq(loser.id.as_str()))
        .order_by_asc(thought::Column::Id)
        .all(conn)
        .await?;

    let mut outcome = MigrationOutcome::default();
    for item in thoughts {
        let column = survivor_columns.get(&item.topic).copied();
        let mut active: thought::ActiveModel = item.into();
        active.team_id = Set(survivor.id.clone());
        active.column_definition_id = Set(column);
        active.update(conn).await?;
        outcome.moved += 1;
    }

    Ok(outcome)
}

/// Re-parent archived boards. Their thoughts are handled by [`move_thoughts`].
pub async fn move_boards<C>(
    conn: &C,
    loser: &team::Model,
    survivor: &team::Model,
) -> Result<MigrationOutcome, DbErr>
where
    C: ConnectionTrait,
{
    let boards = board::Entity::find()
        .filter(board::Column::TeamId.eq(loser.id.as_str()))
        .order_by_asc(board::Column::Id)
        .all(conn)
        .await?;

    let mut outcome = MigrationOutcome::default();
    for archived in boards {
        let mut active: board::ActiveModel = archived.into();
        active.team_id = Set(survivor.id.clone());
        active.update(conn).await?;
        outcome.moved += 1;
    }

    Ok(outcome)
}

pub async fn move_action_items<C>(
    conn: &C,
    loser: &team::Model,
    survivor: &team::Model,
) -> Result<MigrationOutcome, DbErr>
where
    C: ConnectionTrait,
{
    let items = action_item::Entity::find()
        .filter(action_item::Column::TeamId.eq(loser.id.as_str()))
        .order_by_asc(action_item::Column::Id)
        .all(conn)
        .await?;

    let mut outcome = MigrationOutcome::default();
    for item in items {
        let mut active: action_item::ActiveModel = item.into();
        active.team_id = Set(survivor.id.clone());
        active.update(conn).await?;
        outcome.moved += 1;
    }

    Ok(outcome)
}

/// Move memberships without creating a duplicate `(user, survivor)` pair.
///
/// The survivor link is looked up for every row on every run; nothing is
/// assumed about what an earlier, interrupted run already did.
pub async fn merge_user_teams<C>(
    conn: &C,
    loser: &team::Model,
    survivor: &team::Model,
) -> Result<MigrationOutcome, DbErr>
where
    C: ConnectionTrait,
{
    let links = user_team::Entity::find()
        .filter(user_team::Column::TeamId.eq(loser.id.as_str()))
        .order_by_asc(user_team::Column::UserId)
        .all(conn)
        .await?;

    let mut outcome = MigrationOutcome::default();
    for link in links {
        let existing = user_team::Entity::find_by_id((link.user_id, survivor.id.clone()))
            .one(conn)
            .await?;

        if existing.is_some() {
            link.delete(conn).await?;
            outcome.removed += 1;
            continue;
        }

        // team_id is part of the primary key, so the row is updated by filter
        // rather than through its active model.
        user_team::Entity::update_many()
            .col_expr(user_team::Column::TeamId, Expr::value(survivor.id.clone()))
            .filter(user_team::Column::UserId.eq(link.user_id))
            .filter(user_team::Column::TeamId.eq(loser.id.as_str()))
            .exec(conn)
            .await?;
        outcome.moved += 1;
    }

    Ok(outcome)
}

pub async fn move_feedback<C>(
    conn: &C,
    loser: &team::Model,
    survivor: &team::Model,
) -> Result<MigrationOutcome, DbErr>
where
    C: ConnectionTrait,
{
    let entries = feedback::Entity::find()
        .filter(feedback::Column::TeamId.eq(loser.id.as_str()))
        .order_by_asc(feedback::Column::Id)
        .all(conn)
        .await?;

    let mut outcome = MigrationOutcome::default();
    for entry in entries {
        let mut active: feedback::ActiveModel = entry.into();
        active.team_id = Set(Some(survivor.id.clone()));
        active.update(conn).await?;
        outcome.moved += 1;
    }

    Ok(outcome)
}
