//! Conflict detection
//!
//! Names are read from `teams` and bucketed by [`canonical_key`] in process,
//! so detection, member lookup and the key reported to callers always agree.
//! Detection has no side effects and can back monitoring as well as the merge
//! itself. Member rows are fetched separately, one group at a time.

use std::collections::BTreeMap;

use retroboard_db::entities::team;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, QueryOrder, QuerySelect};
use serde::Serialize;

use crate::canonical::canonical_key;

/// A canonical name held by more than one team
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictSummary {
    pub canonical_key: String,
    pub member_count: i64,
}

/// A conflict group with its member rows loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictGroup {
    pub canonical_key: String,
    /// Ordered by team id
    pub members: Vec<team::Model>,
}

/// List every canonical name held by two or more teams, ordered by key.
pub async fn find_conflict_groups<C>(conn: &C) -> Result<Vec<ConflictSummary>, DbErr>
where
    C: ConnectionTrait,
{
    let names: Vec<String> = team::Entity::find()
        .select_only()
        .column(team::Column::Name)
        .into_tuple()
        .all(conn)
        .await?;

    let mut counts: BTreeMap<String, i64> = BTreeMap::new();
    for name in &names {
        *counts.entry(canonical_key(name)).or_default() += 1;
    }

    Ok(counts
        .into_iter()
        .filter(|(_, member_count)| *member_count > 1)
        .map(|(canonical_key, member_count)| ConflictSummary {
            canonical_key,
            member_count,
        })
        .collect())
}

/// Load every team whose name canonicalizes to `canonical_key`.
///
/// Ordered by team id; the survivor tie-break relies on this order.
pub async fn fetch_group_members<C>(conn: &C, canonical_key: &str) -> Result<ConflictGroup, DbErr>
where
    C: ConnectionTrait,
{
    let members = team::Entity::find()
        .order_by_asc(team::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .filter(|member| crate::canonical::canonical_key(&member.name) == canonical_key)
        .collect();

    Ok(ConflictGroup {
        canonical_key: canonical_key.to_string(),
        members,
    })
}
