//! Survivor selection
//!
//! The team whose newest thought has the highest id wins. Thought ids only
//! ever grow, so this picks the team that was posted to most recently.
//!
//! Ties (including groups where nobody has posted) go to the first candidate
//! in the order given, which is team id order when candidates come from
//! [`crate::detect::fetch_group_members`]. There is no business meaning behind
//! that choice; it is only stable.

use retroboard_db::entities::{team, thought};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use serde::Serialize;

/// A conflict group member with its recency score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub team: team::Model,
    /// Highest thought id recorded under the team, 0 when it has none
    pub latest_thought_id: i32,
}

/// Highest thought id ever recorded under `team_id`, or 0.
pub async fn latest_thought_id<C>(conn: &C, team_id: &str) -> Result<i32, DbErr>
where
    C: ConnectionTrait,
{
    let latest: Option<Option<i32>> = thought::Entity::find()
        .select_only()
        .column_as(thought::Column::Id.max(), "latest_id")
        .filter(thought::Column::TeamId.eq(team_id))
        .into_tuple()
        .one(conn)
        .await?;

    Ok(latest.flatten().unwrap_or(0))
}

/// Score every member of a group.
pub async fn score_candidates<C>(
    conn: &C,
    members: Vec<team::Model>,
) -> Result<Vec<Candidate>, DbErr>
where
    C: ConnectionTrait,
{
    let mut candidates = Vec::with_capacity(members.len());
    for team in members {
        let latest_thought_id = latest_thought_id(conn, &team.id).await?;
        candidates.push(Candidate {
            team,
            latest_thought_id,
        });
    }
    Ok(candidates)
}

/// Split candidates into the survivor and the losers.
///
/// Returns `None` for an empty slice. Losers keep their input order.
pub fn select_survivor(mut candidates: Vec<Candidate>) -> Option<(Candidate, Vec<Candidate>)> {
    if candidates.is_empty() {
        return None;
    }

    let mut winner = 0;
    for (index, candidate) in candidates.iter().enumerate().skip(1) {
        if candidate.latest_thought_id > candidates[winner].latest_thought_id {
            winner = index;
        }
    }

    let survivor = candidates.remove(winner);
    Some((survivor, candidates))
}
