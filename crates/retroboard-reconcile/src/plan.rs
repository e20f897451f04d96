//! Group resolution and dry runs
//!
//! Resolving a group means loading its members, scoring them and choosing the
//! survivor. The orchestrator does this inside each group's transaction; the
//! `plan` entry point does it for every group without writing anything.

use sea_orm::{ConnectionTrait, DbErr};
use serde::Serialize;

use crate::detect::{fetch_group_members, find_conflict_groups};
use crate::error::{ReconcileError, Result};
use crate::select::{score_candidates, select_survivor, Candidate};

/// What a merge of one conflict group would do
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupPlan {
    pub canonical_key: String,
    pub survivor: Candidate,
    pub losers: Vec<Candidate>,
}

impl GroupPlan {
    pub fn loser_ids(&self) -> Vec<&str> {
        self.losers.iter().map(|c| c.team.id.as_str()).collect()
    }
}

/// Resolve one group by canonical key.
///
/// Returns `None` when fewer than two teams still carry the key, e.g. because
/// one was deleted after detection ran. There is nothing to merge then.
pub async fn resolve_group<C>(conn: &C, canonical_key: &str) -> Result<Option<GroupPlan>, DbErr>
where
    C: ConnectionTrait,
{
    let group = fetch_group_members(conn, canonical_key).await?;
    if group.members.len() < 2 {
        return Ok(None);
    }

    let candidates = score_candidates(conn, group.members).await?;
    Ok(select_survivor(candidates).map(|(survivor, losers)| GroupPlan {
        canonical_key: group.canonical_key,
        survivor,
        losers,
    }))
}

/// Resolve every current conflict group without modifying the store.
pub async fn plan<C>(conn: &C) -> Result<Vec<GroupPlan>>
where
    C: ConnectionTrait,
{
    let groups = find_conflict_groups(conn)
        .await
        .map_err(ReconcileError::Detection)?;

    let mut plans = Vec::with_capacity(groups.len());
    for summary in groups {
        let resolved = resolve_group(conn, &summary.canonical_key)
            .await
            .map_err(|source| ReconcileError::Resolution {
                key: summary.canonical_key.clone(),
                source,
            })?;

        if let Some(group_plan) = resolved {
            plans.push(group_plan);
        }
    }

    Ok(plans)
}
