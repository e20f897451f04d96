//! Reconciliation orchestrator
//!
//! Drives a run through its phases:
//!
//! ```text
//! Idle -> Detecting -> ResolvingGroup(i) -> Migrating(i) -> DeletingLoser(i) -> ... -> Done
//! ```
//!
//! Each group is resolved, migrated and pruned inside one transaction. A
//! losing team is deleted only after all six migrators succeeded for it, and
//! if anything in the group fails the whole group is rolled back. Groups are
//! independent of each other: a failure in one does not undo earlier ones.
//!
//! A second run right after a successful one finds no groups and writes
//! nothing. After a failed group, the next run detects the same group again
//! and retries it from scratch.

use std::collections::BTreeMap;
use std::fmt;

use retroboard_db::entities::team;
use sea_orm::{DatabaseConnection, DatabaseTransaction, EntityTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::detect::find_conflict_groups;
use crate::error::{ReconcileError, Result};
use crate::migrate::{DependentKind, MigrationOutcome};
use crate::plan::{resolve_group, GroupPlan};

/// What to do when a group cannot be merged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and carry on with the next group
    #[default]
    Isolate,
    /// Stop the run at the first failed group
    Abort,
}

/// Where a run currently is. Group indices are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "group", rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Detecting,
    ResolvingGroup(usize),
    Migrating(usize),
    DeletingLoser(usize),
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Detecting => write!(f, "detecting"),
            Phase::ResolvingGroup(i) => write!(f, "resolving group {}", i),
            Phase::Migrating(i) => write!(f, "migrating group {}", i),
            Phase::DeletingLoser(i) => write!(f, "deleting loser of group {}", i),
            Phase::Done => write!(f, "done"),
        }
    }
}

/// A group that could not be merged during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupFailure {
    pub canonical_key: String,
    /// Phase the group was in when it failed
    pub phase: Phase,
    pub error: String,
}

/// Outcome of one reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Conflict groups found by detection
    pub groups_found: usize,
    /// Groups whose losers were all merged and deleted
    pub groups_merged: usize,
    /// Groups with fewer than two members left by the time they were resolved
    pub groups_skipped: usize,
    /// Ids of deleted losing teams, in deletion order
    pub teams_removed: Vec<String>,
    /// Committed work per dependent kind
    pub migrated: BTreeMap<DependentKind, MigrationOutcome>,
    pub failures: Vec<GroupFailure>,
    /// Set when [`FailurePolicy::Abort`] stopped the run early
    pub aborted: bool,
}

impl ReconcileReport {
    /// True when every detected group was merged or skipped.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.aborted
    }

    fn record(&mut self, merged: MergedGroup) {
        self.groups_merged += 1;
        self.teams_removed.extend(merged.removed);
        for (kind, outcome) in merged.migrated {
            self.migrated.entry(kind).or_default().merge(outcome);
        }
    }
}

/// Work done for one group, folded into the report only after commit
struct MergedGroup {
    removed: Vec<String>,
    migrated: BTreeMap<DependentKind, MigrationOutcome>,
}

/// Runs the reconciliation job against one database
pub struct Reconciler<'a> {
    db: &'a DatabaseConnection,
    policy: FailurePolicy,
    phase: Phase,
}

impl<'a> Reconciler<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self {
            db,
            policy: FailurePolicy::default(),
            phase: Phase::Idle,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = %self.phase, to = %phase, "Reconciliation phase change");
        self.phase = phase;
    }

    /// Detect and merge every conflict group.
    ///
    /// Only a detection failure is returned as an error; nothing has been
    /// written at that point. Per-group failures are reported in
    /// [`ReconcileReport::failures`].
    pub async fn run(&mut self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        self.enter(Phase::Detecting);
        let groups = match find_conflict_groups(self.db).await {
            Ok(groups) => groups,
            Err(err) => {
                self.enter(Phase::Done);
                return Err(ReconcileError::Detection(err));
            }
        };
        report.groups_found = groups.len();

        if groups.is_empty() {
            info!("No conflicting team names found");
            self.enter(Phase::Done);
            return Ok(report);
        }

        info!(groups = groups.len(), "Found conflicting team names");

        for (index, summary) in groups.iter().enumerate() {
            match self.reconcile_group(index, &summary.canonical_key).await {
                Ok(Some(merged)) => report.record(merged),
                Ok(None) => {
                    warn!(
                        canonical_key = %summary.canonical_key,
                        "Conflict group no longer has two members; skipping"
                    );
                    report.groups_skipped += 1;
                }
                Err(err) => {
                    error!(
                        canonical_key = %summary.canonical_key,
                        phase = %self.phase,
                        error = %err,
                        "Failed to reconcile conflict group; changes rolled back"
                    );
                    report.failures.push(GroupFailure {
                        canonical_key: summary.canonical_key.clone(),
                        phase: self.phase,
                        error: err.to_string(),
                    });

                    if self.policy == FailurePolicy::Abort {
                        report.aborted = true;
                        break;
                    }
                }
            }
        }

        self.enter(Phase::Done);
        info!(
            groups_found = report.groups_found,
            groups_merged = report.groups_merged,
            groups_skipped = report.groups_skipped,
            teams_removed = report.teams_removed.len(),
            failures = report.failures.len(),
            "Team reconciliation finished"
        );

        Ok(report)
    }

    /// Merge one group inside its own transaction.
    async fn reconcile_group(
        &mut self,
        index: usize,
        canonical_key: &str,
    ) -> Result<Option<MergedGroup>> {
        self.enter(Phase::ResolvingGroup(index));
        let txn = self.db.begin().await.map_err(ReconcileError::Transaction)?;

        match self.merge_within(&txn, index, canonical_key).await {
            Ok(merged) => {
                txn.commit().await.map_err(ReconcileError::Transaction)?;
                Ok(merged)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn merge_within(
        &mut self,
        txn: &DatabaseTransaction,
        index: usize,
        canonical_key: &str,
    ) -> Result<Option<MergedGroup>> {
        let plan = resolve_group(txn, canonical_key)
            .await
            .map_err(|source| ReconcileError::Resolution {
                key: canonical_key.to_string(),
                source,
            })?;

        let Some(GroupPlan {
            survivor, losers, ..
        }) = plan
        else {
            return Ok(None);
        };

        let mut merged = MergedGroup {
            removed: Vec::with_capacity(losers.len()),
            migrated: BTreeMap::new(),
        };

        for loser in &losers {
            self.enter(Phase::Migrating(index));
            for kind in DependentKind::ALL {
                let outcome = kind.migrate(txn, &loser.team, &survivor.team).await?;
                merged.migrated.entry(kind).or_default().merge(outcome);
            }

            self.enter(Phase::DeletingLoser(index));
            delete_team(txn, &loser.team).await?;
            merged.removed.push(loser.team.id.clone());
        }

        info!(
            canonical_key = %canonical_key,
            survivor = %survivor.team.id,
            losers = ?merged.removed,
            "Merged conflicting teams"
        );

        Ok(Some(merged))
    }
}

async fn delete_team(txn: &DatabaseTransaction, loser: &team::Model) -> Result<()> {
    team::Entity::delete_by_id(loser.id.clone())
        .exec(txn)
        .await
        .map_err(|source| ReconcileError::Deletion {
            team: loser.id.clone(),
            source,
        })?;
    Ok(())
}

/// Run the job once with the default [`FailurePolicy`].
pub async fn reconcile(db: &DatabaseConnection) -> Result<ReconcileReport> {
    Reconciler::new(db).run().await
}
