//! Startup gate for the cleanup job

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::reconcile::{FailurePolicy, ReconcileReport, Reconciler};

/// Settings read from the `cleanup` section of the config file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupSettings {
    /// Run reconciliation once at startup, before serving
    pub run_team_cleanup_job: bool,
    /// Stop at the first failed group instead of isolating it
    pub abort_on_error: bool,
}

impl CleanupSettings {
    pub fn policy(&self) -> FailurePolicy {
        if self.abort_on_error {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Isolate
        }
    }
}

/// Run reconciliation if the job is enabled.
///
/// Returns `Ok(None)` without touching the store when it is disabled.
pub async fn run_if_enabled(
    db: &DatabaseConnection,
    settings: &CleanupSettings,
) -> Result<Option<ReconcileReport>> {
    if !settings.run_team_cleanup_job {
        info!("Team cleanup job disabled");
        return Ok(None);
    }

    info!(policy = ?settings.policy(), "Running team cleanup job");
    let report = Reconciler::new(db).with_policy(settings.policy()).run().await?;
    Ok(Some(report))
}
