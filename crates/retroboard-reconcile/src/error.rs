//! Error types for the reconciliation job

use sea_orm::DbErr;
use thiserror::Error;

use crate::migrate::DependentKind;

/// Errors raised while reconciling colliding teams
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Conflict groups could not be listed. Nothing has been written.
    #[error("Conflict detection failed: {0}")]
    Detection(#[source] DbErr),

    /// Members or recency scores of a group could not be loaded
    #[error("Failed to resolve conflict group '{key}': {source}")]
    Resolution {
        key: String,
        #[source]
        source: DbErr,
    },

    /// A dependent record could not be re-pointed or removed
    #[error("Failed to migrate {kind} from team '{loser}' to '{survivor}': {source}")]
    Migration {
        kind: DependentKind,
        loser: String,
        survivor: String,
        #[source]
        source: DbErr,
    },

    /// The losing team row itself could not be removed
    #[error("Failed to delete team '{team}': {source}")]
    Deletion {
        team: String,
        #[source]
        source: DbErr,
    },

    /// Begin or commit of a group's unit of work failed
    #[error("Transaction error: {0}")]
    Transaction(#[source] DbErr),
}

pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;
