//! Team identity reconciliation
//!
//! Teams whose names differ only by case or surrounding whitespace are
//! merged into one. For each group of such teams the most recently active
//! one survives, every record owned by the others is moved onto it, and the
//! others are deleted.
//!
//! ```ignore
//! let db = retroboard_db::connect("sqlite://./retroboard.db").await?;
//! let report = retroboard_reconcile::reconcile(&db).await?;
//! println!("merged {} groups", report.groups_merged);
//! ```

pub mod canonical;
pub mod detect;
pub mod error;
pub mod migrate;
pub mod plan;
pub mod reconcile;
pub mod select;
pub mod trigger;

pub use canonical::canonical_key;
pub use detect::{fetch_group_members, find_conflict_groups, ConflictGroup, ConflictSummary};
pub use error::{ReconcileError, Result};
pub use migrate::{DependentKind, MigrationOutcome};
pub use plan::{plan, resolve_group, GroupPlan};
pub use reconcile::{reconcile, FailurePolicy, GroupFailure, Phase, ReconcileReport, Reconciler};
pub use select::{select_survivor, Candidate};
pub use trigger::{run_if_enabled, CleanupSettings};
