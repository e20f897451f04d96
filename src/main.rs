//! Retroboard - startup sequence and team maintenance
//!
//! Connects to the store, applies migrations and, when enabled, merges teams
//! whose names collide once case and surrounding spaces are ignored.

mod config;

use anyhow::{Context, Result};
use clap::{builder::BoolishValueParser, Parser, Subcommand};
use retroboard_reconcile::{
    find_conflict_groups, plan, run_if_enabled, ReconcileReport, Reconciler,
};
use sea_orm::DatabaseConnection;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use config::{AppConfig, Overrides, Settings};

/// Retroboard - retro board backend maintenance
#[derive(Parser, Debug)]
#[command(name = "retroboard")]
#[command(about = "Retroboard - retro board backend maintenance")]
#[command(version = env!("RETROBOARD_GIT_TAG"))]
#[command(long_version = concat!(
    env!("RETROBOARD_GIT_TAG"),
    "\nCommit: ",
    env!("RETROBOARD_GIT_HASH"),
    "\nBuilt: ",
    env!("RETROBOARD_BUILD_TIME")
))]
struct Cli {
    /// Config file (default: nearest .retroboard.yml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database URL (e.g. sqlite://./retroboard.db?mode=rwc or postgres://...)
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Run the team cleanup job during `start`
    #[arg(
        long,
        global = true,
        env = "RUN_TEAM_CLEANUP_JOB",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    run_team_cleanup_job: Option<bool>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect, migrate and run the startup cleanup job if enabled
    Start,

    /// List team names held by more than one team
    Conflicts {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show which team of each conflict group would be kept, without changing anything
    Plan {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Merge every conflict group now, regardless of the startup flag
    #[command(long_about = r#"
Merge every group of teams whose names differ only by case or surrounding
spaces. The team posted to most recently is kept; thoughts, boards, action
items, memberships and feedback of the others are moved onto it and the
others are deleted. Each group is merged in its own transaction.

EXAMPLES:
  # Preview first
  retroboard plan --database-url sqlite://./retroboard.db

  # Then merge
  retroboard reconcile --database-url sqlite://./retroboard.db
    "#)]
    Reconcile {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print a template .retroboard.yml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Config {
        command: ConfigCommands::Init,
    } = cli.command
    {
        print!("{}", AppConfig::template());
        return Ok(());
    }

    let settings = load_settings(&cli)?;
    init_logging(&settings.log_level)?;

    match cli.command {
        Commands::Start => handle_start(&settings).await,
        Commands::Conflicts { json } => handle_conflicts(&settings, json).await,
        Commands::Plan { json } => handle_plan(&settings, json).await,
        Commands::Reconcile { json } => handle_reconcile(&settings, json).await,
        Commands::Config { .. } => Ok(()),
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let file_config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::discover()?
            .map(|(_, config)| config)
            .unwrap_or_default(),
    };

    file_config.resolve(Overrides {
        database_url: cli.database_url.clone(),
        run_team_cleanup_job: cli.run_team_cleanup_job,
        log_level: cli.log_level.clone(),
        verbose: cli.verbose,
    })
}

fn init_logging(log_level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .context("Failed to initialize logging filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    Ok(())
}

async fn open_database(database_url: &str) -> Result<DatabaseConnection> {
    let db = retroboard_db::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    retroboard_db::migrate(&db)
        .await
        .context("Failed to run database migrations")?;

    Ok(db)
}

async fn handle_start(settings: &Settings) -> Result<()> {
    let db = open_database(&settings.database_url).await?;

    match run_if_enabled(&db, &settings.cleanup).await {
        Ok(Some(report)) if !report.is_clean() => {
            warn!(
                failures = report.failures.len(),
                "Team cleanup job left some conflict groups unmerged"
            );
        }
        Ok(_) => {}
        Err(e) => {
            error!("Team cleanup job failed: {:#}", e);
        }
    }

    info!("Startup sequence complete");
    Ok(())
}

async fn handle_conflicts(settings: &Settings, json: bool) -> Result<()> {
    let db = open_database(&settings.database_url).await?;
    let groups = find_conflict_groups(&db)
        .await
        .context("Failed to list conflicting team names")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    if groups.is_empty() {
        println!("No conflicting team names");
        return Ok(());
    }

    println!("{:<40} TEAMS", "CANONICAL NAME");
    for group in &groups {
        println!("{:<40} {}", group.canonical_key, group.member_count);
    }

    Ok(())
}

async fn handle_plan(settings: &Settings, json: bool) -> Result<()> {
    let db = open_database(&settings.database_url).await?;
    let plans = plan(&db).await.context("Failed to plan team reconciliation")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
        return Ok(());
    }

    if plans.is_empty() {
        println!("Nothing to merge");
        return Ok(());
    }

    for group in &plans {
        println!("{}", group.canonical_key);
        println!(
            "  keep   {} (latest thought {})",
            group.survivor.team.id, group.survivor.latest_thought_id
        );
        for loser in &group.losers {
            println!(
                "  merge  {} (latest thought {})",
                loser.team.id, loser.latest_thought_id
            );
        }
    }

    Ok(())
}

async fn handle_reconcile(settings: &Settings, json: bool) -> Result<()> {
    let db = open_database(&settings.database_url).await?;
    let report = Reconciler::new(&db)
        .with_policy(settings.cleanup.policy())
        .run()
        .await
        .context("Team reconciliation failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.is_clean() {
        anyhow::bail!(
            "{} conflict group(s) could not be merged",
            report.failures.len()
        );
    }

    Ok(())
}

fn print_report(report: &ReconcileReport) {
    println!("Conflict groups found:  {}", report.groups_found);
    println!("Groups merged:          {}", report.groups_merged);
    println!("Groups skipped:         {}", report.groups_skipped);
    println!("Teams removed:          {}", report.teams_removed.len());

    for (kind, outcome) in &report.migrated {
        println!(
            "  {:<20} moved {:>6}  removed {:>6}",
            kind.as_str(),
            outcome.moved,
            outcome.removed
        );
    }

    for failure in &report.failures {
        println!(
            "FAILED {} while {}: {}",
            failure.canonical_key, failure.phase, failure.error
        );
    }

    if report.aborted {
        println!("Run stopped at the first failure");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_long_version_carries_build_info() {
        let long_version = Cli::command().render_long_version();
        assert!(long_version.contains(env!("RETROBOARD_GIT_TAG")));
        assert!(long_version.contains(&format!("Commit: {}", env!("RETROBOARD_GIT_HASH"))));
        assert!(long_version.contains("Built: "));
    }

    #[test]
    fn test_cleanup_flag_without_value_enables_job() {
        let cli = Cli::try_parse_from(["retroboard", "--run-team-cleanup-job", "start"]).unwrap();
        assert_eq!(cli.run_team_cleanup_job, Some(true));
    }

    #[test]
    fn test_cleanup_flag_accepts_explicit_value() {
        let cli =
            Cli::try_parse_from(["retroboard", "start", "--run-team-cleanup-job=false"]).unwrap();
        assert_eq!(cli.run_team_cleanup_job, Some(false));
    }

    #[test]
    fn test_json_flag_on_subcommands() {
        let cli = Cli::try_parse_from(["retroboard", "plan", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Plan { json: true }));
    }
}
