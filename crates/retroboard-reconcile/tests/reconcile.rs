//! Integration tests for team reconciliation
//!
//! Every test runs against a fresh SQLite in-memory database with the full
//! schema applied.

use std::collections::HashSet;

use chrono::Utc;
use retroboard_db::entities::{
    action_item, board, column_definition, feedback, team, thought, user, user_team,
};
use retroboard_db::{connect, migrate};
use retroboard_reconcile::{
    canonical_key, find_conflict_groups, migrate::merge_user_teams, plan, reconcile,
    run_if_enabled, CleanupSettings, DependentKind, FailurePolicy, Phase, ReconcileError,
    Reconciler,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

async fn setup_test_db() -> DatabaseConnection {
    let db = connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    migrate(&db).await.expect("Failed to run migrations");

    db
}

/// Insert a team with an explicit id plus the default columns.
async fn insert_team(db: &DatabaseConnection, id: &str, name: &str) -> team::Model {
    let created = team::ActiveModel {
        id: Set(id.to_string()),
        name: Set(name.to_string()),
        password_hash: Set("hash".to_string()),
        date_created: Set(Some(Utc::now())),
        failed_login_attempts: Set(0),
    }
    .insert(db)
    .await
    .expect("Failed to insert team");

    column_definition::Entity::insert_many(column_definition::default_columns(id))
        .exec(db)
        .await
        .expect("Failed to insert default columns");

    created
}

async fn column_for(db: &DatabaseConnection, team_id: &str, topic: &str) -> Option<i32> {
    column_definition::Entity::find()
        .filter(column_definition::Column::TeamId.eq(team_id))
        .filter(column_definition::Column::Topic.eq(topic))
        .one(db)
        .await
        .expect("Failed to load column")
        .map(|c| c.id)
}

async fn add_thought(db: &DatabaseConnection, team_id: &str, topic: &str) -> thought::Model {
    let column = column_for(db, team_id, topic).await;
    thought::ActiveModel {
        message: Set(format!("{} thought", topic)),
        hearts: Set(0),
        topic: Set(topic.to_string()),
        discussed: Set(false),
        team_id: Set(team_id.to_string()),
        column_definition_id: Set(column),
        board_id: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert thought")
}

async fn add_board(db: &DatabaseConnection, team_id: &str) -> board::Model {
    board::ActiveModel {
        team_id: Set(team_id.to_string()),
        date_created: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert board")
}

async fn add_action_item(
    db: &DatabaseConnection,
    team_id: &str,
    task: &str,
) -> action_item::Model {
    action_item::ActiveModel {
        task: Set(task.to_string()),
        completed: Set(false),
        assignee: Set(None),
        archived: Set(false),
        team_id: Set(team_id.to_string()),
        date_created: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert action item")
}

async fn add_feedback(db: &DatabaseConnection, team_id: Option<&str>) -> feedback::Model {
    feedback::ActiveModel {
        stars: Set(4),
        comments: Set("useful".to_string()),
        user_email: Set(None),
        team_id: Set(team_id.map(str::to_string)),
        date_created: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert feedback")
}

async fn add_user(db: &DatabaseConnection, name: &str) -> user::Model {
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        password_hash: Set("hash".to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}

async fn link(db: &DatabaseConnection, user_id: Uuid, team_id: &str) {
    user_team::ActiveModel {
        user_id: Set(user_id),
        team_id: Set(team_id.to_string()),
        joined_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to link user to team");
}

async fn team_ids(db: &DatabaseConnection) -> Vec<String> {
    team::Entity::find()
        .order_by_asc(team::Column::Id)
        .all(db)
        .await
        .expect("Failed to load teams")
        .into_iter()
        .map(|t| t.id)
        .collect()
}

async fn thoughts_of(db: &DatabaseConnection, team_id: &str) -> Vec<thought::Model> {
    thought::Entity::find()
        .filter(thought::Column::TeamId.eq(team_id))
        .order_by_asc(thought::Column::Id)
        .all(db)
        .await
        .expect("Failed to load thoughts")
}

async fn memberships(db: &DatabaseConnection, user_id: Uuid) -> Vec<String> {
    user_team::Entity::find()
        .filter(user_team::Column::UserId.eq(user_id))
        .order_by_asc(user_team::Column::TeamId)
        .all(db)
        .await
        .expect("Failed to load memberships")
        .into_iter()
        .map(|l| l.team_id)
        .collect()
}

/// Make every update of `loser`'s action items fail.
async fn break_action_items_of(db: &DatabaseConnection, loser: &str) {
    db.execute_unprepared(&format!(
        "CREATE TRIGGER fail_action_item_move BEFORE UPDATE ON action_items \
         WHEN OLD.team_id = '{}' BEGIN SELECT RAISE(ABORT, 'action item move rejected'); END;",
        loser
    ))
    .await
    .expect("Failed to create trigger");
}

#[tokio::test]
async fn test_trailing_space_duplicate_is_merged_into_recent_team() {
    let db = setup_test_db().await;

    insert_team(&db, "name0-", "name0 ").await;
    insert_team(&db, "name0", "name0").await;

    let topics = ["happy", "confused", "sad", "happy", "sad"];
    for topic in topics {
        add_thought(&db, "name0-", topic).await;
    }
    for _ in 0..7 {
        add_thought(&db, "name0", "confused").await;
    }

    let report = reconcile(&db).await.expect("Reconciliation failed");

    assert_eq!(report.groups_found, 1);
    assert_eq!(report.groups_merged, 1);
    assert_eq!(report.teams_removed, vec!["name0-".to_string()]);
    assert_eq!(team_ids(&db).await, vec!["name0".to_string()]);

    let thoughts = thoughts_of(&db, "name0").await;
    assert_eq!(thoughts.len(), 12);
    assert_eq!(thoughts.iter().map(|t| t.id).max(), Some(12));
    for item in &thoughts {
        assert_eq!(item.column_definition_id, column_for(&db, "name0", &item.topic).await);
    }

    let loser_columns = column_definition::Entity::find()
        .filter(column_definition::Column::TeamId.eq("name0-"))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(loser_columns, 0);

    assert_eq!(report.migrated[&DependentKind::Thoughts].moved, 5);
    assert_eq!(report.migrated[&DependentKind::ColumnDefinitions].removed, 3);
}

#[tokio::test]
async fn test_no_duplicate_canonical_names_after_run() {
    let db = setup_test_db().await;

    insert_team(&db, "alpha-1", "Alpha").await;
    insert_team(&db, "alpha-2", "alpha ").await;
    insert_team(&db, "alpha-3", "ALPHA").await;
    insert_team(&db, "beta-1", "Beta").await;
    insert_team(&db, "beta-2", " beta").await;
    insert_team(&db, "gamma", "Gamma").await;
    insert_team(&db, "gamma-spaced", "Gam ma").await;

    let report = reconcile(&db).await.unwrap();
    assert_eq!(report.groups_found, 2);
    assert_eq!(report.teams_removed.len(), 3);
    assert!(report.is_clean());

    let remaining = team::Entity::find().all(&db).await.unwrap();
    assert_eq!(remaining.len(), 4);

    let keys: HashSet<String> = remaining.iter().map(|t| canonical_key(&t.name)).collect();
    assert_eq!(keys.len(), remaining.len());
    assert!(find_conflict_groups(&db).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_tab_and_unicode_case_variants_are_merged() {
    let db = setup_test_db().await;

    insert_team(&db, "tab-1", "Tab\t").await;
    insert_team(&db, "tab-2", "tab").await;
    insert_team(&db, "equipe-1", "équipe").await;
    insert_team(&db, "equipe-2", "ÉQUIPE").await;

    let groups = find_conflict_groups(&db).await.unwrap();
    let keys: Vec<&str> = groups.iter().map(|g| g.canonical_key.as_str()).collect();
    assert_eq!(keys, vec!["TAB", "ÉQUIPE"]);

    let report = reconcile(&db).await.unwrap();
    assert_eq!(report.groups_found, 2);
    assert_eq!(report.groups_merged, 2);
    assert_eq!(
        report.teams_removed,
        vec!["tab-2".to_string(), "equipe-2".to_string()]
    );

    let remaining = team::Entity::find().all(&db).await.unwrap();
    let keys: HashSet<String> = remaining.iter().map(|t| canonical_key(&t.name)).collect();
    assert_eq!(remaining.len(), 2);
    assert_eq!(keys.len(), remaining.len());
}

#[tokio::test]
async fn test_three_member_group_keeps_most_recent() {
    let db = setup_test_db().await;

    insert_team(&db, "retro-a", "Retro").await;
    insert_team(&db, "retro-b", "retro").await;
    insert_team(&db, "retro-c", "RETRO ").await;

    add_thought(&db, "retro-a", "happy").await;
    add_thought(&db, "retro-c", "happy").await;
    add_thought(&db, "retro-b", "sad").await;
    add_thought(&db, "retro-a", "sad").await;

    let report = reconcile(&db).await.unwrap();

    assert_eq!(team_ids(&db).await, vec!["retro-a".to_string()]);
    assert_eq!(report.teams_removed, vec!["retro-b".to_string(), "retro-c".to_string()]);
    assert_eq!(thoughts_of(&db, "retro-a").await.len(), 4);
}

#[tokio::test]
async fn test_tie_goes_to_lowest_team_id() {
    let db = setup_test_db().await;

    insert_team(&db, "quiet-b", "Quiet").await;
    insert_team(&db, "quiet-a", "quiet").await;

    reconcile(&db).await.unwrap();

    assert_eq!(team_ids(&db).await, vec!["quiet-a".to_string()]);
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let db = setup_test_db().await;

    insert_team(&db, "ops", "Ops").await;
    insert_team(&db, "ops-", "ops ").await;
    add_thought(&db, "ops-", "happy").await;
    add_action_item(&db, "ops-", "rotate keys").await;
    add_board(&db, "ops").await;

    let first = reconcile(&db).await.unwrap();
    assert_eq!(first.groups_merged, 1);

    let teams_after_first = team::Entity::find().all(&db).await.unwrap();
    let thoughts_after_first = thought::Entity::find().all(&db).await.unwrap();
    let items_after_first = action_item::Entity::find().all(&db).await.unwrap();
    let columns_after_first = column_definition::Entity::find().all(&db).await.unwrap();

    let second = reconcile(&db).await.unwrap();
    assert_eq!(second.groups_found, 0);
    assert!(second.teams_removed.is_empty());
    assert!(second.migrated.is_empty());

    assert_eq!(team::Entity::find().all(&db).await.unwrap(), teams_after_first);
    assert_eq!(thought::Entity::find().all(&db).await.unwrap(), thoughts_after_first);
    assert_eq!(action_item::Entity::find().all(&db).await.unwrap(), items_after_first);
    assert_eq!(
        column_definition::Entity::find().all(&db).await.unwrap(),
        columns_after_first
    );
}

#[tokio::test]
async fn test_survivor_keeps_its_columns() {
    let db = setup_test_db().await;

    let survivor = insert_team(&db, "design", "Design").await;
    insert_team(&db, "design-", "design ").await;

    column_definition::ActiveModel {
        team_id: Set("design".to_string()),
        topic: Set("ideas".to_string()),
        title: Set("Ideas".to_string()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();
    add_thought(&db, "design", "ideas").await;

    let before = survivor
        .find_related(column_definition::Entity)
        .order_by_asc(column_definition::Column::Id)
        .all(&db)
        .await
        .unwrap();

    reconcile(&db).await.unwrap();

    let after = survivor
        .find_related(column_definition::Entity)
        .order_by_asc(column_definition::Column::Id)
        .all(&db)
        .await
        .unwrap();

    assert_eq!(before.len(), 4);
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_no_orphaned_dependents() {
    let db = setup_test_db().await;

    insert_team(&db, "platform", "Platform").await;
    insert_team(&db, "platform-", "PLATFORM ").await;

    add_thought(&db, "platform-", "happy").await;
    add_board(&db, "platform-").await;
    add_action_item(&db, "platform-", "fix flaky test").await;
    add_feedback(&db, Some("platform-")).await;
    add_thought(&db, "platform", "sad").await;

    let report = reconcile(&db).await.unwrap();
    assert_eq!(report.teams_removed, vec!["platform-".to_string()]);

    let live: HashSet<String> = team_ids(&db).await.into_iter().collect();

    for item in thought::Entity::find().all(&db).await.unwrap() {
        assert!(live.contains(&item.team_id));
    }
    for archived in board::Entity::find().all(&db).await.unwrap() {
        assert_eq!(archived.team_id, "platform");
    }
    for item in action_item::Entity::find().all(&db).await.unwrap() {
        assert_eq!(item.team_id, "platform");
    }
    for entry in feedback::Entity::find().all(&db).await.unwrap() {
        assert_eq!(entry.team_id.as_deref(), Some("platform"));
    }

    assert_eq!(thought::Entity::find().count(&db).await.unwrap(), 2);
    assert_eq!(report.migrated[&DependentKind::Boards].moved, 1);
    assert_eq!(report.migrated[&DependentKind::ActionItems].moved, 1);
    assert_eq!(report.migrated[&DependentKind::Feedback].moved, 1);
}

#[tokio::test]
async fn test_shared_membership_is_not_duplicated() {
    let db = setup_test_db().await;

    insert_team(&db, "data", "Data").await;
    insert_team(&db, "data-", "data ").await;
    add_thought(&db, "data", "happy").await;

    let both = add_user(&db, "both").await;
    let loser_only = add_user(&db, "loser-only").await;
    link(&db, both.id, "data").await;
    link(&db, both.id, "data-").await;
    link(&db, loser_only.id, "data-").await;

    let report = reconcile(&db).await.unwrap();

    assert_eq!(memberships(&db, both.id).await, vec!["data".to_string()]);
    assert_eq!(memberships(&db, loser_only.id).await, vec!["data".to_string()]);
    assert_eq!(
        report.migrated[&DependentKind::UserTeams],
        retroboard_reconcile::MigrationOutcome { moved: 1, removed: 1 }
    );
}

#[tokio::test]
async fn test_thoughts_relink_by_topic() {
    let db = setup_test_db().await;

    insert_team(&db, "infra", "Infra").await;
    insert_team(&db, "infra-", "infra ").await;

    let sad = add_thought(&db, "infra-", "sad").await;
    let happy = add_thought(&db, "infra-", "happy").await;
    add_thought(&db, "infra", "happy").await;

    let survivor_sad = column_for(&db, "infra", "sad").await;
    let survivor_happy = column_for(&db, "infra", "happy").await;
    assert!(survivor_sad.is_some());
    assert_ne!(survivor_sad, survivor_happy);

    reconcile(&db).await.unwrap();

    let sad = thought::Entity::find_by_id(sad.id).one(&db).await.unwrap().unwrap();
    let happy = thought::Entity::find_by_id(happy.id).one(&db).await.unwrap().unwrap();

    assert_eq!(sad.team_id, "infra");
    assert_eq!(sad.column_definition_id, survivor_sad);
    assert_eq!(happy.column_definition_id, survivor_happy);
}

#[tokio::test]
async fn test_thought_without_matching_column_is_unlinked() {
    let db = setup_test_db().await;

    insert_team(&db, "mobile", "Mobile").await;
    insert_team(&db, "mobile-", "mobile ").await;

    column_definition::ActiveModel {
        team_id: Set("mobile-".to_string()),
        topic: Set("kudos".to_string()),
        title: Set("Kudos".to_string()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();
    let kudos = add_thought(&db, "mobile-", "kudos").await;
    assert!(kudos.column_definition_id.is_some());
    add_thought(&db, "mobile", "happy").await;

    reconcile(&db).await.unwrap();

    let kudos = thought::Entity::find_by_id(kudos.id).one(&db).await.unwrap().unwrap();
    assert_eq!(kudos.team_id, "mobile");
    assert_eq!(kudos.topic, "kudos");
    assert_eq!(kudos.column_definition_id, None);
}

#[tokio::test]
async fn test_board_thoughts_follow_the_board() {
    let db = setup_test_db().await;

    insert_team(&db, "web", "Web").await;
    insert_team(&db, "web-", "WEB ").await;

    let archived = add_board(&db, "web-").await;
    let on_board = add_thought(&db, "web-", "confused").await;
    let mut active: thought::ActiveModel = on_board.into();
    active.board_id = Set(Some(archived.id));
    let on_board = active.update(&db).await.unwrap();
    add_thought(&db, "web", "happy").await;

    reconcile(&db).await.unwrap();

    let archived = board::Entity::find_by_id(archived.id).one(&db).await.unwrap().unwrap();
    let on_board = thought::Entity::find_by_id(on_board.id).one(&db).await.unwrap().unwrap();
    assert_eq!(archived.team_id, "web");
    assert_eq!(on_board.team_id, "web");
    assert_eq!(on_board.board_id, Some(archived.id));
}

#[tokio::test]
async fn test_anonymous_feedback_is_untouched() {
    let db = setup_test_db().await;

    insert_team(&db, "sales", "Sales").await;
    insert_team(&db, "sales-", "sales ").await;
    let anonymous = add_feedback(&db, None).await;

    reconcile(&db).await.unwrap();

    let anonymous = feedback::Entity::find_by_id(anonymous.id).one(&db).await.unwrap().unwrap();
    assert_eq!(anonymous.team_id, None);
}

#[tokio::test]
async fn test_non_conflicting_teams_are_untouched() {
    let db = setup_test_db().await;

    let solo = insert_team(&db, "solo", "Solo").await;
    add_thought(&db, "solo", "happy").await;
    insert_team(&db, "dup", "Dup").await;
    insert_team(&db, "dup-", "dup ").await;

    reconcile(&db).await.unwrap();

    let reloaded = team::Entity::find_by_id("solo").one(&db).await.unwrap().unwrap();
    assert_eq!(reloaded, solo);
    assert_eq!(thoughts_of(&db, "solo").await.len(), 1);
}

#[tokio::test]
async fn test_disabled_flag_leaves_conflicts_in_place() {
    let db = setup_test_db().await;

    insert_team(&db, "qa", "QA").await;
    insert_team(&db, "qa-", "qa ").await;

    let result = run_if_enabled(&db, &CleanupSettings::default()).await.unwrap();

    assert!(result.is_none());
    assert_eq!(team_ids(&db).await, vec!["qa".to_string(), "qa-".to_string()]);
    assert_eq!(find_conflict_groups(&db).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_enabled_flag_runs_the_job() {
    let db = setup_test_db().await;

    insert_team(&db, "qa", "QA").await;
    insert_team(&db, "qa-", "qa ").await;

    let settings = CleanupSettings {
        run_team_cleanup_job: true,
        abort_on_error: false,
    };
    let report = run_if_enabled(&db, &settings).await.unwrap().unwrap();

    assert_eq!(report.groups_merged, 1);
    assert_eq!(team_ids(&db).await, vec!["qa".to_string()]);
}

#[tokio::test]
async fn test_failed_migration_keeps_loser_and_isolates_group() {
    let db = setup_test_db().await;

    insert_team(&db, "broken-1", "Broken").await;
    insert_team(&db, "broken-2", "broken ").await;
    let stuck_thought = add_thought(&db, "broken-2", "happy").await;
    add_thought(&db, "broken-1", "happy").await;
    add_action_item(&db, "broken-2", "cannot move").await;

    insert_team(&db, "zulu-1", "Zulu").await;
    insert_team(&db, "zulu-2", "zulu ").await;

    break_action_items_of(&db, "broken-2").await;

    let mut reconciler = Reconciler::new(&db);
    let report = reconciler.run().await.unwrap();

    assert_eq!(reconciler.phase(), Phase::Done);
    assert_eq!(report.groups_found, 2);
    assert_eq!(report.groups_merged, 1);
    assert!(!report.is_clean());
    assert!(!report.aborted);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].canonical_key, "BROKEN");
    assert_eq!(report.failures[0].phase, Phase::Migrating(0));
    assert_eq!(report.teams_removed, vec!["zulu-2".to_string()]);

    // The whole group was rolled back, including the work done before the failure.
    let ids = team_ids(&db).await;
    assert!(ids.contains(&"broken-1".to_string()));
    assert!(ids.contains(&"broken-2".to_string()));
    let stuck_thought = thought::Entity::find_by_id(stuck_thought.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stuck_thought.team_id, "broken-2");
    assert_eq!(
        column_definition::Entity::find()
            .filter(column_definition::Column::TeamId.eq("broken-2"))
            .count(&db)
            .await
            .unwrap(),
        3
    );
    assert_eq!(report.migrated[&DependentKind::Thoughts].moved, 0);
}

#[tokio::test]
async fn test_abort_policy_stops_at_first_failure() {
    let db = setup_test_db().await;

    insert_team(&db, "broken-1", "Broken").await;
    insert_team(&db, "broken-2", "broken ").await;
    add_action_item(&db, "broken-2", "cannot move").await;
    insert_team(&db, "zulu-1", "Zulu").await;
    insert_team(&db, "zulu-2", "zulu ").await;

    break_action_items_of(&db, "broken-2").await;

    let report = Reconciler::new(&db)
        .with_policy(FailurePolicy::Abort)
        .run()
        .await
        .unwrap();

    assert!(report.aborted);
    assert_eq!(report.groups_merged, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(team_ids(&db).await.len(), 4);
}

#[tokio::test]
async fn test_failed_group_is_retried_on_next_run() {
    let db = setup_test_db().await;

    insert_team(&db, "broken-1", "Broken").await;
    insert_team(&db, "broken-2", "broken ").await;
    add_action_item(&db, "broken-2", "move me later").await;

    break_action_items_of(&db, "broken-2").await;
    let first = reconcile(&db).await.unwrap();
    assert_eq!(first.failures.len(), 1);

    db.execute_unprepared("DROP TRIGGER fail_action_item_move")
        .await
        .unwrap();

    let second = reconcile(&db).await.unwrap();
    assert!(second.is_clean());
    assert_eq!(second.teams_removed, vec!["broken-2".to_string()]);

    let items = action_item::Entity::find().all(&db).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].team_id, "broken-1");
}

#[tokio::test]
async fn test_detection_failure_is_returned_before_any_write() {
    let db = setup_test_db().await;

    insert_team(&db, "qa-1", "QA").await;
    insert_team(&db, "qa-2", "qa ").await;
    add_thought(&db, "qa-2", "happy").await;

    db.execute_unprepared("ALTER TABLE teams RENAME TO teams_archive")
        .await
        .unwrap();

    let mut reconciler = Reconciler::new(&db);
    let err = reconciler.run().await.unwrap_err();

    assert!(matches!(err, ReconcileError::Detection(_)));
    assert_eq!(reconciler.phase(), Phase::Done);

    db.execute_unprepared("ALTER TABLE teams_archive RENAME TO teams")
        .await
        .unwrap();

    assert_eq!(
        team_ids(&db).await,
        vec!["qa-1".to_string(), "qa-2".to_string()]
    );
    assert_eq!(thoughts_of(&db, "qa-2").await.len(), 1);
    assert_eq!(column_definition::Entity::find().count(&db).await.unwrap(), 6);
}

#[tokio::test]
async fn test_resolution_failure_names_the_failing_group() {
    let db = setup_test_db().await;

    insert_team(&db, "alpha-1", "Alpha").await;
    insert_team(&db, "alpha-2", "alpha ").await;
    insert_team(&db, "beta-1", "Beta").await;
    insert_team(&db, "beta-2", "beta ").await;

    // Detection only reads teams; scoring the candidates reads thoughts.
    db.execute_unprepared("ALTER TABLE thoughts RENAME TO thoughts_archive")
        .await
        .unwrap();

    let report = reconcile(&db).await.unwrap();

    assert_eq!(report.groups_found, 2);
    assert_eq!(report.groups_merged, 0);
    let phases: Vec<Phase> = report.failures.iter().map(|f| f.phase).collect();
    assert_eq!(
        phases,
        vec![Phase::ResolvingGroup(0), Phase::ResolvingGroup(1)]
    );
    assert_eq!(team_ids(&db).await.len(), 4);
}

#[tokio::test]
async fn test_membership_merge_after_partial_earlier_pass() {
    let db = setup_test_db().await;

    let survivor = insert_team(&db, "core", "Core").await;
    let loser = insert_team(&db, "core-", "core ").await;
    add_thought(&db, "core", "happy").await;

    let early = add_user(&db, "early").await;
    link(&db, early.id, "core-").await;

    // An earlier pass already moved this membership.
    let outcome = merge_user_teams(&db, &loser, &survivor).await.unwrap();
    assert_eq!(outcome.moved, 1);

    // Memberships added afterwards, one of them duplicating the moved one.
    let late = add_user(&db, "late").await;
    link(&db, early.id, "core-").await;
    link(&db, late.id, "core-").await;

    reconcile(&db).await.unwrap();

    assert_eq!(memberships(&db, early.id).await, vec!["core".to_string()]);
    assert_eq!(memberships(&db, late.id).await, vec!["core".to_string()]);
    assert_eq!(user_team::Entity::find().count(&db).await.unwrap(), 2);
}

#[tokio::test]
async fn test_plan_does_not_mutate() {
    let db = setup_test_db().await;

    insert_team(&db, "growth", "Growth").await;
    insert_team(&db, "growth-", "growth ").await;
    add_thought(&db, "growth-", "happy").await;
    add_thought(&db, "growth", "sad").await;
    add_thought(&db, "growth-", "sad").await;

    let plans = plan(&db).await.unwrap();

    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].canonical_key, "GROWTH");
    assert_eq!(plans[0].survivor.team.id, "growth-");
    assert_eq!(plans[0].survivor.latest_thought_id, 3);
    assert_eq!(plans[0].loser_ids(), vec!["growth"]);
    assert_eq!(plans[0].losers[0].latest_thought_id, 2);

    assert_eq!(team_ids(&db).await.len(), 2);
    assert_eq!(thoughts_of(&db, "growth").await.len(), 1);

    let report = reconcile(&db).await.unwrap();
    assert_eq!(report.teams_removed, vec!["growth".to_string()]);
}

#[tokio::test]
async fn test_empty_store_reports_nothing() {
    let db = setup_test_db().await;

    let report = reconcile(&db).await.unwrap();

    assert_eq!(report.groups_found, 0);
    assert!(report.is_clean());
    assert!(plan(&db).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let db = setup_test_db().await;

    insert_team(&db, "json", "Json").await;
    insert_team(&db, "json-", "json ").await;

    let report = reconcile(&db).await.unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["groups_merged"], 1);
    assert_eq!(value["teams_removed"][0], "json-");
    assert_eq!(value["migrated"]["column_definitions"]["removed"], 3);
}
