//! Initial retro board schema

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. teams (name is intentionally not unique)
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Team::Table)
                    .if_not_exists()
                    .col(string_len(Team::Id, 255).primary_key())
                    .col(string_len(Team::Name, 255).not_null())
                    .col(string_len(Team::PasswordHash, 255).not_null())
                    .col(timestamp_with_time_zone_null(Team::DateCreated))
                    .col(integer(Team::FailedLoginAttempts).not_null().default(0))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_teams_name")
                    .table(Team::Table)
                    .col(Team::Name)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. users + user_teams junction table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_len(User::Name, 255).not_null().unique_key())
                    .col(string_len(User::PasswordHash, 255).not_null())
                    .col(
                        timestamp_with_time_zone(User::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserTeam::Table)
                    .if_not_exists()
                    .col(uuid(UserTeam::UserId).not_null())
                    .col(string_len(UserTeam::TeamId, 255).not_null())
                    .col(
                        timestamp_with_time_zone(UserTeam::JoinedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(UserTeam::UserId)
                            .col(UserTeam::TeamId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_teams_user_id")
                            .from(UserTeam::Table, UserTeam::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_teams_team_id")
                            .from(UserTeam::Table, UserTeam::TeamId)
                            .to(Team::Table, Team::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_teams_team_id")
                    .table(UserTeam::Table)
                    .col(UserTeam::TeamId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 3. column_definitions
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(ColumnDefinition::Table)
                    .if_not_exists()
                    .col(pk_auto(ColumnDefinition::Id))
                    .col(string_len(ColumnDefinition::TeamId, 255).not_null())
                    .col(string_len(ColumnDefinition::Topic, 64).not_null())
                    .col(string_len(ColumnDefinition::Title, 255).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_column_definitions_team_id")
                            .from(ColumnDefinition::Table, ColumnDefinition::TeamId)
                            .to(Team::Table, Team::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_column_definitions_team_topic")
                    .table(ColumnDefinition::Table)
                    .col(ColumnDefinition::TeamId)
                    .col(ColumnDefinition::Topic)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 4. boards
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Board::Table)
                    .if_not_exists()
                    .col(pk_auto(Board::Id))
                    .col(string_len(Board::TeamId, 255).not_null())
                    .col(
                        timestamp_with_time_zone(Board::DateCreated)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_boards_team_id")
                            .from(Board::Table, Board::TeamId)
                            .to(Team::Table, Team::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_boards_team_id")
                    .table(Board::Table)
                    .col(Board::TeamId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 5. thoughts
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Thought::Table)
                    .if_not_exists()
                    .col(pk_auto(Thought::Id))
                    .col(text(Thought::Message).not_null())
                    .col(integer(Thought::Hearts).not_null().default(0))
                    .col(string_len(Thought::Topic, 64).not_null())
                    .col(boolean(Thought::Discussed).not_null().default(false))
                    .col(string_len(Thought::TeamId, 255).not_null())
                    .col(integer_null(Thought::ColumnDefinitionId))
                    .col(integer_null(Thought::BoardId))
                    .col(
                        timestamp_with_time_zone(Thought::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_thoughts_team_id")
                            .from(Thought::Table, Thought::TeamId)
                            .to(Team::Table, Team::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_thoughts_column_definition_id")
                            .from(Thought::Table, Thought::ColumnDefinitionId)
                            .to(ColumnDefinition::Table, ColumnDefinition::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_thoughts_board_id")
                            .from(Thought::Table, Thought::BoardId)
                            .to(Board::Table, Board::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_thoughts_team_id")
                    .table(Thought::Table)
                    .col(Thought::TeamId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 6. action_items
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(ActionItem::Table)
                    .if_not_exists()
                    .col(pk_auto(ActionItem::Id))
                    .col(text(ActionItem::Task).not_null())
                    .col(boolean(ActionItem::Completed).not_null().default(false))
                    .col(string_len_null(ActionItem::Assignee, 255))
                    .col(boolean(ActionItem::Archived).not_null().default(false))
                    .col(string_len(ActionItem::TeamId, 255).not_null())
                    .col(
                        timestamp_with_time_zone(ActionItem::DateCreated)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_action_items_team_id")
                            .from(ActionItem::Table, ActionItem::TeamId)
                            .to(Team::Table, Team::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_action_items_team_id")
                    .table(ActionItem::Table)
                    .col(ActionItem::TeamId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 7. feedback
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Feedback::Table)
                    .if_not_exists()
                    .col(pk_auto(Feedback::Id))
                    .col(integer(Feedback::Stars).not_null().default(0))
                    .col(text(Feedback::Comments).not_null())
                    .col(string_len_null(Feedback::UserEmail, 255))
                    .col(string_len_null(Feedback::TeamId, 255))
                    .col(
                        timestamp_with_time_zone(Feedback::DateCreated)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feedback_team_id")
                            .from(Feedback::Table, Feedback::TeamId)
                            .to(Team::Table, Team::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Feedback::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ActionItem::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Thought::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Board::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ColumnDefinition::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserTeam::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Team::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Team {
    #[sea_orm(iden = "teams")]
    Table,
    Id,
    Name,
    PasswordHash,
    DateCreated,
    FailedLoginAttempts,
}

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Name,
    PasswordHash,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserTeam {
    #[sea_orm(iden = "user_teams")]
    Table,
    UserId,
    TeamId,
    JoinedAt,
}

#[derive(DeriveIden)]
enum ColumnDefinition {
    #[sea_orm(iden = "column_definitions")]
    Table,
    Id,
    TeamId,
    Topic,
    Title,
}

#[derive(DeriveIden)]
enum Board {
    #[sea_orm(iden = "boards")]
    Table,
    Id,
    TeamId,
    DateCreated,
}

#[derive(DeriveIden)]
enum Thought {
    #[sea_orm(iden = "thoughts")]
    Table,
    Id,
    Message,
    Hearts,
    Topic,
    Discussed,
    TeamId,
    ColumnDefinitionId,
    BoardId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ActionItem {
    #[sea_orm(iden = "action_items")]
    Table,
    Id,
    Task,
    Completed,
    Assignee,
    Archived,
    TeamId,
    DateCreated,
}

#[derive(DeriveIden)]
enum Feedback {
    #[sea_orm(iden = "feedback")]
    Table,
    Id,
    Stars,
    Comments,
    UserEmail,
    TeamId,
    DateCreated,
}
