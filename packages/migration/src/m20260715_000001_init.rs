use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

#[derive(DeriveMigrationName)]
pub struct Migration;

// ----- Iden enums for tables & columns -----
#[derive(Iden)]
enum Players {
    Table,
    Id,
    ExternalId,
    DisplayName,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Matches {
    Table,
    Id,
    GameMode,
    State,
    OwnerId,
    SubmitterId,
    PositiveVotes,
    ResubmitCount,
    FailReason,
    PollRef,
    FormedNoticeRef,
    SubmitNoticeRef,
    CreatedAt,
    UpdatedAt,
    FinishedAt,
}

#[derive(Iden)]
enum Participants {
    Table,
    Id,
    MatchId,
    PlayerId,
    CandidatePlace,
    ConfirmedPlace,
    LeaderId,
    ClaimMsgRef,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ScheduledTasks {
    Table,
    Id,
    TaskType,
    EntityId,
    Status,
    DueAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum AppSettings {
    Table,
    Key,
    Value,
    UpdatedAt,
}

// Match state, game mode, task type/status and fail reason are stored as
// plain strings so the schema stays portable between Postgres and the
// SQLite databases used in tests. Value sets are enforced by the entity
// layer's ActiveEnum derives.

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // players
        manager
            .create_table(
                Table::create()
                    .table(Players::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Players::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(Players::ExternalId).string().not_null())
                    .col(ColumnDef::new(Players::DisplayName).string().not_null())
                    .col(
                        ColumnDef::new(Players::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Players::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_players_external_id")
                    .table(Players::Table)
                    .col(Players::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // matches
        manager
            .create_table(
                Table::create()
                    .table(Matches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Matches::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(Matches::GameMode).string().not_null())
                    .col(ColumnDef::new(Matches::State).string().not_null())
                    .col(ColumnDef::new(Matches::OwnerId).big_integer().null())
                    .col(ColumnDef::new(Matches::SubmitterId).big_integer().null())
                    .col(
                        ColumnDef::new(Matches::PositiveVotes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Matches::ResubmitCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Matches::FailReason).string().null())
                    .col(ColumnDef::new(Matches::PollRef).string().null())
                    .col(ColumnDef::new(Matches::FormedNoticeRef).string().null())
                    .col(ColumnDef::new(Matches::SubmitNoticeRef).string().null())
                    .col(
                        ColumnDef::new(Matches::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Matches::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Matches::FinishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_matches_owner_id")
                            .from(Matches::Table, Matches::OwnerId)
                            .to(Players::Table, Players::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_matches_submitter_id")
                            .from(Matches::Table, Matches::SubmitterId)
                            .to(Players::Table, Players::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Expiration sweep scans NEW matches by age
        manager
            .create_index(
                Index::create()
                    .name("ix_matches_state_created_at")
                    .table(Matches::Table)
                    .col(Matches::State)
                    .col(Matches::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // participants
        manager
            .create_table(
                Table::create()
                    .table(Participants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Participants::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(
                        ColumnDef::new(Participants::MatchId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participants::PlayerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participants::CandidatePlace)
                            .small_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Participants::ConfirmedPlace)
                            .small_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(Participants::LeaderId).big_integer().null())
                    .col(ColumnDef::new(Participants::ClaimMsgRef).string().null())
                    .col(
                        ColumnDef::new(Participants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participants::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_participants_match_id")
                            .from(Participants::Table, Participants::MatchId)
                            .to(Matches::Table, Matches::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_participants_player_id")
                            .from(Participants::Table, Participants::PlayerId)
                            .to(Players::Table, Players::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One membership per player per match
        manager
            .create_index(
                Index::create()
                    .name("ux_participants_match_player")
                    .table(Participants::Table)
                    .col(Participants::MatchId)
                    .col(Participants::PlayerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // scheduled_tasks
        manager
            .create_table(
                Table::create()
                    .table(ScheduledTasks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScheduledTasks::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(
                        ColumnDef::new(ScheduledTasks::TaskType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledTasks::EntityId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ScheduledTasks::Status).string().not_null())
                    .col(
                        ColumnDef::new(ScheduledTasks::DueAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledTasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledTasks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per (task_type, entity_id); rescheduling updates in place
        manager
            .create_index(
                Index::create()
                    .name("ux_scheduled_tasks_type_entity")
                    .table(ScheduledTasks::Table)
                    .col(ScheduledTasks::TaskType)
                    .col(ScheduledTasks::EntityId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Startup recovery loads by status
        manager
            .create_index(
                Index::create()
                    .name("ix_scheduled_tasks_status")
                    .table(ScheduledTasks::Table)
                    .col(ScheduledTasks::Status)
                    .to_owned(),
            )
            .await?;

        // app_settings
        manager
            .create_table(
                Table::create()
                    .table(AppSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AppSettings::Key)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AppSettings::Value).string().not_null())
                    .col(
                        ColumnDef::new(AppSettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AppSettings::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(ScheduledTasks::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(Participants::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Matches::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Players::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
