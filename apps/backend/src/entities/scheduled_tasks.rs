use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum TaskType {
    /// Debounced "match formed" notice after the vote count reaches quorum.
    #[sea_orm(string_value = "MATCH_FORMED")]
    MatchFormed,
    /// Safety net for a stalled submission flow.
    #[sea_orm(string_value = "SUBMIT_TIMEOUT")]
    SubmitTimeout,
    /// Dispute grace window before a submitted result is committed.
    #[sea_orm(string_value = "SUBMIT_ACCEPT_TIMEOUT")]
    SubmitAcceptTimeout,
    /// One-shot "process shutting down" marker; meaningless after restart.
    #[sea_orm(string_value = "SHUTDOWN_NOTICE")]
    ShutdownNotice,
}

impl TaskType {
    /// One-shot markers are finished (not re-armed) by startup recovery.
    pub fn is_one_shot_marker(&self) -> bool {
        matches!(self, TaskType::ShutdownNotice)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum TaskStatus {
    #[sea_orm(string_value = "SCHEDULED")]
    Scheduled,
    #[sea_orm(string_value = "RUNNING")]
    Running,
    #[sea_orm(string_value = "FINISHED")]
    Finished,
    #[sea_orm(string_value = "FAILED")]
    Failed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "scheduled_tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_name = "task_type")]
    pub task_type: TaskType,
    #[sea_orm(column_name = "entity_id")]
    pub entity_id: i64,
    pub status: TaskStatus,
    #[sea_orm(column_name = "due_at")]
    pub due_at: OffsetDateTime,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
