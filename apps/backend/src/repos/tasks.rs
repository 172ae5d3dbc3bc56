//! Persisted task store, the durable half of the scheduler.
//!
//! Services write task rows inside the same transaction as the mutation
//! they guard, so a claim and its safety-net timer commit or fail together.

use sea_orm::ConnectionTrait;
use time::OffsetDateTime;

use crate::adapters::tasks_sea as tasks_adapter;
use crate::entities::scheduled_tasks;
use crate::entities::scheduled_tasks::{TaskStatus, TaskType};
use crate::errors::domain::DomainError;

/// Composite scheduler key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub task_type: TaskType,
    pub entity_id: i64,
}

impl TaskKey {
    pub fn new(task_type: TaskType, entity_id: i64) -> Self {
        Self {
            task_type,
            entity_id,
        }
    }
}

impl std::fmt::Display for TaskKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}/{}", self.task_type, self.entity_id)
    }
}

/// Scheduled task domain model.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTask {
    pub id: i64,
    pub task_type: TaskType,
    pub entity_id: i64,
    pub status: TaskStatus,
    pub due_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

impl ScheduledTask {
    pub fn key(&self) -> TaskKey {
        TaskKey::new(self.task_type, self.entity_id)
    }
}

impl From<scheduled_tasks::Model> for ScheduledTask {
    fn from(t: scheduled_tasks::Model) -> Self {
        Self {
            id: t.id,
            task_type: t.task_type,
            entity_id: t.entity_id,
            status: t.status,
            due_at: t.due_at,
            created_at: t.created_at,
        }
    }
}

pub async fn find_by_key<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    key: TaskKey,
) -> Result<Option<ScheduledTask>, DomainError> {
    let t = tasks_adapter::find_by_key(conn, key.task_type, key.entity_id).await?;
    Ok(t.map(ScheduledTask::from))
}

/// Upsert the single row for `key` back to SCHEDULED at `due_at`.
pub async fn schedule<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    key: TaskKey,
    due_at: OffsetDateTime,
) -> Result<ScheduledTask, DomainError> {
    let t = tasks_adapter::upsert_scheduled(conn, key.task_type, key.entity_id, due_at).await?;
    Ok(ScheduledTask::from(t))
}

/// Mark CANCELLED if the task has not fired yet. Returns whether the row
/// was actually cancelled; `false` is a benign race, not an error.
pub async fn cancel<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    key: TaskKey,
) -> Result<bool, DomainError> {
    Ok(tasks_adapter::cancel(conn, key.task_type, key.entity_id).await?)
}

/// Compare-and-set SCHEDULED → RUNNING at fire time.
pub async fn mark_running<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    key: TaskKey,
) -> Result<bool, DomainError> {
    Ok(tasks_adapter::mark_running(conn, key.task_type, key.entity_id).await?)
}

pub async fn mark_done<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    key: TaskKey,
    status: TaskStatus,
) -> Result<(), DomainError> {
    Ok(tasks_adapter::mark_done(conn, key.task_type, key.entity_id, status).await?)
}

pub async fn find_active<C: ConnectionTrait + Send + Sync>(
    conn: &C,
) -> Result<Vec<ScheduledTask>, DomainError> {
    let models = tasks_adapter::find_active(conn).await?;
    Ok(models.into_iter().map(ScheduledTask::from).collect())
}

pub async fn rearm<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    key: TaskKey,
    due_at: OffsetDateTime,
) -> Result<ScheduledTask, DomainError> {
    let t = tasks_adapter::rearm(conn, key.task_type, key.entity_id, due_at).await?;
    Ok(ScheduledTask::from(t))
}

pub async fn mark_finished_unexecuted<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    key: TaskKey,
) -> Result<(), DomainError> {
    Ok(tasks_adapter::mark_finished_unexecuted(conn, key.task_type, key.entity_id).await?)
}
