//! SeaORM adapter for the persisted task store.
//!
//! One row per (task_type, entity_id); rescheduling updates the row in
//! place. Status transitions on firing are compare-and-set updates so a
//! late timer or a racing cancel can never run a handler twice.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, Set,
};
use time::OffsetDateTime;

use crate::entities::scheduled_tasks;
use crate::entities::scheduled_tasks::{TaskStatus, TaskType};

pub async fn find_by_key<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    task_type: TaskType,
    entity_id: i64,
) -> Result<Option<scheduled_tasks::Model>, sea_orm::DbErr> {
    scheduled_tasks::Entity::find()
        .filter(scheduled_tasks::Column::TaskType.eq(task_type))
        .filter(scheduled_tasks::Column::EntityId.eq(entity_id))
        .one(conn)
        .await
}

pub async fn require_by_key<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    task_type: TaskType,
    entity_id: i64,
) -> Result<scheduled_tasks::Model, sea_orm::DbErr> {
    find_by_key(conn, task_type, entity_id)
        .await?
        .ok_or_else(|| sea_orm::DbErr::RecordNotFound("Scheduled task not found".to_string()))
}

/// Upsert the row for (task_type, entity_id): status back to SCHEDULED with
/// the new due time whether the key is new or already present.
pub async fn upsert_scheduled<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    task_type: TaskType,
    entity_id: i64,
    due_at: OffsetDateTime,
) -> Result<scheduled_tasks::Model, sea_orm::DbErr> {
    let now = OffsetDateTime::now_utc();
    let active = scheduled_tasks::ActiveModel {
        id: NotSet,
        task_type: Set(task_type),
        entity_id: Set(entity_id),
        status: Set(TaskStatus::Scheduled),
        due_at: Set(due_at),
        created_at: Set(now),
        updated_at: Set(now),
    };

    scheduled_tasks::Entity::insert(active)
        .on_conflict(
            OnConflict::columns([
                scheduled_tasks::Column::TaskType,
                scheduled_tasks::Column::EntityId,
            ])
            .update_columns([
                scheduled_tasks::Column::Status,
                scheduled_tasks::Column::DueAt,
                scheduled_tasks::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec(conn)
        .await?;

    require_by_key(conn, task_type, entity_id).await
}

/// Compare-and-set SCHEDULED → RUNNING. Returns false when the row was
/// already cancelled, picked up by another firing, or removed.
pub async fn mark_running<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    task_type: TaskType,
    entity_id: i64,
) -> Result<bool, sea_orm::DbErr> {
    let result = scheduled_tasks::Entity::update_many()
        .col_expr(
            scheduled_tasks::Column::Status,
            sea_orm::sea_query::Expr::value(TaskStatus::Running),
        )
        .col_expr(
            scheduled_tasks::Column::UpdatedAt,
            sea_orm::sea_query::Expr::value(OffsetDateTime::now_utc()),
        )
        .filter(scheduled_tasks::Column::TaskType.eq(task_type))
        .filter(scheduled_tasks::Column::EntityId.eq(entity_id))
        .filter(scheduled_tasks::Column::Status.eq(TaskStatus::Scheduled))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Terminal transition from RUNNING after the handler returns.
pub async fn mark_done<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    task_type: TaskType,
    entity_id: i64,
    status: TaskStatus,
) -> Result<(), sea_orm::DbErr> {
    scheduled_tasks::Entity::update_many()
        .col_expr(
            scheduled_tasks::Column::Status,
            sea_orm::sea_query::Expr::value(status),
        )
        .col_expr(
            scheduled_tasks::Column::UpdatedAt,
            sea_orm::sea_query::Expr::value(OffsetDateTime::now_utc()),
        )
        .filter(scheduled_tasks::Column::TaskType.eq(task_type))
        .filter(scheduled_tasks::Column::EntityId.eq(entity_id))
        .filter(scheduled_tasks::Column::Status.eq(TaskStatus::Running))
        .exec(conn)
        .await?;
    Ok(())
}

/// Cancel if still SCHEDULED. Returns false when the task already fired or
/// finished; callers treat that as a no-op.
pub async fn cancel<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    task_type: TaskType,
    entity_id: i64,
) -> Result<bool, sea_orm::DbErr> {
    let result = scheduled_tasks::Entity::update_many()
        .col_expr(
            scheduled_tasks::Column::Status,
            sea_orm::sea_query::Expr::value(TaskStatus::Cancelled),
        )
        .col_expr(
            scheduled_tasks::Column::UpdatedAt,
            sea_orm::sea_query::Expr::value(OffsetDateTime::now_utc()),
        )
        .filter(scheduled_tasks::Column::TaskType.eq(task_type))
        .filter(scheduled_tasks::Column::EntityId.eq(entity_id))
        .filter(scheduled_tasks::Column::Status.eq(TaskStatus::Scheduled))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Rows startup recovery must consider.
pub async fn find_active<C: ConnectionTrait + Send + Sync>(
    conn: &C,
) -> Result<Vec<scheduled_tasks::Model>, sea_orm::DbErr> {
    scheduled_tasks::Entity::find()
        .filter(
            scheduled_tasks::Column::Status
                .is_in([TaskStatus::Scheduled, TaskStatus::Running]),
        )
        .all(conn)
        .await
}

/// Recovery re-arm: back to SCHEDULED with a (possibly deferred) due time.
pub async fn rearm<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    task_type: TaskType,
    entity_id: i64,
    due_at: OffsetDateTime,
) -> Result<scheduled_tasks::Model, sea_orm::DbErr> {
    let model = require_by_key(conn, task_type, entity_id).await?;
    let mut active: scheduled_tasks::ActiveModel = model.into();
    active.status = Set(TaskStatus::Scheduled);
    active.due_at = Set(due_at);
    active.updated_at = Set(OffsetDateTime::now_utc());
    active.update(conn).await
}

/// Recovery path for one-shot markers: finish without executing.
pub async fn mark_finished_unexecuted<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    task_type: TaskType,
    entity_id: i64,
) -> Result<(), sea_orm::DbErr> {
    let model = require_by_key(conn, task_type, entity_id).await?;
    let mut active: scheduled_tasks::ActiveModel = model.into();
    active.status = Set(TaskStatus::Finished);
    active.updated_at = Set(OffsetDateTime::now_utc());
    active.update(conn).await?;
    Ok(())
}
