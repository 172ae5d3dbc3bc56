//! SeaORM adapter for the match aggregate root.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, EntityTrait, NotSet,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use time::OffsetDateTime;

use crate::entities::matches;
use crate::entities::matches::{FailReason, MatchState};

pub mod dto;

pub use dto::MatchCreate;

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<Option<matches::Model>, sea_orm::DbErr> {
    matches::Entity::find()
        .filter(matches::Column::Id.eq(match_id))
        .one(conn)
        .await
}

/// Find match by ID or return RecordNotFound error.
pub async fn require_match<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<matches::Model, sea_orm::DbErr> {
    find_by_id(conn, match_id)
        .await?
        .ok_or_else(|| sea_orm::DbErr::RecordNotFound("Match not found".to_string()))
}

/// Load the match row with an exclusive row lock, serializing every
/// vote/claim/resubmit operation on the same match.
///
/// SQLite has no `FOR UPDATE`; its single-writer connection already
/// serializes the transaction, so the lock clause is only added on Postgres.
pub async fn require_match_for_update<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<matches::Model, sea_orm::DbErr> {
    let mut query = matches::Entity::find().filter(matches::Column::Id.eq(match_id));
    if conn.get_database_backend() == DatabaseBackend::Postgres {
        query = query.lock_exclusive();
    }
    query
        .one(conn)
        .await?
        .ok_or_else(|| sea_orm::DbErr::RecordNotFound("Match not found".to_string()))
}

pub async fn create_match<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: MatchCreate,
) -> Result<matches::Model, sea_orm::DbErr> {
    let now = OffsetDateTime::now_utc();
    let match_active = matches::ActiveModel {
        id: NotSet,
        game_mode: Set(dto.game_mode),
        state: Set(MatchState::New),
        owner_id: Set(dto.owner_id),
        submitter_id: NotSet,
        positive_votes: Set(0),
        resubmit_count: Set(0),
        fail_reason: NotSet,
        poll_ref: Set(dto.poll_ref),
        formed_notice_ref: NotSet,
        submit_notice_ref: NotSet,
        created_at: Set(now),
        updated_at: Set(now),
        finished_at: NotSet,
    };

    match_active.insert(conn).await
}

/// Helper: apply a targeted update to a loaded match row, bumping
/// `updated_at`. The caller provides a closure that sets the columns that
/// change; everything else stays untouched.
async fn touch_update<C, F>(
    conn: &C,
    match_id: i64,
    configure: F,
) -> Result<matches::Model, sea_orm::DbErr>
where
    C: ConnectionTrait + Send + Sync,
    F: FnOnce(&mut matches::ActiveModel),
{
    let model = require_match(conn, match_id).await?;
    let mut active: matches::ActiveModel = model.into();
    configure(&mut active);
    active.updated_at = Set(OffsetDateTime::now_utc());
    active.update(conn).await
}

pub async fn update_state<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    state: MatchState,
) -> Result<matches::Model, sea_orm::DbErr> {
    touch_update(conn, match_id, |m| {
        m.state = Set(state);
    })
    .await
}

pub async fn set_failed<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    reason: FailReason,
) -> Result<matches::Model, sea_orm::DbErr> {
    touch_update(conn, match_id, |m| {
        m.state = Set(MatchState::Failed);
        m.fail_reason = Set(Some(reason));
    })
    .await
}

pub async fn set_finished<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    finished_at: OffsetDateTime,
) -> Result<matches::Model, sea_orm::DbErr> {
    touch_update(conn, match_id, |m| {
        m.state = Set(MatchState::Finished);
        m.finished_at = Set(Some(finished_at));
    })
    .await
}

pub async fn update_votes<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    positive_votes: i32,
) -> Result<matches::Model, sea_orm::DbErr> {
    touch_update(conn, match_id, |m| {
        m.positive_votes = Set(positive_votes);
    })
    .await
}

pub async fn set_submitter<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    submitter_id: Option<i64>,
) -> Result<matches::Model, sea_orm::DbErr> {
    touch_update(conn, match_id, |m| {
        m.submitter_id = Set(submitter_id);
    })
    .await
}

pub async fn set_resubmit<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    resubmit_count: i32,
    submitter_id: Option<i64>,
) -> Result<matches::Model, sea_orm::DbErr> {
    touch_update(conn, match_id, |m| {
        m.resubmit_count = Set(resubmit_count);
        m.submitter_id = Set(submitter_id);
        m.state = Set(MatchState::OnSubmit);
    })
    .await
}

pub async fn set_poll_ref<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    poll_ref: Option<String>,
) -> Result<matches::Model, sea_orm::DbErr> {
    touch_update(conn, match_id, |m| {
        m.poll_ref = Set(poll_ref);
    })
    .await
}

pub async fn set_formed_notice_ref<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    formed_notice_ref: Option<String>,
) -> Result<matches::Model, sea_orm::DbErr> {
    touch_update(conn, match_id, |m| {
        m.formed_notice_ref = Set(formed_notice_ref);
    })
    .await
}

pub async fn set_submit_notice_ref<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    submit_notice_ref: Option<String>,
) -> Result<matches::Model, sea_orm::DbErr> {
    touch_update(conn, match_id, |m| {
        m.submit_notice_ref = Set(submit_notice_ref);
    })
    .await
}

/// NEW matches created before `cutoff`, candidates for the expiration sweep.
pub async fn find_expiration_candidates<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    cutoff: OffsetDateTime,
    limit: u64,
) -> Result<Vec<matches::Model>, sea_orm::DbErr> {
    matches::Entity::find()
        .filter(matches::Column::State.eq(MatchState::New))
        .filter(matches::Column::CreatedAt.lt(cutoff))
        .order_by_asc(matches::Column::CreatedAt)
        .limit(limit)
        .all(conn)
        .await
}
