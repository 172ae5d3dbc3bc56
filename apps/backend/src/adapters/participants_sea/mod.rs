//! SeaORM adapter for participant rows.
//!
//! Participants are only ever reached through their match; every function
//! here is keyed by match id or by a participant id the caller already
//! loaded through the match.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use time::OffsetDateTime;

use crate::entities::participants;

pub mod dto;

pub use dto::ParticipantCreate;

pub async fn create<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: ParticipantCreate,
) -> Result<participants::Model, sea_orm::DbErr> {
    let now = OffsetDateTime::now_utc();
    let active = participants::ActiveModel {
        id: NotSet,
        match_id: Set(dto.match_id),
        player_id: Set(dto.player_id),
        candidate_place: NotSet,
        confirmed_place: NotSet,
        leader_id: NotSet,
        claim_msg_ref: NotSet,
        created_at: Set(now),
        updated_at: Set(now),
    };
    active.insert(conn).await
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    participant_id: i64,
) -> Result<Option<participants::Model>, sea_orm::DbErr> {
    participants::Entity::find_by_id(participant_id).one(conn).await
}

/// All participants of a match, in join order.
pub async fn find_by_match<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<Vec<participants::Model>, sea_orm::DbErr> {
    participants::Entity::find()
        .filter(participants::Column::MatchId.eq(match_id))
        .order_by_asc(participants::Column::Id)
        .all(conn)
        .await
}

pub async fn find_by_match_and_player<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    player_id: i64,
) -> Result<Option<participants::Model>, sea_orm::DbErr> {
    participants::Entity::find()
        .filter(participants::Column::MatchId.eq(match_id))
        .filter(participants::Column::PlayerId.eq(player_id))
        .one(conn)
        .await
}

pub async fn count_by_match<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<u64, sea_orm::DbErr> {
    participants::Entity::find()
        .filter(participants::Column::MatchId.eq(match_id))
        .count(conn)
        .await
}

/// Number of participants holding a candidate place.
pub async fn count_claimed<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<u64, sea_orm::DbErr> {
    participants::Entity::find()
        .filter(participants::Column::MatchId.eq(match_id))
        .filter(participants::Column::CandidatePlace.is_not_null())
        .count(conn)
        .await
}

async fn touch_update<C, F>(
    conn: &C,
    participant_id: i64,
    configure: F,
) -> Result<participants::Model, sea_orm::DbErr>
where
    C: ConnectionTrait + Send + Sync,
    F: FnOnce(&mut participants::ActiveModel),
{
    let model = find_by_id(conn, participant_id)
        .await?
        .ok_or_else(|| sea_orm::DbErr::RecordNotFound("Participant not found".to_string()))?;
    let mut active: participants::ActiveModel = model.into();
    configure(&mut active);
    active.updated_at = Set(OffsetDateTime::now_utc());
    active.update(conn).await
}

pub async fn set_candidate_place<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    participant_id: i64,
    place: i16,
) -> Result<participants::Model, sea_orm::DbErr> {
    touch_update(conn, participant_id, |p| {
        p.candidate_place = Set(Some(place));
    })
    .await
}

pub async fn set_leader<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    participant_id: i64,
    leader_id: i64,
) -> Result<participants::Model, sea_orm::DbErr> {
    touch_update(conn, participant_id, |p| {
        p.leader_id = Set(Some(leader_id));
    })
    .await
}

pub async fn set_claim_msg_ref<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    participant_id: i64,
    claim_msg_ref: Option<String>,
) -> Result<participants::Model, sea_orm::DbErr> {
    touch_update(conn, participant_id, |p| {
        p.claim_msg_ref = Set(claim_msg_ref);
    })
    .await
}

/// Copy candidate places into confirmed places for the whole match.
pub async fn confirm_places<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<u64, sea_orm::DbErr> {
    let result = participants::Entity::update_many()
        .col_expr(
            participants::Column::ConfirmedPlace,
            Expr::col(participants::Column::CandidatePlace).into(),
        )
        .col_expr(
            participants::Column::UpdatedAt,
            Expr::val(OffsetDateTime::now_utc()).into(),
        )
        .filter(participants::Column::MatchId.eq(match_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Reset every claim field for the whole match (resubmission).
pub async fn clear_claims<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<u64, sea_orm::DbErr> {
    let result = participants::Entity::update_many()
        .col_expr(
            participants::Column::CandidatePlace,
            Expr::value(Option::<i16>::None),
        )
        .col_expr(
            participants::Column::ConfirmedPlace,
            Expr::value(Option::<i16>::None),
        )
        .col_expr(
            participants::Column::LeaderId,
            Expr::value(Option::<i64>::None),
        )
        .col_expr(
            participants::Column::ClaimMsgRef,
            Expr::value(Option::<String>::None),
        )
        .col_expr(
            participants::Column::UpdatedAt,
            Expr::val(OffsetDateTime::now_utc()).into(),
        )
        .filter(participants::Column::MatchId.eq(match_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

pub async fn delete<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    participant_id: i64,
) -> Result<(), sea_orm::DbErr> {
    participants::Entity::delete_by_id(participant_id)
        .exec(conn)
        .await?;
    Ok(())
}

/// Remove every participant of a match (pre-formation cancellation only).
pub async fn delete_by_match<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<u64, sea_orm::DbErr> {
    let result = participants::Entity::delete_many()
        .filter(participants::Column::MatchId.eq(match_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
