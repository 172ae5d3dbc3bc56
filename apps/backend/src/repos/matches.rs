//! Match repository functions for the domain layer.

use sea_orm::ConnectionTrait;
use time::OffsetDateTime;

use crate::adapters::matches_sea as matches_adapter;
use crate::entities::matches;
use crate::entities::matches::{FailReason, GameMode, MatchState};
use crate::errors::domain::{DomainError, NotFoundKind};

pub use matches_adapter::MatchCreate;

/// Match domain model
///
/// The aggregate root for one coordinated session. Participants are loaded
/// separately through `repos::participants` and only through their match.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub id: i64,
    pub game_mode: GameMode,
    pub state: MatchState,
    pub owner_id: Option<i64>,
    pub submitter_id: Option<i64>,
    pub positive_votes: i32,
    pub resubmit_count: i32,
    pub fail_reason: Option<FailReason>,
    pub poll_ref: Option<String>,
    pub formed_notice_ref: Option<String>,
    pub submit_notice_ref: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub finished_at: Option<OffsetDateTime>,
}

impl From<matches::Model> for Match {
    fn from(m: matches::Model) -> Self {
        Self {
            id: m.id,
            game_mode: m.game_mode,
            state: m.state,
            owner_id: m.owner_id,
            submitter_id: m.submitter_id,
            positive_votes: m.positive_votes,
            resubmit_count: m.resubmit_count,
            fail_reason: m.fail_reason,
            poll_ref: m.poll_ref,
            formed_notice_ref: m.formed_notice_ref,
            submit_notice_ref: m.submit_notice_ref,
            created_at: m.created_at,
            updated_at: m.updated_at,
            finished_at: m.finished_at,
        }
    }
}

fn map_not_found(e: sea_orm::DbErr) -> DomainError {
    match e {
        sea_orm::DbErr::RecordNotFound(d) => DomainError::not_found(NotFoundKind::Match, d),
        other => other.into(),
    }
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<Option<Match>, DomainError> {
    let m = matches_adapter::find_by_id(conn, match_id).await?;
    Ok(m.map(Match::from))
}

pub async fn require_match<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<Match, DomainError> {
    matches_adapter::require_match(conn, match_id)
        .await
        .map(Match::from)
        .map_err(map_not_found)
}

/// Load the match under the per-match serialization lock. Every mutating
/// operation on the aggregate starts here.
pub async fn require_match_for_update<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<Match, DomainError> {
    matches_adapter::require_match_for_update(conn, match_id)
        .await
        .map(Match::from)
        .map_err(map_not_found)
}

pub async fn create_match<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: MatchCreate,
) -> Result<Match, DomainError> {
    let m = matches_adapter::create_match(conn, dto).await?;
    Ok(Match::from(m))
}

pub async fn update_state<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    state: MatchState,
) -> Result<Match, DomainError> {
    matches_adapter::update_state(conn, match_id, state)
        .await
        .map(Match::from)
        .map_err(map_not_found)
}

pub async fn set_failed<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    reason: FailReason,
) -> Result<Match, DomainError> {
    matches_adapter::set_failed(conn, match_id, reason)
        .await
        .map(Match::from)
        .map_err(map_not_found)
}

pub async fn set_finished<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    finished_at: OffsetDateTime,
) -> Result<Match, DomainError> {
    matches_adapter::set_finished(conn, match_id, finished_at)
        .await
        .map(Match::from)
        .map_err(map_not_found)
}

pub async fn update_votes<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    positive_votes: i32,
) -> Result<Match, DomainError> {
    matches_adapter::update_votes(conn, match_id, positive_votes)
        .await
        .map(Match::from)
        .map_err(map_not_found)
}

pub async fn set_submitter<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    submitter_id: Option<i64>,
) -> Result<Match, DomainError> {
    matches_adapter::set_submitter(conn, match_id, submitter_id)
        .await
        .map(Match::from)
        .map_err(map_not_found)
}

/// One-shot resubmission bump: count, submitter and state together.
pub async fn set_resubmit<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    resubmit_count: i32,
    submitter_id: Option<i64>,
) -> Result<Match, DomainError> {
    matches_adapter::set_resubmit(conn, match_id, resubmit_count, submitter_id)
        .await
        .map(Match::from)
        .map_err(map_not_found)
}

pub async fn set_poll_ref<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    poll_ref: Option<String>,
) -> Result<Match, DomainError> {
    matches_adapter::set_poll_ref(conn, match_id, poll_ref)
        .await
        .map(Match::from)
        .map_err(map_not_found)
}

pub async fn set_formed_notice_ref<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    formed_notice_ref: Option<String>,
) -> Result<Match, DomainError> {
    matches_adapter::set_formed_notice_ref(conn, match_id, formed_notice_ref)
        .await
        .map(Match::from)
        .map_err(map_not_found)
}

pub async fn set_submit_notice_ref<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    submit_notice_ref: Option<String>,
) -> Result<Match, DomainError> {
    matches_adapter::set_submit_notice_ref(conn, match_id, submit_notice_ref)
        .await
        .map(Match::from)
        .map_err(map_not_found)
}

pub async fn find_expiration_candidates<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    cutoff: OffsetDateTime,
    limit: u64,
) -> Result<Vec<Match>, DomainError> {
    let models = matches_adapter::find_expiration_candidates(conn, cutoff, limit).await?;
    Ok(models.into_iter().map(Match::from).collect())
}
