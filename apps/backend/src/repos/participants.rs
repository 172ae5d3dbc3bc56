//! Participant repository functions for the domain layer.

use sea_orm::ConnectionTrait;

use crate::adapters::participants_sea as participants_adapter;
use crate::entities::participants;
use crate::errors::domain::{DomainError, NotFoundKind};

pub use participants_adapter::ParticipantCreate;

/// Participant domain model: one player's membership in one match, carrying
/// its place and leader claims.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: i64,
    pub match_id: i64,
    pub player_id: i64,
    pub candidate_place: Option<i16>,
    pub confirmed_place: Option<i16>,
    pub leader_id: Option<i64>,
    pub claim_msg_ref: Option<String>,
}

impl From<participants::Model> for Participant {
    fn from(p: participants::Model) -> Self {
        Self {
            id: p.id,
            match_id: p.match_id,
            player_id: p.player_id,
            candidate_place: p.candidate_place,
            confirmed_place: p.confirmed_place,
            leader_id: p.leader_id,
            claim_msg_ref: p.claim_msg_ref,
        }
    }
}

fn map_not_found(e: sea_orm::DbErr) -> DomainError {
    match e {
        sea_orm::DbErr::RecordNotFound(d) => DomainError::not_found(NotFoundKind::Participant, d),
        other => other.into(),
    }
}

pub async fn create<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    player_id: i64,
) -> Result<Participant, DomainError> {
    let p = participants_adapter::create(conn, ParticipantCreate::new(match_id, player_id)).await?;
    Ok(Participant::from(p))
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    participant_id: i64,
) -> Result<Option<Participant>, DomainError> {
    let p = participants_adapter::find_by_id(conn, participant_id).await?;
    Ok(p.map(Participant::from))
}

pub async fn require<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    participant_id: i64,
) -> Result<Participant, DomainError> {
    find_by_id(conn, participant_id).await?.ok_or_else(|| {
        DomainError::not_found(
            NotFoundKind::Participant,
            format!("Participant {participant_id} not found"),
        )
    })
}

/// The match's participants in join order; the aggregate's ordered slice.
pub async fn find_by_match<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<Vec<Participant>, DomainError> {
    let models = participants_adapter::find_by_match(conn, match_id).await?;
    Ok(models.into_iter().map(Participant::from).collect())
}

pub async fn find_by_match_and_player<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    player_id: i64,
) -> Result<Option<Participant>, DomainError> {
    let p = participants_adapter::find_by_match_and_player(conn, match_id, player_id).await?;
    Ok(p.map(Participant::from))
}

pub async fn count_by_match<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<u64, DomainError> {
    Ok(participants_adapter::count_by_match(conn, match_id).await?)
}

pub async fn count_claimed<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<u64, DomainError> {
    Ok(participants_adapter::count_claimed(conn, match_id).await?)
}

pub async fn set_candidate_place<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    participant_id: i64,
    place: i16,
) -> Result<Participant, DomainError> {
    participants_adapter::set_candidate_place(conn, participant_id, place)
        .await
        .map(Participant::from)
        .map_err(map_not_found)
}

pub async fn set_leader<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    participant_id: i64,
    leader_id: i64,
) -> Result<Participant, DomainError> {
    participants_adapter::set_leader(conn, participant_id, leader_id)
        .await
        .map(Participant::from)
        .map_err(map_not_found)
}

pub async fn set_claim_msg_ref<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    participant_id: i64,
    claim_msg_ref: Option<String>,
) -> Result<Participant, DomainError> {
    participants_adapter::set_claim_msg_ref(conn, participant_id, claim_msg_ref)
        .await
        .map(Participant::from)
        .map_err(map_not_found)
}

pub async fn confirm_places<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<u64, DomainError> {
    Ok(participants_adapter::confirm_places(conn, match_id).await?)
}

pub async fn clear_claims<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<u64, DomainError> {
    Ok(participants_adapter::clear_claims(conn, match_id).await?)
}

pub async fn delete<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    participant_id: i64,
) -> Result<(), DomainError> {
    Ok(participants_adapter::delete(conn, participant_id).await?)
}

pub async fn delete_by_match<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<u64, DomainError> {
    Ok(participants_adapter::delete_by_match(conn, match_id).await?)
}
