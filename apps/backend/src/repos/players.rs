//! Player directory lookups for the domain layer.

use sea_orm::ConnectionTrait;

use crate::adapters::players_sea as players_adapter;
use crate::entities::players;
use crate::errors::domain::{DomainError, NotFoundKind};

/// Player domain model (directory entry).
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: i64,
    pub external_id: String,
    pub display_name: String,
}

impl From<players::Model> for Player {
    fn from(p: players::Model) -> Self {
        Self {
            id: p.id,
            external_id: p.external_id,
            display_name: p.display_name,
        }
    }
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    player_id: i64,
) -> Result<Option<Player>, DomainError> {
    let p = players_adapter::find_by_id(conn, player_id).await?;
    Ok(p.map(Player::from))
}

pub async fn require<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    player_id: i64,
) -> Result<Player, DomainError> {
    find_by_id(conn, player_id).await?.ok_or_else(|| {
        DomainError::not_found(NotFoundKind::Player, format!("Player {player_id} not found"))
    })
}

pub async fn find_by_external_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    external_id: &str,
) -> Result<Option<Player>, DomainError> {
    let p = players_adapter::find_by_external_id(conn, external_id).await?;
    Ok(p.map(Player::from))
}

/// Resolve a chat identity to a directory entry or fail the request.
pub async fn require_by_external_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    external_id: &str,
) -> Result<Player, DomainError> {
    find_by_external_id(conn, external_id).await?.ok_or_else(|| {
        DomainError::not_found(
            NotFoundKind::Player,
            format!("No registered player for identity {external_id}"),
        )
    })
}

pub async fn create<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    external_id: &str,
    display_name: &str,
) -> Result<Player, DomainError> {
    let p = players_adapter::create(conn, external_id, display_name).await?;
    Ok(Player::from(p))
}
