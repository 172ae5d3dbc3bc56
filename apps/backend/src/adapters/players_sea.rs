//! SeaORM adapter for the player directory.
//!
//! Profile registration and editing happen elsewhere; the core only looks
//! players up and seeds rows in tests.

use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, Set};
use time::OffsetDateTime;

use crate::entities::players;

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    player_id: i64,
) -> Result<Option<players::Model>, sea_orm::DbErr> {
    players::Entity::find_by_id(player_id).one(conn).await
}

pub async fn find_by_external_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    external_id: &str,
) -> Result<Option<players::Model>, sea_orm::DbErr> {
    players::Entity::find()
        .filter(players::Column::ExternalId.eq(external_id))
        .one(conn)
        .await
}

pub async fn create<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    external_id: &str,
    display_name: &str,
) -> Result<players::Model, sea_orm::DbErr> {
    let now = OffsetDateTime::now_utc();
    let active = players::ActiveModel {
        id: NotSet,
        external_id: Set(external_id.to_string()),
        display_name: Set(display_name.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    active.insert(conn).await
}
