//! SeaORM adapter for the runtime settings row store.

use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use time::OffsetDateTime;

use crate::entities::app_settings;

pub async fn find_by_key<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    key: &str,
) -> Result<Option<app_settings::Model>, sea_orm::DbErr> {
    app_settings::Entity::find()
        .filter(app_settings::Column::Key.eq(key))
        .one(conn)
        .await
}

pub async fn upsert<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    key: &str,
    value: &str,
) -> Result<(), sea_orm::DbErr> {
    let active = app_settings::ActiveModel {
        key: Set(key.to_string()),
        value: Set(value.to_string()),
        updated_at: Set(OffsetDateTime::now_utc()),
    };

    app_settings::Entity::insert(active)
        .on_conflict(
            OnConflict::column(app_settings::Column::Key)
                .update_columns([app_settings::Column::Value, app_settings::Column::UpdatedAt])
                .to_owned(),
        )
        .exec(conn)
        .await?;
    Ok(())
}
