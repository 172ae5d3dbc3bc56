//! Runtime settings service.
//!
//! Tunable durations and limits live in the `app_settings` row store so
//! operators can change them without a deploy. Reads go through a moka
//! cache; `set` writes through and invalidates, so the next read observes
//! the new value. Values are read at schedule time only — changing a
//! setting never retroactively moves an already-armed timer.

use std::time::Duration;

use moka::future::Cache;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use tracing::warn;

use crate::adapters::settings_sea;
use crate::error::AppError;

/// Typed settings keys with their defaults. Every consumer goes through
/// this enum; ad-hoc string keys don't exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Debounce between quorum being reached and the formed notice.
    FormedDebounce,
    /// Window for completing the submission flow once it starts.
    SubmitTimeout,
    /// Dispute grace window before a submitted result is committed.
    AcceptTimeout,
    /// Maximum number of resubmissions per match.
    ResubmitLimit,
    /// Age after which an under-quorum NEW match expires.
    ExpirationAge,
    /// Interval between expiration sweep runs.
    SweepInterval,
}

impl SettingKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::FormedDebounce => "formed_debounce_secs",
            SettingKey::SubmitTimeout => "submit_timeout_secs",
            SettingKey::AcceptTimeout => "accept_timeout_secs",
            SettingKey::ResubmitLimit => "resubmit_limit",
            SettingKey::ExpirationAge => "expiration_age_secs",
            SettingKey::SweepInterval => "sweep_interval_secs",
        }
    }

    /// Default used when no row exists or the stored value fails to parse.
    pub fn default_value(&self) -> &'static str {
        match self {
            SettingKey::FormedDebounce => "60",
            SettingKey::SubmitTimeout => "1800",
            SettingKey::AcceptTimeout => "3600",
            SettingKey::ResubmitLimit => "3",
            SettingKey::ExpirationAge => "86400",
            SettingKey::SweepInterval => "300",
        }
    }
}

pub struct SettingsService {
    db: DatabaseConnection,
    cache: Cache<&'static str, Option<String>>,
}

impl SettingsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            cache: Cache::new(256),
        }
    }

    /// Raw string value: cached row if present, default otherwise. The
    /// caller's connection is used for the fallback read so lookups inside
    /// an open transaction reuse it instead of grabbing a second pool
    /// connection. A read failure degrades to the default; settings are
    /// tunables, not state.
    async fn raw<C: ConnectionTrait + Send + Sync>(&self, conn: &C, key: SettingKey) -> String {
        let loaded = self
            .cache
            .try_get_with(key.as_str(), async move {
                settings_sea::find_by_key(conn, key.as_str())
                    .await
                    .map(|row| row.map(|r| r.value))
            })
            .await;

        match loaded {
            Ok(Some(value)) => value,
            Ok(None) => key.default_value().to_string(),
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "settings read failed, using default");
                key.default_value().to_string()
            }
        }
    }

    pub async fn u32<C: ConnectionTrait + Send + Sync>(&self, conn: &C, key: SettingKey) -> u32 {
        let raw = self.raw(conn, key).await;
        raw.parse().unwrap_or_else(|_| {
            warn!(key = key.as_str(), raw, "unparseable setting, using default");
            key.default_value().parse().expect("defaults are valid")
        })
    }

    pub async fn duration<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        key: SettingKey,
    ) -> Duration {
        Duration::from_secs(u64::from(self.u32(conn, key).await))
    }

    /// Write-through update; the cache entry is invalidated so the next
    /// read observes the new value.
    pub async fn set(&self, key: SettingKey, value: &str) -> Result<(), AppError> {
        settings_sea::upsert(&self.db, key.as_str(), value).await?;
        self.cache.invalidate(key.as_str()).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_as_numbers() {
        for key in [
            SettingKey::FormedDebounce,
            SettingKey::SubmitTimeout,
            SettingKey::AcceptTimeout,
            SettingKey::ResubmitLimit,
            SettingKey::ExpirationAge,
            SettingKey::SweepInterval,
        ] {
            assert!(key.default_value().parse::<u32>().is_ok(), "{key:?}");
        }
    }
}
