use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// Enums are stored as plain strings so the schema works on both Postgres
// and the SQLite databases used by tests.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum GameMode {
    #[sea_orm(string_value = "DUEL")]
    Duel,
    #[sea_orm(string_value = "STANDARD")]
    Standard,
    #[sea_orm(string_value = "GRAND")]
    Grand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum MatchState {
    #[sea_orm(string_value = "NEW")]
    New,
    #[sea_orm(string_value = "ON_SUBMIT")]
    OnSubmit,
    #[sea_orm(string_value = "SUBMITTED")]
    Submitted,
    #[sea_orm(string_value = "FINISHED")]
    Finished,
    #[sea_orm(string_value = "FAILED")]
    Failed,
    #[sea_orm(string_value = "EXPIRED")]
    Expired,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl MatchState {
    /// Terminal states are never mutated again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MatchState::Finished | MatchState::Failed | MatchState::Expired | MatchState::Cancelled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum FailReason {
    #[sea_orm(string_value = "TIMED_OUT")]
    TimedOut,
    #[sea_orm(string_value = "RESUBMIT_LIMIT")]
    ResubmitLimit,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "matches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_name = "game_mode")]
    pub game_mode: GameMode,
    pub state: MatchState,
    #[sea_orm(column_name = "owner_id")]
    pub owner_id: Option<i64>,
    #[sea_orm(column_name = "submitter_id")]
    pub submitter_id: Option<i64>,
    #[sea_orm(column_name = "positive_votes")]
    pub positive_votes: i32,
    #[sea_orm(column_name = "resubmit_count")]
    pub resubmit_count: i32,
    #[sea_orm(column_name = "fail_reason")]
    pub fail_reason: Option<FailReason>,
    #[sea_orm(column_name = "poll_ref")]
    pub poll_ref: Option<String>,
    #[sea_orm(column_name = "formed_notice_ref")]
    pub formed_notice_ref: Option<String>,
    #[sea_orm(column_name = "submit_notice_ref")]
    pub submit_notice_ref: Option<String>,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
    #[sea_orm(column_name = "finished_at")]
    pub finished_at: Option<OffsetDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::players::Entity",
        from = "Column::OwnerId",
        to = "super::players::Column::Id"
    )]
    Owner,
    #[sea_orm(has_many = "super::participants::Entity")]
    Participants,
}

impl Related<super::participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
