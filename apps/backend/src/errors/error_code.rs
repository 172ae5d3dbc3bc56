//! Error codes for the Matchroom backend API.
//!
//! This module defines all error codes used throughout the application.
//! Add new codes here; never pass ad-hoc strings as error codes.
//!
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in HTTP responses.

use core::fmt;

/// Centralized error codes for the Matchroom backend API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request validation
    /// Operation not allowed in the match's current state
    StateMismatch,
    /// Vote count below the mode's required player count
    QuorumNotReached,
    /// Requester is not the designated submitter
    NotASubmitter,
    /// Requester is not a participant of the match
    NotAParticipant,
    /// Requester is not the match owner
    NotTheOwner,
    /// Leader claim before the place pass completed
    PlacePassIncomplete,
    /// Resubmit limit reached
    ResubmitLimitExceeded,
    /// General validation error
    ValidationError,
    /// General bad request error
    BadRequest,

    // Resource not found
    /// Match not found
    MatchNotFound,
    /// Player not found in the directory
    PlayerNotFound,
    /// Participant not found in the match
    ParticipantNotFound,
    /// Scheduled task not found
    TaskNotFound,
    /// General not found error
    NotFound,

    // Business logic conflicts
    /// Participant already claimed a place
    PlaceAlreadyClaimed,
    /// Leader already assigned within the match
    LeaderTaken,
    /// Unique constraint violation
    UniqueViolation,
    /// Generic conflict (fallback for unmatched conflicts)
    Conflict,

    // System errors
    /// Database error
    DbError,
    /// Database unavailable
    DbUnavailable,
    /// Database timeout
    DbTimeout,
    /// Internal server error
    Internal,
    /// Configuration error
    ConfigError,
    /// Data corruption detected
    DataCorruption,
}

impl ErrorCode {
    /// Canonical SCREAMING_SNAKE_CASE string for HTTP responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::StateMismatch => "STATE_MISMATCH",
            ErrorCode::QuorumNotReached => "QUORUM_NOT_REACHED",
            ErrorCode::NotASubmitter => "NOT_A_SUBMITTER",
            ErrorCode::NotAParticipant => "NOT_A_PARTICIPANT",
            ErrorCode::NotTheOwner => "NOT_THE_OWNER",
            ErrorCode::PlacePassIncomplete => "PLACE_PASS_INCOMPLETE",
            ErrorCode::ResubmitLimitExceeded => "RESUBMIT_LIMIT_EXCEEDED",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::MatchNotFound => "MATCH_NOT_FOUND",
            ErrorCode::PlayerNotFound => "PLAYER_NOT_FOUND",
            ErrorCode::ParticipantNotFound => "PARTICIPANT_NOT_FOUND",
            ErrorCode::TaskNotFound => "TASK_NOT_FOUND",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::PlaceAlreadyClaimed => "PLACE_ALREADY_CLAIMED",
            ErrorCode::LeaderTaken => "LEADER_TAKEN",
            ErrorCode::UniqueViolation => "UNIQUE_VIOLATION",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::DbError => "DB_ERROR",
            ErrorCode::DbUnavailable => "DB_UNAVAILABLE",
            ErrorCode::DbTimeout => "DB_TIMEOUT",
            ErrorCode::Internal => "INTERNAL",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::DataCorruption => "DATA_CORRUPTION",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
