//! Domain-level error type used across services, repos and adapters.
//!
//! This error type is HTTP- and DB-agnostic. Handlers should return
//! `Result<T, crate::error::AppError>` and convert from `DomainError`
//! using the provided `From<DomainError> for AppError` implementation.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Validation kinds for business-rule violations
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationKind {
    /// Operation not allowed in the match's current state
    StateMismatch,
    /// Vote count below the mode's required player count
    QuorumNotReached,
    /// Requester is not the designated submitter for this match
    NotASubmitter,
    /// Requester has no membership in this match
    NotAParticipant,
    /// Requester is not the match owner
    NotTheOwner,
    /// Leader pass entered before every place was claimed
    PlacePassIncomplete,
    /// Resubmit attempted past the configured limit
    ResubmitLimitExceeded,
    Other(String),
}

/// Infra error kinds to distinguish operational failures
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InfraErrorKind {
    Timeout,
    DbUnavailable,
    DataCorruption,
    Other(String),
}

/// Domain-level not found entities
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    Player,
    Match,
    Participant,
    Task,
    Other(String),
}

/// Domain-level conflict kinds
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictKind {
    /// Participant already holds a candidate place
    PlaceAlreadyClaimed,
    /// Leader id already assigned to another participant of the match
    LeaderTaken,
    /// Unique constraint violation reported by the database
    UniqueViolation,
    Other(String),
}

/// Central domain error type
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Input/user validation or business rule violation
    Validation(ValidationKind, String),
    /// Semantic conflict
    Conflict(ConflictKind, String),
    /// Missing resource in domain terms
    NotFound(NotFoundKind, String),
    /// Infrastructure/operational failures
    Infra(InfraErrorKind, String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Validation(kind, d) => write!(f, "validation {kind:?}: {d}"),
            DomainError::Conflict(kind, d) => write!(f, "conflict {kind:?}: {d}"),
            DomainError::NotFound(kind, d) => write!(f, "not found {kind:?}: {d}"),
            DomainError::Infra(kind, d) => write!(f, "infra {kind:?}: {d}"),
        }
    }
}

impl Error for DomainError {}

impl DomainError {
    pub fn validation(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Self::Validation(kind, detail.into())
    }
    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self::Conflict(kind, detail.into())
    }
    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }
    pub fn infra(kind: InfraErrorKind, detail: impl Into<String>) -> Self {
        Self::Infra(kind, detail.into())
    }
}

// Adapter functions return DbErr; the repos layer maps to DomainError here.
impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        use sea_orm::SqlErr;

        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                DomainError::conflict(ConflictKind::UniqueViolation, detail)
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                DomainError::conflict(ConflictKind::Other("FK_VIOLATION".into()), detail)
            }
            _ => match e {
                sea_orm::DbErr::RecordNotFound(detail) => {
                    DomainError::not_found(NotFoundKind::Other("RECORD".into()), detail)
                }
                sea_orm::DbErr::ConnectionAcquire(_) => {
                    DomainError::infra(InfraErrorKind::DbUnavailable, e.to_string())
                }
                other => DomainError::infra(InfraErrorKind::Other("DB".into()), other.to_string()),
            },
        }
    }
}
