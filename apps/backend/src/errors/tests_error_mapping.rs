use actix_web::http::StatusCode;

use super::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};
use super::error_code::ErrorCode;
use crate::error::AppError;

#[test]
fn validation_kinds_map_to_codes() {
    let err: AppError =
        DomainError::validation(ValidationKind::StateMismatch, "wrong state").into();
    assert_eq!(err.code(), ErrorCode::StateMismatch);
    assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let err: AppError =
        DomainError::validation(ValidationKind::ResubmitLimitExceeded, "limit").into();
    assert_eq!(err.code(), ErrorCode::ResubmitLimitExceeded);
}

#[test]
fn conflicts_are_409() {
    let err: AppError =
        DomainError::conflict(ConflictKind::PlaceAlreadyClaimed, "held").into();
    assert_eq!(err.code(), ErrorCode::PlaceAlreadyClaimed);
    assert_eq!(err.status(), StatusCode::CONFLICT);

    let err: AppError = DomainError::conflict(ConflictKind::LeaderTaken, "taken").into();
    assert_eq!(err.code(), ErrorCode::LeaderTaken);
    assert_eq!(err.status(), StatusCode::CONFLICT);
}

#[test]
fn not_found_kinds_map_to_codes() {
    let err: AppError = DomainError::not_found(NotFoundKind::Match, "no match").into();
    assert_eq!(err.code(), ErrorCode::MatchNotFound);
    assert_eq!(err.status(), StatusCode::NOT_FOUND);

    let err: AppError = DomainError::not_found(NotFoundKind::Player, "no player").into();
    assert_eq!(err.code(), ErrorCode::PlayerNotFound);
}

#[test]
fn db_record_not_found_becomes_domain_not_found() {
    let db_err = sea_orm::DbErr::RecordNotFound("gone".to_string());
    let domain: DomainError = db_err.into();
    assert!(matches!(domain, DomainError::NotFound(_, _)));
}

#[test]
fn error_codes_render_screaming_snake() {
    assert_eq!(ErrorCode::PlaceAlreadyClaimed.as_str(), "PLACE_ALREADY_CLAIMED");
    assert_eq!(ErrorCode::QuorumNotReached.to_string(), "QUORUM_NOT_REACHED");
}
