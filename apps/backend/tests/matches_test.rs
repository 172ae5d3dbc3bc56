mod support;

use matchroom_backend::db::txn::with_txn;
use matchroom_backend::entities::matches::{GameMode, MatchState};
use matchroom_backend::error::AppError;
use matchroom_backend::errors::error_code::ErrorCode;
use matchroom_backend::repos::{matches as matches_repo, participants as participants_repo};
use matchroom_backend::services::matches::MatchService;
use matchroom_backend::services::notices;
use support::{add_vote, create_match, formed_standard_match, seed_players, test_ctx, test_state};

async fn cancel_as(
    state: &matchroom_backend::AppState,
    match_id: i64,
    requester_id: i64,
) -> Result<matchroom_backend::services::outcome::Outcome, AppError> {
    let ctx = test_ctx();
    with_txn(None, state, |txn| {
        let ctx = &ctx;
        async move { MatchService.cancel_match(ctx, txn, match_id, requester_id).await }
    })
    .await
}

#[tokio::test]
async fn creating_a_match_announces_its_poll() {
    let (state, messenger) = test_state().await;
    let players = seed_players(&state, 1).await;

    let ctx = test_ctx();
    let owner_ext = players[0].external_id.clone();
    let (m, outcome) = with_txn(None, &state, |txn| {
        let ctx = &ctx;
        let owner_ext = owner_ext.clone();
        async move {
            MatchService
                .create_match(ctx, txn, GameMode::Duel, &owner_ext)
                .await
        }
    })
    .await
    .unwrap();
    notices::dispatch(&ctx, &state, outcome.notices).await;

    assert_eq!(m.state, MatchState::New);
    assert_eq!(m.positive_votes, 0);

    let sent = messenger.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].target, "room:duel");

    // Poll handle stored for later retraction.
    let match_id = m.id;
    let fresh = with_txn(None, &state, |txn| async move {
        matches_repo::require_match(txn, match_id)
            .await
            .map_err(AppError::from)
    })
    .await
    .unwrap();
    assert_eq!(fresh.poll_ref.as_deref(), Some(sent[0].reference.as_str()));
}

#[tokio::test]
async fn creating_a_match_requires_a_registered_owner() {
    let (state, _messenger) = test_state().await;

    let ctx = test_ctx();
    let err = with_txn(None, &state, |txn| {
        let ctx = &ctx;
        async move {
            MatchService
                .create_match(ctx, txn, GameMode::Standard, "chat:nobody")
                .await
        }
    })
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        AppError::NotFound { code: ErrorCode::PlayerNotFound, .. }
    ));
}

#[tokio::test]
async fn owner_cancellation_before_formation_deletes_participants() {
    let (state, messenger) = test_state().await;
    let players = seed_players(&state, 2).await;
    let m = create_match(&state, GameMode::Standard, &players[0]).await;
    let match_id = m.id;
    add_vote(&state, match_id, players[0].id).await;
    add_vote(&state, match_id, players[1].id).await;

    messenger.clear();
    let ctx = test_ctx();
    let outcome = cancel_as(&state, match_id, players[0].id).await.unwrap();
    notices::dispatch(&ctx, &state, outcome.notices).await;

    let fresh = with_txn(None, &state, |txn| async move {
        matches_repo::require_match(txn, match_id)
            .await
            .map_err(AppError::from)
    })
    .await
    .unwrap();
    assert_eq!(fresh.state, MatchState::Cancelled);
    assert_eq!(fresh.positive_votes, 0);
    assert_eq!(fresh.poll_ref, None);

    let count = with_txn(None, &state, |txn| async move {
        participants_repo::count_by_match(txn, match_id)
            .await
            .map_err(AppError::from)
    })
    .await
    .unwrap();
    assert_eq!(count, 0, "pre-formation cancel removes membership");
}

#[tokio::test]
async fn cancellation_is_owner_only() {
    let (state, _messenger) = test_state().await;
    let players = seed_players(&state, 2).await;
    let m = create_match(&state, GameMode::Standard, &players[0]).await;

    let err = cancel_as(&state, m.id, players[1].id).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation { code: ErrorCode::NotTheOwner, .. }
    ));
}

#[tokio::test]
async fn formed_matches_cannot_be_cancelled() {
    let (state, _messenger) = test_state().await;
    let (m, players) = formed_standard_match(&state).await;

    let err = cancel_as(&state, m.id, players[0].id).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation { code: ErrorCode::StateMismatch, .. }
    ));
}

#[tokio::test]
async fn terminal_states_reject_every_mutation_path() {
    let (state, _messenger) = test_state().await;
    let (m, players) = formed_standard_match(&state).await;
    let match_id = m.id;

    with_txn(None, &state, |txn| async move {
        matches_repo::update_state(txn, match_id, MatchState::Finished)
            .await
            .map_err(AppError::from)
    })
    .await
    .unwrap();

    let err = support::request_submit_as(&state, match_id, players[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    let err = support::resubmit_as(&state, match_id, players[0].id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    let err = cancel_as(&state, match_id, players[0].id).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}
