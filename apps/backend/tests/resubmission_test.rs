mod support;

use matchroom_backend::db::txn::with_txn;
use matchroom_backend::entities::matches::MatchState;
use matchroom_backend::entities::scheduled_tasks::{TaskStatus, TaskType};
use matchroom_backend::error::AppError;
use matchroom_backend::errors::error_code::ErrorCode;
use matchroom_backend::repos::tasks::TaskKey;
use matchroom_backend::repos::{matches as matches_repo, tasks as tasks_repo};
use matchroom_backend::services::settings::SettingKey;
use support::{
    claim_leader_as, claim_place_as, formed_standard_match, load_participants, participant_ids,
    request_submit_as, resubmit_as, test_state,
};

/// Drive a formed match through places, and optionally some leaders.
async fn submit_places_and_leaders(
    state: &matchroom_backend::AppState,
    match_id: i64,
    submitter: i64,
    leaders: &[i64],
) {
    request_submit_as(state, match_id, submitter).await.unwrap();
    let ids = participant_ids(state, match_id).await;
    for pid in ids {
        claim_place_as(state, match_id, pid, submitter).await.unwrap();
    }
    for leader in leaders {
        claim_leader_as(state, match_id, *leader, submitter).await.unwrap();
    }
}

/// Scenario C: places {1..4} and two leaders assigned, then a resubmit -
/// everything clears, the count increments, SUBMITTED drops back to
/// ON_SUBMIT.
#[tokio::test]
async fn resubmit_clears_claims_and_increments_count() {
    let (state, _messenger) = test_state().await;
    let (m, players) = formed_standard_match(&state).await;
    let match_id = m.id;
    let submitter = players[0].id;

    submit_places_and_leaders(&state, match_id, submitter, &[10, 20]).await;

    // Seed resubmit_count = 1 and reach SUBMITTED, as after a prior round.
    with_txn(None, &state, |txn| async move {
        matches_repo::set_resubmit(txn, match_id, 1, Some(submitter)).await?;
        matches_repo::update_state(txn, match_id, MatchState::Submitted)
            .await
            .map_err(AppError::from)
    })
    .await
    .unwrap();

    resubmit_as(&state, match_id, submitter, false).await.unwrap();

    let fresh = with_txn(None, &state, |txn| async move {
        matches_repo::require_match(txn, match_id)
            .await
            .map_err(AppError::from)
    })
    .await
    .unwrap();
    assert_eq!(fresh.state, MatchState::OnSubmit);
    assert_eq!(fresh.resubmit_count, 2);

    let parts = load_participants(&state, match_id).await;
    assert_eq!(parts.len(), 4, "membership survives the reset");
    for p in &parts {
        assert_eq!(p.candidate_place, None);
        assert_eq!(p.confirmed_place, None);
        assert_eq!(p.leader_id, None);
    }
}

#[tokio::test]
async fn resubmit_cancels_the_accept_window() {
    let (state, _messenger) = test_state().await;
    let (m, players) = formed_standard_match(&state).await;
    let match_id = m.id;
    let submitter = players[0].id;

    // Full submission: SUBMITTED with an armed accept window.
    submit_places_and_leaders(&state, match_id, submitter, &[1, 2, 3, 4]).await;
    let accept_key = TaskKey::new(TaskType::SubmitAcceptTimeout, match_id);

    resubmit_as(&state, match_id, submitter, false).await.unwrap();

    let status = with_txn(None, &state, |txn| async move {
        Ok::<_, AppError>(tasks_repo::find_by_key(txn, accept_key).await?.map(|t| t.status))
    })
    .await
    .unwrap();
    assert_eq!(status, Some(TaskStatus::Cancelled));
}

#[tokio::test]
async fn resubmit_hands_the_exchange_to_the_requester_unless_delegating() {
    let (state, _messenger) = test_state().await;
    let (m, players) = formed_standard_match(&state).await;
    let match_id = m.id;
    let first = players[0].id;
    let second = players[1].id;

    submit_places_and_leaders(&state, match_id, first, &[]).await;

    resubmit_as(&state, match_id, second, false).await.unwrap();
    let fresh = with_txn(None, &state, |txn| async move {
        matches_repo::require_match(txn, match_id)
            .await
            .map_err(AppError::from)
    })
    .await
    .unwrap();
    assert_eq!(fresh.submitter_id, Some(second));

    // Delegate-back keeps the current submitter in charge.
    resubmit_as(&state, match_id, first, true).await.unwrap();
    let fresh = with_txn(None, &state, |txn| async move {
        matches_repo::require_match(txn, match_id)
            .await
            .map_err(AppError::from)
    })
    .await
    .unwrap();
    assert_eq!(fresh.submitter_id, Some(second));
}

#[tokio::test]
async fn resubmit_limit_is_enforced() {
    let (state, _messenger) = test_state().await;
    let (m, players) = formed_standard_match(&state).await;
    let match_id = m.id;
    let submitter = players[0].id;

    submit_places_and_leaders(&state, match_id, submitter, &[]).await;

    // Exhaust the limit (default 3).
    with_txn(None, &state, |txn| async move {
        matches_repo::set_resubmit(txn, match_id, 3, Some(submitter))
            .await
            .map_err(AppError::from)
    })
    .await
    .unwrap();

    let err = resubmit_as(&state, match_id, submitter, false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation { code: ErrorCode::ResubmitLimitExceeded, .. }
    ));
}

#[tokio::test]
async fn resubmit_limit_reads_the_settings_store() {
    let (state, _messenger) = test_state().await;
    let (m, players) = formed_standard_match(&state).await;
    let match_id = m.id;
    let submitter = players[0].id;

    submit_places_and_leaders(&state, match_id, submitter, &[]).await;

    // Lower the limit to 1; the cache must observe the write immediately.
    state.settings.set(SettingKey::ResubmitLimit, "1").await.unwrap();
    resubmit_as(&state, match_id, submitter, false).await.unwrap();

    let err = resubmit_as(&state, match_id, submitter, false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation { code: ErrorCode::ResubmitLimitExceeded, .. }
    ));
}

#[tokio::test]
async fn resubmit_rejected_outside_submission_states() {
    let (state, _messenger) = test_state().await;
    let (m, players) = formed_standard_match(&state).await;
    let match_id = m.id;

    let err = resubmit_as(&state, match_id, players[0].id, false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation { code: ErrorCode::StateMismatch, .. }
    ));
}
