mod support;

use matchroom_backend::db::txn::with_txn;
use matchroom_backend::entities::matches::MatchState;
use matchroom_backend::entities::scheduled_tasks::{TaskStatus, TaskType};
use matchroom_backend::error::AppError;
use matchroom_backend::errors::error_code::ErrorCode;
use matchroom_backend::repos::tasks::TaskKey;
use matchroom_backend::repos::{matches as matches_repo, tasks as tasks_repo};
use matchroom_backend::scheduler::TimerCmd;
use support::{
    claim_leader_as, claim_place_as, formed_standard_match, load_participants, participant_ids,
    request_submit_as, test_state,
};

async fn match_state(state: &matchroom_backend::AppState, match_id: i64) -> MatchState {
    with_txn(None, state, |txn| async move {
        Ok::<_, AppError>(matches_repo::require_match(txn, match_id).await?.state)
    })
    .await
    .unwrap()
}

async fn task_status(
    state: &matchroom_backend::AppState,
    key: TaskKey,
) -> Option<TaskStatus> {
    with_txn(None, state, |txn| async move {
        Ok::<_, AppError>(tasks_repo::find_by_key(txn, key).await?.map(|t| t.status))
    })
    .await
    .unwrap()
}

/// Scenario B: claims in order B, D, A, C get places 1, 2, 3, 4 - slot is
/// call order, not join order.
#[tokio::test]
async fn places_follow_call_order() {
    let (state, _messenger) = test_state().await;
    let (m, players) = formed_standard_match(&state).await;
    let match_id = m.id;
    let submitter = players[0].id;
    let ids = participant_ids(&state, match_id).await; // join order: A, B, C, D

    request_submit_as(&state, match_id, submitter).await.unwrap();

    for pid in [ids[1], ids[3], ids[0], ids[2]] {
        claim_place_as(&state, match_id, pid, submitter).await.unwrap();
    }

    let parts = load_participants(&state, match_id).await;
    let by_id = |id: i64| parts.iter().find(|p| p.id == id).unwrap();
    assert_eq!(by_id(ids[1]).candidate_place, Some(1));
    assert_eq!(by_id(ids[3]).candidate_place, Some(2));
    assert_eq!(by_id(ids[0]).candidate_place, Some(3));
    assert_eq!(by_id(ids[2]).candidate_place, Some(4));

    // Candidate only; nothing confirmed until the leader pass completes.
    assert!(parts.iter().all(|p| p.confirmed_place.is_none()));
}

#[tokio::test]
async fn first_claim_opens_submission_and_arms_the_timeout() {
    let (state, _messenger) = test_state().await;
    let (m, players) = formed_standard_match(&state).await;
    let match_id = m.id;
    let submitter = players[0].id;
    let ids = participant_ids(&state, match_id).await;

    request_submit_as(&state, match_id, submitter).await.unwrap();
    assert_eq!(match_state(&state, match_id).await, MatchState::New);

    let outcome = claim_place_as(&state, match_id, ids[0], submitter)
        .await
        .unwrap();

    assert_eq!(match_state(&state, match_id).await, MatchState::OnSubmit);
    let key = TaskKey::new(TaskType::SubmitTimeout, match_id);
    assert!(outcome
        .timers
        .iter()
        .any(|cmd| matches!(cmd, TimerCmd::Arm { key: k, .. } if *k == key)));
    assert_eq!(task_status(&state, key).await, Some(TaskStatus::Scheduled));
}

#[tokio::test]
async fn duplicate_place_claim_conflicts_without_mutation() {
    let (state, _messenger) = test_state().await;
    let (m, players) = formed_standard_match(&state).await;
    let match_id = m.id;
    let submitter = players[0].id;
    let ids = participant_ids(&state, match_id).await;

    request_submit_as(&state, match_id, submitter).await.unwrap();
    claim_place_as(&state, match_id, ids[0], submitter).await.unwrap();

    let err = claim_place_as(&state, match_id, ids[0], submitter)
        .await
        .unwrap_err();
    match err {
        AppError::Conflict { code, detail } => {
            assert_eq!(code, ErrorCode::PlaceAlreadyClaimed);
            assert!(detail.contains(&ids[0].to_string()));
            assert!(detail.contains('1'), "error names the held place");
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    // No second place appeared.
    let parts = load_participants(&state, match_id).await;
    let claimed: Vec<i16> = parts.iter().filter_map(|p| p.candidate_place).collect();
    assert_eq!(claimed, vec![1]);
}

#[tokio::test]
async fn claims_from_outsiders_are_rejected() {
    let (state, _messenger) = test_state().await;
    let (m, _players) = formed_standard_match(&state).await;
    let match_id = m.id;
    let ids = participant_ids(&state, match_id).await;

    // Unknown requester id, neither participant nor submitter.
    let err = claim_place_as(&state, match_id, ids[0], 999_999)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation { code: ErrorCode::NotAParticipant, .. }
    ));
}

/// Leaders fill the lowest open rank regardless of claim order.
#[tokio::test]
async fn leaders_fill_ranks_bottom_up() {
    let (state, _messenger) = test_state().await;
    let (m, players) = formed_standard_match(&state).await;
    let match_id = m.id;
    let submitter = players[0].id;
    let ids = participant_ids(&state, match_id).await;

    request_submit_as(&state, match_id, submitter).await.unwrap();
    // Join order claims: places 1..4 in order.
    for pid in &ids {
        claim_place_as(&state, match_id, *pid, submitter).await.unwrap();
    }

    // Three leaders in arbitrary order: each lands on the lowest open rank.
    for leader in [501, 502, 503] {
        claim_leader_as(&state, match_id, leader, submitter).await.unwrap();
    }

    let parts = load_participants(&state, match_id).await;
    let leader_of = |place: i16| {
        parts
            .iter()
            .find(|p| p.candidate_place == Some(place))
            .unwrap()
            .leader_id
    };
    assert_eq!(leader_of(1), Some(501));
    assert_eq!(leader_of(2), Some(502));
    assert_eq!(leader_of(3), Some(503));
    assert_eq!(leader_of(4), None);
}

#[tokio::test]
async fn duplicate_leader_is_a_conflict() {
    let (state, _messenger) = test_state().await;
    let (m, players) = formed_standard_match(&state).await;
    let match_id = m.id;
    let submitter = players[0].id;
    let ids = participant_ids(&state, match_id).await;

    request_submit_as(&state, match_id, submitter).await.unwrap();
    for pid in &ids {
        claim_place_as(&state, match_id, *pid, submitter).await.unwrap();
    }
    claim_leader_as(&state, match_id, 700, submitter).await.unwrap();

    let err = claim_leader_as(&state, match_id, 700, submitter)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Conflict { code: ErrorCode::LeaderTaken, .. }
    ));
}

#[tokio::test]
async fn leader_claims_require_complete_place_pass() {
    let (state, messenger) = test_state().await;
    let (m, players) = formed_standard_match(&state).await;
    let match_id = m.id;
    let submitter = players[0].id;
    let ids = participant_ids(&state, match_id).await;

    request_submit_as(&state, match_id, submitter).await.unwrap();
    claim_place_as(&state, match_id, ids[0], submitter).await.unwrap();
    messenger.clear();

    let err = claim_leader_as(&state, match_id, 700, submitter)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation { code: ErrorCode::PlacePassIncomplete, .. }
    ));
}

/// Completing both passes confirms all places atomically, flips the state
/// to SUBMITTED and swaps the submit timeout for the accept window.
#[tokio::test]
async fn completing_both_passes_submits_the_match() {
    let (state, _messenger) = test_state().await;
    let (m, players) = formed_standard_match(&state).await;
    let match_id = m.id;
    let submitter = players[0].id;
    let ids = participant_ids(&state, match_id).await;

    request_submit_as(&state, match_id, submitter).await.unwrap();
    for pid in &ids {
        claim_place_as(&state, match_id, *pid, submitter).await.unwrap();
    }
    for leader in [11, 22, 33] {
        claim_leader_as(&state, match_id, leader, submitter).await.unwrap();
    }
    let outcome = claim_leader_as(&state, match_id, 44, submitter)
        .await
        .unwrap();

    assert_eq!(match_state(&state, match_id).await, MatchState::Submitted);

    let parts = load_participants(&state, match_id).await;
    for p in &parts {
        assert_eq!(p.confirmed_place, p.candidate_place);
        assert!(p.confirmed_place.is_some());
        assert!(p.leader_id.is_some());
    }

    let submit_key = TaskKey::new(TaskType::SubmitTimeout, match_id);
    let accept_key = TaskKey::new(TaskType::SubmitAcceptTimeout, match_id);
    assert_eq!(
        task_status(&state, submit_key).await,
        Some(TaskStatus::Cancelled)
    );
    assert_eq!(
        task_status(&state, accept_key).await,
        Some(TaskStatus::Scheduled)
    );
    assert!(outcome
        .timers
        .iter()
        .any(|cmd| matches!(cmd, TimerCmd::Disarm { key } if *key == submit_key)));
    assert!(outcome
        .timers
        .iter()
        .any(|cmd| matches!(cmd, TimerCmd::Arm { key, .. } if *key == accept_key)));
}

#[tokio::test]
async fn submission_requires_quorum() {
    let (state, _messenger) = test_state().await;
    let players = support::seed_players(&state, 2).await;
    let m = support::create_match(
        &state,
        matchroom_backend::entities::matches::GameMode::Standard,
        &players[0],
    )
    .await;
    let match_id = m.id;
    support::add_vote(&state, match_id, players[0].id).await;
    support::add_vote(&state, match_id, players[1].id).await;

    let err = request_submit_as(&state, match_id, players[0].id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation { code: ErrorCode::QuorumNotReached, .. }
    ));
}
