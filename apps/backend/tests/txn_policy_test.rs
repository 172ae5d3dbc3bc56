mod support;

use matchroom_backend::db::txn::with_txn;
use matchroom_backend::db::txn_policy::{self, TxnPolicy};
use matchroom_backend::error::AppError;
use matchroom_backend::repos::players as players_repo;
use serial_test::serial;
use support::test_state;

#[test]
#[serial]
fn default_policy_is_commit_on_ok() {
    assert_eq!(txn_policy::current(), TxnPolicy::CommitOnOk);
}

#[test]
#[serial]
fn policy_set_is_first_write_wins() {
    txn_policy::set_txn_policy(TxnPolicy::CommitOnOk);
    txn_policy::set_txn_policy(TxnPolicy::RollbackOnOk);
    assert_eq!(txn_policy::current(), TxnPolicy::CommitOnOk);
}

#[tokio::test]
#[serial]
async fn with_txn_commits_on_ok_by_default() {
    let (state, _messenger) = test_state().await;

    with_txn(None, &state, |txn| async move {
        players_repo::create(txn, "chat:txn-check", "Txn Check")
            .await
            .map_err(AppError::from)
    })
    .await
    .unwrap();

    let found = with_txn(None, &state, |txn| async move {
        players_repo::find_by_external_id(txn, "chat:txn-check")
            .await
            .map_err(AppError::from)
    })
    .await
    .unwrap();
    assert!(found.is_some(), "committed write visible in a later txn");
}

#[tokio::test]
#[serial]
async fn with_txn_rolls_back_on_error() {
    let (state, _messenger) = test_state().await;

    let result = with_txn(None, &state, |txn| async move {
        players_repo::create(txn, "chat:rollback", "Rollback")
            .await
            .map_err(AppError::from)?;
        Err::<(), AppError>(AppError::internal("boom"))
    })
    .await;
    assert!(result.is_err());

    let found = with_txn(None, &state, |txn| async move {
        players_repo::find_by_external_id(txn, "chat:rollback")
            .await
            .map_err(AppError::from)
    })
    .await
    .unwrap();
    assert!(found.is_none(), "failed txn leaves no trace");
}
