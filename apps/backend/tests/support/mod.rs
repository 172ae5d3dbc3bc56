#![allow(dead_code)]

//! Shared fixtures for the integration suites: an in-memory SQLite
//! database with the real migration applied, a recording messenger, and
//! aggregate seeding helpers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use backend_test_support::unique_helpers::unique_external_id;
use matchroom_backend::ctx::Ctx;
use matchroom_backend::db::txn::with_txn;
use matchroom_backend::entities::matches::GameMode;
use matchroom_backend::error::AppError;
use matchroom_backend::messaging::{MessageRef, Messenger};
use matchroom_backend::repos::matches::Match;
use matchroom_backend::repos::players::Player;
use matchroom_backend::repos::{participants as participants_repo, players as players_repo};
use matchroom_backend::services::matches::MatchService;
use matchroom_backend::services::outcome::Outcome;
use matchroom_backend::services::votes::VoteService;
use matchroom_backend::AppState;
use matchroom_migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// One outbound message accepted by the recording transport.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub target: String,
    pub text: String,
    pub buttons: Option<Vec<String>>,
    pub reference: String,
}

/// Messenger that records sends and retractions instead of talking to a
/// chat transport.
#[derive(Default)]
pub struct RecordingMessenger {
    counter: AtomicU64,
    sent: Mutex<Vec<SentMessage>>,
    deleted: Mutex<Vec<String>>,
}

impl RecordingMessenger {
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.text).collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
        self.deleted.lock().unwrap().clear();
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(
        &self,
        target: &str,
        text: &str,
        buttons: Option<Vec<String>>,
    ) -> Result<MessageRef, AppError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let reference = format!("msg:{n}");
        self.sent.lock().unwrap().push(SentMessage {
            target: target.to_string(),
            text: text.to_string(),
            buttons,
            reference: reference.clone(),
        });
        Ok(MessageRef(reference))
    }

    async fn delete(&self, message: &MessageRef) -> Result<(), AppError> {
        self.deleted.lock().unwrap().push(message.0.clone());
        Ok(())
    }
}

/// Fresh in-memory database with the schema applied.
pub async fn test_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:".to_string());
    // A single connection keeps every query on the one in-memory database.
    opts.max_connections(1);
    let db = Database::connect(opts).await.expect("sqlite connect");
    Migrator::up(&db, None).await.expect("migrations apply");
    db
}

/// Fresh state around an in-memory database and a recording messenger.
/// No task handler is wired; tests choose their own.
pub async fn test_state() -> (AppState, Arc<RecordingMessenger>) {
    let db = test_db().await;
    let messenger = Arc::new(RecordingMessenger::default());
    let state = AppState::for_tests_with_messenger(db, messenger.clone());
    (state, messenger)
}

pub fn test_ctx() -> Ctx {
    Ctx::for_task("test")
}

/// Register `n` players in the directory.
pub async fn seed_players(state: &AppState, n: usize) -> Vec<Player> {
    let mut players = Vec::with_capacity(n);
    for i in 0..n {
        let external_id = unique_external_id("chat");
        let player = with_txn(None, state, |txn| {
            let external_id = external_id.clone();
            async move {
                players_repo::create(txn, &external_id, &format!("Player {i}"))
                    .await
                    .map_err(AppError::from)
            }
        })
        .await
        .expect("seed player");
        players.push(player);
    }
    players
}

/// Create a match owned by `owner` without applying its outcome timers.
pub async fn create_match(state: &AppState, mode: GameMode, owner: &Player) -> Match {
    let ctx = test_ctx();
    with_txn(None, state, |txn| {
        let ctx = &ctx;
        let owner_ext = owner.external_id.clone();
        async move {
            let (m, _outcome) = MatchService.create_match(ctx, txn, mode, &owner_ext).await?;
            Ok(m)
        }
    })
    .await
    .expect("create match")
}

/// Add a positive vote; returns the service outcome for timer assertions.
pub async fn add_vote(state: &AppState, match_id: i64, player_id: i64) -> Outcome {
    let ctx = test_ctx();
    with_txn(None, state, |txn| {
        let ctx = &ctx;
        async move { VoteService.add_vote(ctx, state, txn, match_id, player_id).await }
    })
    .await
    .expect("add vote")
}

/// Standard 4-player match with all votes in: (match, players).
/// Participant rows follow the vote order of `players`.
pub async fn formed_standard_match(state: &AppState) -> (Match, Vec<Player>) {
    let players = seed_players(state, 4).await;
    let m = create_match(state, GameMode::Standard, &players[0]).await;
    for p in &players {
        add_vote(state, m.id, p.id).await;
    }
    (m, players)
}

/// Run `request_submit` as the given player.
pub async fn request_submit_as(
    state: &AppState,
    match_id: i64,
    requester_id: i64,
) -> Result<Outcome, AppError> {
    let ctx = test_ctx();
    with_txn(None, state, |txn| {
        let ctx = &ctx;
        async move {
            matchroom_backend::services::submission::SubmissionService
                .request_submit(ctx, txn, match_id, requester_id)
                .await
        }
    })
    .await
}

/// Run `claim_place` as the given player.
pub async fn claim_place_as(
    state: &AppState,
    match_id: i64,
    participant_id: i64,
    requester_id: i64,
) -> Result<Outcome, AppError> {
    let ctx = test_ctx();
    with_txn(None, state, |txn| {
        let ctx = &ctx;
        async move {
            matchroom_backend::services::submission::SubmissionService
                .claim_place(ctx, state, txn, match_id, participant_id, requester_id)
                .await
        }
    })
    .await
}

/// Run `claim_leader` as the given player.
pub async fn claim_leader_as(
    state: &AppState,
    match_id: i64,
    leader_id: i64,
    requester_id: i64,
) -> Result<Outcome, AppError> {
    let ctx = test_ctx();
    with_txn(None, state, |txn| {
        let ctx = &ctx;
        async move {
            matchroom_backend::services::submission::SubmissionService
                .claim_leader(ctx, state, txn, match_id, leader_id, requester_id)
                .await
        }
    })
    .await
}

/// Run `resubmit` as the given player.
pub async fn resubmit_as(
    state: &AppState,
    match_id: i64,
    requester_id: i64,
    delegate_back: bool,
) -> Result<Outcome, AppError> {
    let ctx = test_ctx();
    with_txn(None, state, |txn| {
        let ctx = &ctx;
        async move {
            matchroom_backend::services::resubmission::ResubmissionService
                .resubmit(ctx, state, txn, match_id, requester_id, delegate_back)
                .await
        }
    })
    .await
}

/// Load the match's participants in join order.
pub async fn load_participants(
    state: &AppState,
    match_id: i64,
) -> Vec<matchroom_backend::repos::participants::Participant> {
    with_txn(None, state, |txn| async move {
        participants_repo::find_by_match(txn, match_id)
            .await
            .map_err(AppError::from)
    })
    .await
    .expect("load participants")
}

/// Participant ids of a match in join order.
pub async fn participant_ids(state: &AppState, match_id: i64) -> Vec<i64> {
    with_txn(None, state, |txn| async move {
        let parts = participants_repo::find_by_match(txn, match_id).await?;
        Ok::<_, AppError>(parts.into_iter().map(|p| p.id).collect())
    })
    .await
    .expect("load participants")
}
