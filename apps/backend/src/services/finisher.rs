//! Timeout-driven finisher: auto-fill, auto-commit and the expiration
//! sweep.
//!
//! Every handler re-checks the current match state before mutating, which
//! is what makes late or duplicate firings safe (a cancelled timer may
//! still fire once).

use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::ctx::Ctx;
use crate::db::txn::with_txn;
use crate::domain::modes;
use crate::domain::placement::{self, AutoFill};
use crate::entities::matches::{FailReason, MatchState};
use crate::entities::scheduled_tasks::TaskType;
use crate::error::AppError;
use crate::repos::matches::Match;
use crate::repos::tasks::TaskKey;
use crate::repos::{matches as matches_repo, participants as participants_repo, players as players_repo, tasks as tasks_repo};
use crate::services::notices;
use crate::services::outcome::Outcome;
use crate::services::settings::SettingKey;
use crate::state::app_state::AppState;

/// Timeout-driven transitions service.
pub struct Finisher;

impl Finisher {
    /// SUBMIT_TIMEOUT firing: try the single-gap auto-fill, otherwise fail
    /// the match.
    pub async fn on_submit_timeout(
        &self,
        ctx: &Ctx,
        state: &AppState,
        match_id: i64,
    ) -> Result<Outcome, AppError> {
        with_txn(None, state, |txn| async move {
            let m = matches_repo::require_match_for_update(txn, match_id).await?;
            if m.state != MatchState::OnSubmit {
                debug!(trace_id = %ctx.trace_id, match_id, state = ?m.state, "submit timeout no-op");
                return Ok(Outcome::new());
            }

            let limit = state.settings.u32(txn, SettingKey::ResubmitLimit).await as i32;
            if m.resubmit_count >= limit {
                info!(trace_id = %ctx.trace_id, match_id, "submit timeout with exhausted resubmits");
                return fail(ctx, txn, &m, FailReason::ResubmitLimit).await;
            }

            let participants = participants_repo::find_by_match(txn, match_id).await?;
            let places: Vec<Option<i16>> =
                participants.iter().map(|p| p.candidate_place).collect();

            match placement::missing_place(&places) {
                AutoFill::Fill { index, place } => {
                    // Best-effort recovery: one inferable gap, fill it and
                    // let the workflow continue into the leader pass.
                    let target = &participants[index];
                    participants_repo::set_candidate_place(txn, target.id, place).await?;

                    let window = state.settings.duration(txn, SettingKey::SubmitTimeout).await;
                    let due_at = OffsetDateTime::now_utc() + window;
                    let key = TaskKey::new(TaskType::SubmitTimeout, match_id);
                    tasks_repo::schedule(txn, key, due_at).await?;

                    let mut outcome = Outcome::new();
                    outcome.arm(key, due_at);

                    let player = players_repo::require(txn, target.player_id).await?;
                    let spec = modes::mode_spec(m.game_mode)?;
                    outcome.send(
                        spec.destination,
                        format!(
                            "Match #{match_id}: place {place} auto-assigned to {} after the timeout. Assign leaders to finish.",
                            player.display_name
                        ),
                    );

                    info!(
                        trace_id = %ctx.trace_id,
                        match_id,
                        participant_id = target.id,
                        place,
                        "missing place auto-filled on timeout"
                    );
                    Ok(outcome)
                }
                AutoFill::RankOneMissing => {
                    info!(trace_id = %ctx.trace_id, match_id, "rank 1 unclaimed, cannot infer");
                    fail(ctx, txn, &m, FailReason::TimedOut).await
                }
                AutoFill::NotApplicable => {
                    info!(trace_id = %ctx.trace_id, match_id, "submission incomplete at timeout");
                    fail(ctx, txn, &m, FailReason::TimedOut).await
                }
            }
        })
        .await
    }

    /// SUBMIT_ACCEPT_TIMEOUT firing: the dispute window passed, commit the
    /// pending result.
    pub async fn on_accept_timeout(
        &self,
        ctx: &Ctx,
        state: &AppState,
        match_id: i64,
    ) -> Result<Outcome, AppError> {
        with_txn(None, state, |txn| async move {
            let m = matches_repo::require_match_for_update(txn, match_id).await?;
            if m.state != MatchState::Submitted {
                debug!(trace_id = %ctx.trace_id, match_id, state = ?m.state, "accept timeout no-op");
                return Ok(Outcome::new());
            }

            matches_repo::set_finished(txn, match_id, OffsetDateTime::now_utc()).await?;

            let spec = modes::mode_spec(m.game_mode)?;
            let mut outcome = Outcome::new();
            outcome.send(
                spec.destination,
                format!("Match #{match_id}: result is final."),
            );

            info!(trace_id = %ctx.trace_id, match_id, "pending result committed");
            Ok(outcome)
        })
        .await
    }

    /// One sweep pass: expire stale under-quorum NEW matches.
    pub async fn expire_overdue(
        &self,
        ctx: &Ctx,
        state: &AppState,
    ) -> Result<Outcome, AppError> {
        let age = state.settings.duration(&state.db, SettingKey::ExpirationAge).await;
        let cutoff = OffsetDateTime::now_utc() - age;

        with_txn(None, state, |txn| async move {
            let candidates = matches_repo::find_expiration_candidates(txn, cutoff, 100).await?;
            let mut outcome = Outcome::new();
            let mut expired = 0usize;

            for m in candidates {
                let required = modes::required_players(m.game_mode)?;
                if (m.positive_votes as usize) >= required {
                    continue;
                }
                matches_repo::update_state(txn, m.id, MatchState::Expired).await?;
                if let Some(reference) = m.poll_ref {
                    matches_repo::set_poll_ref(txn, m.id, None).await?;
                    outcome.retract(reference);
                }
                expired += 1;
                info!(trace_id = %ctx.trace_id, match_id = m.id, "stale match expired");
            }

            if expired > 0 {
                info!(trace_id = %ctx.trace_id, expired, "expiration sweep pass done");
            }
            Ok(outcome)
        })
        .await
    }
}

/// Terminal failure path shared by the submit-timeout branches.
async fn fail(
    ctx: &Ctx,
    txn: &sea_orm::DatabaseTransaction,
    m: &Match,
    reason: FailReason,
) -> Result<Outcome, AppError> {
    matches_repo::set_failed(txn, m.id, reason).await?;

    let mut outcome = Outcome::new();
    for task_type in [TaskType::SubmitTimeout, TaskType::SubmitAcceptTimeout] {
        let key = TaskKey::new(task_type, m.id);
        tasks_repo::cancel(txn, key).await?;
        outcome.disarm(key);
    }

    if let Some(reference) = &m.submit_notice_ref {
        matches_repo::set_submit_notice_ref(txn, m.id, None).await?;
        outcome.retract(reference.clone());
    }

    let spec = modes::mode_spec(m.game_mode)?;
    let why = match reason {
        FailReason::TimedOut => "results were not completed in time",
        FailReason::ResubmitLimit => "the resubmit limit was exceeded",
    };
    outcome.send(
        spec.destination,
        format!("Match #{} failed: {why}.", m.id),
    );

    info!(trace_id = %ctx.trace_id, match_id = m.id, ?reason, "match failed");
    Ok(outcome)
}

/// Periodic expiration sweep. Interval is re-read from settings on every
/// cycle.
pub fn spawn_expiration_sweep(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let interval = state.settings.duration(&state.db, SettingKey::SweepInterval).await;
            tokio::time::sleep(interval).await;

            let ctx = Ctx::for_task("expire-sweep");
            match Finisher.expire_overdue(&ctx, &state).await {
                Ok(outcome) => notices::dispatch(&ctx, &state, outcome.notices).await,
                Err(e) => {
                    error!(trace_id = %ctx.trace_id, error = %e, "expiration sweep failed");
                }
            }
        }
    })
}
