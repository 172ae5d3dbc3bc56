//! Poll vote coordinator.
//!
//! Vote events maintain match membership and the debounced "match formed"
//! notice. The MATCH_FORMED handler re-validates the vote count at fire
//! time, so vote flapping inside the debounce window never announces a
//! match that fell back under quorum.

use sea_orm::DatabaseTransaction;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::ctx::Ctx;
use crate::db::txn::with_txn;
use crate::domain::modes;
use crate::entities::matches::MatchState;
use crate::entities::scheduled_tasks::TaskType;
use crate::error::AppError;
use crate::errors::domain::{DomainError, ValidationKind};
use crate::repos::tasks::TaskKey;
use crate::repos::{matches as matches_repo, participants as participants_repo, players as players_repo, tasks as tasks_repo};
use crate::services::notices::RefSlot;
use crate::services::outcome::Outcome;
use crate::services::settings::SettingKey;
use crate::state::app_state::AppState;

/// Vote coordination service.
pub struct VoteService;

impl VoteService {
    /// Route a poll vote event.
    pub async fn vote(
        &self,
        ctx: &Ctx,
        state: &AppState,
        txn: &DatabaseTransaction,
        match_id: i64,
        player_id: i64,
        positive: bool,
    ) -> Result<Outcome, AppError> {
        if positive {
            self.add_vote(ctx, state, txn, match_id, player_id).await
        } else {
            self.remove_vote(ctx, txn, match_id, player_id).await
        }
    }

    /// Join a match. Idempotent: voting again as an existing participant
    /// changes nothing.
    pub async fn add_vote(
        &self,
        ctx: &Ctx,
        state: &AppState,
        txn: &DatabaseTransaction,
        match_id: i64,
        player_id: i64,
    ) -> Result<Outcome, AppError> {
        let m = matches_repo::require_match_for_update(txn, match_id).await?;
        if m.state != MatchState::New {
            return Err(DomainError::validation(
                ValidationKind::StateMismatch,
                format!("Votes are only counted before submission starts (state {:?})", m.state),
            )
            .into());
        }

        if participants_repo::find_by_match_and_player(txn, match_id, player_id)
            .await?
            .is_some()
        {
            debug!(trace_id = %ctx.trace_id, match_id, player_id, "duplicate vote ignored");
            return Ok(Outcome::new());
        }

        // Directory check: votes from unregistered identities never create
        // membership.
        players_repo::require(txn, player_id).await?;

        participants_repo::create(txn, match_id, player_id).await?;
        let count = m.positive_votes + 1;
        matches_repo::update_votes(txn, match_id, count).await?;

        let required = modes::required_players(m.game_mode)?;
        let mut outcome = Outcome::new();
        if count as usize == required {
            // Quorum just reached: debounce the announcement instead of
            // firing it immediately, to absorb vote flapping.
            let debounce = state
                .settings
                .duration(txn, SettingKey::FormedDebounce)
                .await;
            let due_at = OffsetDateTime::now_utc() + debounce;
            let key = TaskKey::new(TaskType::MatchFormed, match_id);
            tasks_repo::schedule(txn, key, due_at).await?;
            outcome.arm(key, due_at);
            info!(trace_id = %ctx.trace_id, match_id, count, "quorum reached, formed notice debounced");
        } else {
            info!(trace_id = %ctx.trace_id, match_id, player_id, count, "vote added");
        }

        Ok(outcome)
    }

    /// Leave a match. Retracts an already-sent formed notice when the
    /// count drops back under quorum.
    pub async fn remove_vote(
        &self,
        ctx: &Ctx,
        txn: &DatabaseTransaction,
        match_id: i64,
        player_id: i64,
    ) -> Result<Outcome, AppError> {
        let m = matches_repo::require_match_for_update(txn, match_id).await?;
        if m.state != MatchState::New {
            return Err(DomainError::validation(
                ValidationKind::StateMismatch,
                format!("Votes are only counted before submission starts (state {:?})", m.state),
            )
            .into());
        }

        let Some(participant) =
            participants_repo::find_by_match_and_player(txn, match_id, player_id).await?
        else {
            debug!(trace_id = %ctx.trace_id, match_id, player_id, "vote removal for non-member ignored");
            return Ok(Outcome::new());
        };

        participants_repo::delete(txn, participant.id).await?;
        let count = (m.positive_votes - 1).max(0);
        matches_repo::update_votes(txn, match_id, count).await?;

        let required = modes::required_players(m.game_mode)?;
        let mut outcome = Outcome::new();
        if (count as usize) < required {
            if let Some(reference) = m.formed_notice_ref {
                // The announcement went out but the roster no longer holds;
                // take it back. The pending MATCH_FORMED task (if any) stays
                // armed - its handler re-validates and skips.
                matches_repo::set_formed_notice_ref(txn, match_id, None).await?;
                outcome.retract(reference);
                info!(trace_id = %ctx.trace_id, match_id, count, required, "formed notice retracted");
            }
        }
        info!(trace_id = %ctx.trace_id, match_id, player_id, count, "vote removed");

        Ok(outcome)
    }

    /// MATCH_FORMED firing: re-validate, then announce.
    pub async fn on_match_formed(
        &self,
        ctx: &Ctx,
        state: &AppState,
        match_id: i64,
    ) -> Result<Outcome, AppError> {
        with_txn(None, state, |txn| async move {
            let m = matches_repo::require_match_for_update(txn, match_id).await?;
            if m.state != MatchState::New {
                debug!(trace_id = %ctx.trace_id, match_id, state = ?m.state, "formed notice skipped, match moved on");
                return Ok(Outcome::new());
            }

            let spec = modes::mode_spec(m.game_mode)?;
            if (m.positive_votes as usize) < spec.required_players {
                // Votes flapped below quorum inside the debounce window.
                info!(
                    trace_id = %ctx.trace_id,
                    match_id,
                    votes = m.positive_votes,
                    required = spec.required_players,
                    "formed notice skipped, quorum lost"
                );
                return Ok(Outcome::new());
            }

            if m.formed_notice_ref.is_some() {
                debug!(trace_id = %ctx.trace_id, match_id, "formed notice already sent");
                return Ok(Outcome::new());
            }

            let mut outcome = Outcome::new();
            outcome.send_tracked(
                spec.destination,
                format!(
                    "Match #{match_id} is formed: {} players are in. Waiting for results.",
                    m.positive_votes
                ),
                RefSlot::FormedNotice(match_id),
            );
            Ok(outcome)
        })
        .await
    }
}
