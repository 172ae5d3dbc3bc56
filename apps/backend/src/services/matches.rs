//! Match lifecycle: creation on poll announcement, owner cancellation,
//! reads.

use sea_orm::DatabaseTransaction;
use tracing::info;

use crate::ctx::Ctx;
use crate::domain::modes;
use crate::entities::matches::{GameMode, MatchState};
use crate::entities::scheduled_tasks::TaskType;
use crate::error::AppError;
use crate::errors::domain::{DomainError, ValidationKind};
use crate::repos::matches::{Match, MatchCreate};
use crate::repos::participants::Participant;
use crate::repos::tasks::TaskKey;
use crate::repos::{matches as matches_repo, participants as participants_repo, players as players_repo, tasks as tasks_repo};
use crate::services::notices::RefSlot;
use crate::services::outcome::Outcome;

/// Match lifecycle service.
pub struct MatchService;

impl MatchService {
    /// Create a match in NEW and announce its poll.
    pub async fn create_match(
        &self,
        ctx: &Ctx,
        txn: &DatabaseTransaction,
        game_mode: GameMode,
        owner_external_id: &str,
    ) -> Result<(Match, Outcome), AppError> {
        let owner = players_repo::require_by_external_id(txn, owner_external_id).await?;
        let spec = modes::mode_spec(game_mode)?;

        let m =
            matches_repo::create_match(txn, MatchCreate::new(game_mode, Some(owner.id), None))
                .await?;

        let mut outcome = Outcome::new();
        outcome.send_tracked(
            spec.destination,
            format!(
                "Match #{} ({game_mode:?}): vote to join, {} players needed.",
                m.id, spec.required_players
            ),
            RefSlot::Poll(m.id),
        );

        info!(trace_id = %ctx.trace_id, match_id = m.id, ?game_mode, owner_id = owner.id, "match created");
        Ok((m, outcome))
    }

    /// Owner-initiated cancellation, allowed only before the match formed.
    /// The only path that deletes participant rows.
    pub async fn cancel_match(
        &self,
        ctx: &Ctx,
        txn: &DatabaseTransaction,
        match_id: i64,
        requester_id: i64,
    ) -> Result<Outcome, AppError> {
        let m = matches_repo::require_match_for_update(txn, match_id).await?;

        if m.owner_id != Some(requester_id) {
            return Err(DomainError::validation(
                ValidationKind::NotTheOwner,
                format!("Only the owner can cancel match {match_id}"),
            )
            .into());
        }
        if !matches!(m.state, MatchState::New | MatchState::OnSubmit) {
            return Err(DomainError::validation(
                ValidationKind::StateMismatch,
                format!("Match in state {:?} cannot be cancelled", m.state),
            )
            .into());
        }
        let required = modes::required_players(m.game_mode)?;
        if (m.positive_votes as usize) >= required {
            return Err(DomainError::validation(
                ValidationKind::StateMismatch,
                "A formed match can no longer be cancelled".to_string(),
            )
            .into());
        }

        let participants = participants_repo::find_by_match(txn, match_id).await?;
        let mut outcome = Outcome::new();

        for reference in participants.iter().filter_map(|p| p.claim_msg_ref.clone()) {
            outcome.retract(reference);
        }
        participants_repo::delete_by_match(txn, match_id).await?;

        if let Some(reference) = m.poll_ref.clone() {
            matches_repo::set_poll_ref(txn, match_id, None).await?;
            outcome.retract(reference);
        }
        if let Some(reference) = m.formed_notice_ref.clone() {
            matches_repo::set_formed_notice_ref(txn, match_id, None).await?;
            outcome.retract(reference);
        }
        if let Some(reference) = m.submit_notice_ref.clone() {
            matches_repo::set_submit_notice_ref(txn, match_id, None).await?;
            outcome.retract(reference);
        }

        for task_type in [TaskType::MatchFormed, TaskType::SubmitTimeout] {
            let key = TaskKey::new(task_type, match_id);
            tasks_repo::cancel(txn, key).await?;
            outcome.disarm(key);
        }

        matches_repo::update_votes(txn, match_id, 0).await?;
        matches_repo::update_state(txn, match_id, MatchState::Cancelled).await?;

        info!(trace_id = %ctx.trace_id, match_id, "match cancelled by owner");
        Ok(outcome)
    }

    /// Read the aggregate for the API surface.
    pub async fn get_match(
        &self,
        txn: &DatabaseTransaction,
        match_id: i64,
    ) -> Result<(Match, Vec<Participant>), AppError> {
        let m = matches_repo::require_match(txn, match_id).await?;
        let participants = participants_repo::find_by_match(txn, match_id).await?;
        Ok((m, participants))
    }
}
