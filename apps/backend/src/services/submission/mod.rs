//! Submission workflow - sequential ordinal assignment over the match
//! aggregate.
//!
//! One algorithm, run twice per match: the PLACE pass (slot = call order)
//! and the LEADER pass (slot = rank order). Each accepted claim is one
//! transaction serialized on the match row; timers guarding the flow are
//! persisted in the same transaction.

mod claims;
mod completion;

use sea_orm::DatabaseTransaction;
use tracing::info;

use crate::ctx::Ctx;
use crate::entities::matches::MatchState;
use crate::error::AppError;
use crate::errors::domain::{DomainError, ValidationKind};
use crate::repos::matches::Match;
use crate::repos::{participants as participants_repo, players as players_repo};
use crate::services::notices::{Notice, RefSlot};
use crate::services::outcome::Outcome;

/// Submission workflow service.
#[derive(Default)]
pub struct SubmissionService;

impl SubmissionService {
    /// Open (or re-open) the guided submission exchange for a match.
    ///
    /// The requester becomes the designated submitter. No timer is armed
    /// here; SUBMIT_TIMEOUT starts with the first accepted claim.
    pub async fn request_submit(
        &self,
        ctx: &Ctx,
        txn: &DatabaseTransaction,
        match_id: i64,
        requester_id: i64,
    ) -> Result<Outcome, AppError> {
        let m = crate::repos::matches::require_match_for_update(txn, match_id).await?;
        ensure_submittable_state(&m)?;
        ensure_quorum(&m).await?;
        ensure_requester_allowed(txn, &m, requester_id).await?;

        crate::repos::matches::set_submitter(txn, match_id, Some(requester_id)).await?;

        let spec = crate::domain::modes::mode_spec(m.game_mode)?;
        let participants = participants_repo::find_by_match(txn, match_id).await?;
        let mut buttons = Vec::with_capacity(participants.len());
        for p in &participants {
            let player = players_repo::require(txn, p.player_id).await?;
            buttons.push(player.display_name);
        }

        let mut outcome = Outcome::new();
        if let Some(reference) = m.submit_notice_ref {
            crate::repos::matches::set_submit_notice_ref(txn, match_id, None).await?;
            outcome.retract(reference);
        }
        outcome.notices.push(Notice::Send {
            target: spec.destination.to_string(),
            text: format!(
                "Match #{match_id}: results submission started. Claim places in finish order."
            ),
            buttons: Some(buttons),
            slot: Some(RefSlot::SubmitNotice(match_id)),
        });

        info!(trace_id = %ctx.trace_id, match_id, requester_id, "submission exchange opened");
        Ok(outcome)
    }
}

/// PLACE-pass entry states: NEW before the first claim, ON_SUBMIT after.
pub(crate) fn ensure_submittable_state(m: &Match) -> Result<(), DomainError> {
    if !matches!(m.state, MatchState::New | MatchState::OnSubmit) {
        return Err(DomainError::validation(
            ValidationKind::StateMismatch,
            format!("Submission is not open in state {:?}", m.state),
        ));
    }
    Ok(())
}

pub(crate) async fn ensure_quorum(m: &Match) -> Result<(), DomainError> {
    let required = crate::domain::modes::required_players(m.game_mode)?;
    if (m.positive_votes as usize) < required {
        return Err(DomainError::validation(
            ValidationKind::QuorumNotReached,
            format!(
                "Match has {} of {required} required players",
                m.positive_votes
            ),
        ));
    }
    Ok(())
}

/// The requester must be a participant or the designated submitter.
pub(crate) async fn ensure_requester_allowed(
    txn: &DatabaseTransaction,
    m: &Match,
    requester_id: i64,
) -> Result<(), DomainError> {
    if m.submitter_id == Some(requester_id) {
        return Ok(());
    }
    let membership =
        participants_repo::find_by_match_and_player(txn, m.id, requester_id).await?;
    if membership.is_none() {
        return Err(DomainError::validation(
            ValidationKind::NotAParticipant,
            format!("Player {requester_id} is neither a participant nor the submitter"),
        ));
    }
    Ok(())
}
