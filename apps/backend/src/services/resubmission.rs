//! Resubmission controller: reset the submission round and enforce the
//! retry limit.

use sea_orm::DatabaseTransaction;
use tracing::info;

use crate::ctx::Ctx;
use crate::entities::matches::MatchState;
use crate::entities::scheduled_tasks::TaskType;
use crate::error::AppError;
use crate::errors::domain::{DomainError, ValidationKind};
use crate::repos::tasks::TaskKey;
use crate::repos::{matches as matches_repo, participants as participants_repo, players as players_repo, tasks as tasks_repo};
use crate::services::notices::{Notice, RefSlot};
use crate::services::outcome::Outcome;
use crate::services::settings::SettingKey;
use crate::services::submission::ensure_requester_allowed;
use crate::state::app_state::AppState;

/// Resubmission service.
pub struct ResubmissionService;

impl ResubmissionService {
    /// Discard the current submission round and re-enter the PLACE pass
    /// from empty, as one unit.
    ///
    /// `delegate_back` keeps the prior submitter in charge instead of
    /// handing the exchange to the requester.
    pub async fn resubmit(
        &self,
        ctx: &Ctx,
        state: &AppState,
        txn: &DatabaseTransaction,
        match_id: i64,
        requester_id: i64,
        delegate_back: bool,
    ) -> Result<Outcome, AppError> {
        let m = matches_repo::require_match_for_update(txn, match_id).await?;
        if !matches!(m.state, MatchState::OnSubmit | MatchState::Submitted) {
            return Err(DomainError::validation(
                ValidationKind::StateMismatch,
                format!("Nothing to resubmit in state {:?}", m.state),
            )
            .into());
        }
        ensure_requester_allowed(txn, &m, requester_id).await?;

        let limit = state.settings.u32(txn, SettingKey::ResubmitLimit).await as i32;
        if m.resubmit_count >= limit {
            return Err(DomainError::validation(
                ValidationKind::ResubmitLimitExceeded,
                format!("Resubmit limit of {limit} reached"),
            )
            .into());
        }

        // Collect retractable handles before the claims are wiped.
        let participants = participants_repo::find_by_match(txn, match_id).await?;
        let claim_refs: Vec<String> = participants
            .iter()
            .filter_map(|p| p.claim_msg_ref.clone())
            .collect();

        participants_repo::clear_claims(txn, match_id).await?;

        let submitter_id = if delegate_back {
            m.submitter_id
        } else {
            Some(requester_id)
        };
        matches_repo::set_resubmit(txn, match_id, m.resubmit_count + 1, submitter_id).await?;

        let mut outcome = Outcome::new();

        let accept_key = TaskKey::new(TaskType::SubmitAcceptTimeout, match_id);
        tasks_repo::cancel(txn, accept_key).await?;
        outcome.disarm(accept_key);

        for reference in claim_refs {
            outcome.retract(reference);
        }
        if let Some(reference) = m.submit_notice_ref {
            matches_repo::set_submit_notice_ref(txn, match_id, None).await?;
            outcome.retract(reference);
        }

        // Fresh guided prompt for the new round.
        let spec = crate::domain::modes::mode_spec(m.game_mode)?;
        let mut buttons = Vec::with_capacity(participants.len());
        for p in &participants {
            let player = players_repo::require(txn, p.player_id).await?;
            buttons.push(player.display_name);
        }
        outcome.notices.push(Notice::Send {
            target: spec.destination.to_string(),
            text: format!(
                "Match #{match_id}: results discarded (attempt {} of {limit}). Claim places again.",
                m.resubmit_count + 1
            ),
            buttons: Some(buttons),
            slot: Some(RefSlot::SubmitNotice(match_id)),
        });

        info!(
            trace_id = %ctx.trace_id,
            match_id,
            requester_id,
            resubmit_count = m.resubmit_count + 1,
            delegate_back,
            "submission round reset"
        );
        Ok(outcome)
    }
}
