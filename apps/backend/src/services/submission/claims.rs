//! Place and leader claims.

use sea_orm::DatabaseTransaction;
use time::OffsetDateTime;
use tracing::info;

use super::{completion, ensure_quorum, ensure_requester_allowed, ensure_submittable_state, SubmissionService};
use crate::ctx::Ctx;
use crate::domain::placement;
use crate::entities::matches::MatchState;
use crate::entities::scheduled_tasks::TaskType;
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};
use crate::repos::tasks::TaskKey;
use crate::repos::{matches as matches_repo, participants as participants_repo, players as players_repo, tasks as tasks_repo};
use crate::services::notices::RefSlot;
use crate::services::outcome::Outcome;
use crate::services::settings::SettingKey;
use crate::state::app_state::AppState;

impl SubmissionService {
    /// PLACE pass: assign the next place, in call order, to `participant_id`.
    ///
    /// The first accepted claim moves the match NEW → ON_SUBMIT and arms
    /// the SUBMIT_TIMEOUT safety net in the same transaction.
    pub async fn claim_place(
        &self,
        ctx: &Ctx,
        state: &AppState,
        txn: &DatabaseTransaction,
        match_id: i64,
        participant_id: i64,
        requester_id: i64,
    ) -> Result<Outcome, AppError> {
        let m = matches_repo::require_match_for_update(txn, match_id).await?;
        ensure_submittable_state(&m)?;
        ensure_quorum(&m).await?;
        ensure_requester_allowed(txn, &m, requester_id).await?;

        let participant = participants_repo::require(txn, participant_id).await?;
        if participant.match_id != match_id {
            return Err(DomainError::not_found(
                NotFoundKind::Participant,
                format!("Participant {participant_id} does not belong to match {match_id}"),
            )
            .into());
        }

        // Claims are immutable once set; a duplicate is a conflict, never an
        // overwrite.
        if let Some(held) = participant.candidate_place {
            return Err(DomainError::conflict(
                ConflictKind::PlaceAlreadyClaimed,
                format!("Participant {participant_id} already holds place {held}"),
            )
            .into());
        }

        // Serialized per match by the row lock taken above: the count and
        // the write commit atomically.
        let claimed = participants_repo::count_claimed(txn, match_id).await? as usize;
        let place = placement::next_place(claimed);
        participants_repo::set_candidate_place(txn, participant_id, place).await?;

        let mut outcome = Outcome::new();
        if m.state == MatchState::New {
            matches_repo::update_state(txn, match_id, MatchState::OnSubmit).await?;
            let window = state.settings.duration(txn, SettingKey::SubmitTimeout).await;
            let due_at = OffsetDateTime::now_utc() + window;
            let key = TaskKey::new(TaskType::SubmitTimeout, match_id);
            tasks_repo::schedule(txn, key, due_at).await?;
            outcome.arm(key, due_at);
        }

        let spec = crate::domain::modes::mode_spec(m.game_mode)?;
        let player = players_repo::require(txn, participant.player_id).await?;
        outcome.notices.push(crate::services::notices::Notice::Send {
            target: spec.destination.to_string(),
            text: format!("Match #{match_id}: {} takes place {place}.", player.display_name),
            buttons: None,
            slot: Some(RefSlot::ClaimMsg(participant_id)),
        });

        let total = participants_repo::count_by_match(txn, match_id).await? as usize;
        if claimed + 1 == total {
            outcome.send(
                spec.destination,
                format!("Match #{match_id}: all places claimed. Now assign leaders, lowest place first."),
            );
            info!(trace_id = %ctx.trace_id, match_id, "place pass complete");
        }

        info!(trace_id = %ctx.trace_id, match_id, participant_id, place, "place claimed");
        Ok(outcome)
    }

    /// LEADER pass: assign `leader_id` to the lowest-ranked participant
    /// without a leader. Slot is chosen by rank, not call order.
    pub async fn claim_leader(
        &self,
        ctx: &Ctx,
        state: &AppState,
        txn: &DatabaseTransaction,
        match_id: i64,
        leader_id: i64,
        requester_id: i64,
    ) -> Result<Outcome, AppError> {
        let m = matches_repo::require_match_for_update(txn, match_id).await?;
        if m.state != MatchState::OnSubmit {
            return Err(DomainError::validation(
                ValidationKind::StateMismatch,
                format!("Leader claims are only accepted during submission (state {:?})", m.state),
            )
            .into());
        }
        ensure_quorum(&m).await?;
        ensure_requester_allowed(txn, &m, requester_id).await?;

        let participants = participants_repo::find_by_match(txn, match_id).await?;
        let unplaced = participants
            .iter()
            .filter(|p| p.candidate_place.is_none())
            .count();
        if unplaced > 0 {
            return Err(DomainError::validation(
                ValidationKind::PlacePassIncomplete,
                format!("{unplaced} participants have no place yet"),
            )
            .into());
        }

        // Leaders are pairwise distinct within the submission round.
        if let Some(holder) = participants.iter().find(|p| p.leader_id == Some(leader_id)) {
            return Err(DomainError::conflict(
                ConflictKind::LeaderTaken,
                format!(
                    "Leader {leader_id} is already assigned to place {}",
                    holder.candidate_place.unwrap_or_default()
                ),
            )
            .into());
        }

        let ranks: Vec<(Option<i16>, bool)> = participants
            .iter()
            .map(|p| (p.candidate_place, p.leader_id.is_some()))
            .collect();
        let Some(slot) = placement::lowest_open_rank(&ranks) else {
            return Err(DomainError::validation(
                ValidationKind::StateMismatch,
                "Every participant already has a leader",
            )
            .into());
        };

        let target = &participants[slot];
        participants_repo::set_leader(txn, target.id, leader_id).await?;
        info!(
            trace_id = %ctx.trace_id,
            match_id,
            leader_id,
            participant_id = target.id,
            place = target.candidate_place.unwrap_or_default(),
            "leader assigned"
        );

        let assigned = participants.iter().filter(|p| p.leader_id.is_some()).count() + 1;
        let mut outcome = Outcome::new();
        if assigned == participants.len() {
            // Both passes complete: confirm and hand off to the accept
            // window.
            let fresh = matches_repo::require_match(txn, match_id).await?;
            outcome.merge(completion::finalize(ctx, state, txn, &fresh).await?);
        }

        Ok(outcome)
    }
}
