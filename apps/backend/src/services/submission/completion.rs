//! Workflow completion: both passes done, confirm and open the accept
//! window.

use sea_orm::DatabaseTransaction;
use time::OffsetDateTime;
use tracing::info;

use crate::ctx::Ctx;
use crate::entities::matches::MatchState;
use crate::entities::scheduled_tasks::TaskType;
use crate::error::AppError;
use crate::repos::matches::Match;
use crate::repos::tasks::TaskKey;
use crate::repos::{matches as matches_repo, participants as participants_repo, players as players_repo, tasks as tasks_repo};
use crate::services::outcome::Outcome;
use crate::services::settings::SettingKey;
use crate::state::app_state::AppState;

/// Atomically confirm the pending result and schedule the dispute window.
///
/// `confirmed_place` is written for every participant in one statement -
/// it is never partially set. The SUBMIT_TIMEOUT safety net is cancelled
/// and SUBMIT_ACCEPT_TIMEOUT armed in the same transaction.
pub(super) async fn finalize(
    ctx: &Ctx,
    state: &AppState,
    txn: &DatabaseTransaction,
    m: &Match,
) -> Result<Outcome, AppError> {
    participants_repo::confirm_places(txn, m.id).await?;
    matches_repo::update_state(txn, m.id, MatchState::Submitted).await?;

    let mut outcome = Outcome::new();

    let submit_key = TaskKey::new(TaskType::SubmitTimeout, m.id);
    tasks_repo::cancel(txn, submit_key).await?;
    outcome.disarm(submit_key);

    let grace = state.settings.duration(txn, SettingKey::AcceptTimeout).await;
    let due_at = OffsetDateTime::now_utc() + grace;
    let accept_key = TaskKey::new(TaskType::SubmitAcceptTimeout, m.id);
    tasks_repo::schedule(txn, accept_key, due_at).await?;
    outcome.arm(accept_key, due_at);

    if let Some(reference) = &m.submit_notice_ref {
        matches_repo::set_submit_notice_ref(txn, m.id, None).await?;
        outcome.retract(reference.clone());
    }

    // Final ranking, lowest place first, to the room and to each player.
    let participants = participants_repo::find_by_match(txn, m.id).await?;
    let mut ranked: Vec<_> = participants
        .iter()
        .filter_map(|p| p.candidate_place.map(|place| (place, p)))
        .collect();
    ranked.sort_by_key(|(place, _)| *place);

    let mut lines = Vec::with_capacity(ranked.len());
    for (place, p) in &ranked {
        let player = players_repo::require(txn, p.player_id).await?;
        lines.push(format!("{place}. {}", player.display_name));
        outcome.send(
            format!("player:{}", player.external_id),
            format!("Match #{}: you finished at place {place}.", m.id),
        );
    }

    let spec = crate::domain::modes::mode_spec(m.game_mode)?;
    outcome.send(
        spec.destination,
        format!("Match #{} results submitted:\n{}", m.id, lines.join("\n")),
    );

    info!(trace_id = %ctx.trace_id, match_id = m.id, "submission complete, accept window open");
    Ok(outcome)
}
