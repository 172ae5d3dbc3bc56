//! Task dispatch: maps a fired task row to the service that owns it.

use async_trait::async_trait;
use tracing::info;

use crate::ctx::Ctx;
use crate::entities::scheduled_tasks::TaskType;
use crate::error::AppError;
use crate::repos::tasks::TaskKey;
use crate::services::finisher::Finisher;
use crate::services::notices;
use crate::services::votes::VoteService;
use crate::state::app_state::AppState;

#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, ctx: &Ctx, key: TaskKey) -> Result<(), AppError>;
}

/// Production handler: routes every task type to its owning service.
///
/// Each branch runs the service's own transaction, then applies timer
/// commands and dispatches notices — mutation strictly before messaging.
pub struct TaskRouter {
    state: AppState,
}

impl TaskRouter {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl TaskHandler for TaskRouter {
    async fn handle(&self, ctx: &Ctx, key: TaskKey) -> Result<(), AppError> {
        let state = &self.state;
        let outcome = match key.task_type {
            TaskType::MatchFormed => {
                VoteService
                    .on_match_formed(ctx, state, key.entity_id)
                    .await?
            }
            TaskType::SubmitTimeout => {
                Finisher.on_submit_timeout(ctx, state, key.entity_id).await?
            }
            TaskType::SubmitAcceptTimeout => {
                Finisher.on_accept_timeout(ctx, state, key.entity_id).await?
            }
            TaskType::ShutdownNotice => {
                // Best-effort farewell; only meaningful in the process that
                // scheduled it, recovery finishes stragglers unexecuted.
                info!(trace_id = %ctx.trace_id, "shutdown notice firing");
                let _ = self
                    .state
                    .messenger
                    .send("room:system", "Coordinator is going down for a restart.", None)
                    .await;
                return Ok(());
            }
        };

        state.scheduler.apply(outcome.timers);
        notices::dispatch(ctx, state, outcome.notices).await;
        Ok(())
    }
}
