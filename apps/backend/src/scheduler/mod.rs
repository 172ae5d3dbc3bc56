//! Durable task scheduler: in-process timer runtime over the persisted
//! task store.
//!
//! The store (`repos::tasks`) is the source of truth. Services upsert or
//! cancel task rows inside the transaction of the mutation they guard and
//! hand the in-process side effects back as [`TimerCmd`]s, applied only
//! after the transaction commits. On fire, the status row is
//! compare-and-set SCHEDULED → RUNNING, which makes late timers after a
//! `cancel` or a reschedule harmless.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use sea_orm::DatabaseConnection;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::ctx::Ctx;
use crate::entities::scheduled_tasks::TaskStatus;
use crate::repos::tasks;
use crate::repos::tasks::TaskKey;

pub mod handlers;
pub mod recovery;

pub use handlers::{TaskHandler, TaskRouter};
pub use recovery::RecoveryReport;

/// In-process side effect of a committed scheduling decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCmd {
    Arm { key: TaskKey, due_at: OffsetDateTime },
    Disarm { key: TaskKey },
}

struct ArmedTimer {
    generation: u64,
    token: CancellationToken,
}

pub struct Scheduler {
    db: DatabaseConnection,
    timers: DashMap<TaskKey, ArmedTimer>,
    generations: AtomicU64,
    handler: OnceCell<Arc<dyn TaskHandler>>,
    // Handle to self for the spawned timer tasks.
    this: Weak<Scheduler>,
}

impl Scheduler {
    pub fn new(db: DatabaseConnection) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            db,
            timers: DashMap::new(),
            generations: AtomicU64::new(0),
            handler: OnceCell::new(),
            this: this.clone(),
        })
    }

    /// Register the task handler. Late-bound once at startup because the
    /// handler needs the full application state, which owns this scheduler.
    pub fn set_handler(&self, handler: Arc<dyn TaskHandler>) {
        if self.handler.set(handler).is_err() {
            debug!("scheduler handler already set");
        }
    }

    /// Apply in-process timer effects after their transaction committed.
    pub fn apply(&self, cmds: Vec<TimerCmd>) {
        for cmd in cmds {
            match cmd {
                TimerCmd::Arm { key, due_at } => self.arm(key, due_at),
                TimerCmd::Disarm { key } => self.disarm(key),
            }
        }
    }

    /// Arm (or re-arm) the in-process timer for `key`. A previously armed
    /// timer for the same key is cancelled first.
    pub fn arm(&self, key: TaskKey, due_at: OffsetDateTime) {
        let Some(scheduler) = self.this.upgrade() else {
            return;
        };

        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        if let Some(old) = self.timers.insert(
            key,
            ArmedTimer {
                generation,
                token: token.clone(),
            },
        ) {
            old.token.cancel();
        }

        debug!(%key, %due_at, "timer armed");

        tokio::spawn(async move {
            let delay = due_at - OffsetDateTime::now_utc();
            let sleep = std::time::Duration::try_from(delay).unwrap_or_default();
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(%key, "timer disarmed before firing");
                }
                _ = tokio::time::sleep(sleep) => {
                    // Drop our registry entry unless a newer timer replaced it
                    scheduler
                        .timers
                        .remove_if(&key, |_, armed| armed.generation == generation);
                    scheduler.fire(key).await;
                }
            }
        });
    }

    /// Cancel the in-process timer if one is armed. Race-tolerant: the
    /// timer may already be firing, in which case the status CAS skips it.
    pub fn disarm(&self, key: TaskKey) {
        if let Some((_, armed)) = self.timers.remove(&key) {
            armed.token.cancel();
            debug!(%key, "timer disarmed");
        }
    }

    /// Number of armed in-process timers.
    pub fn armed_count(&self) -> usize {
        self.timers.len()
    }

    /// Fire `key`: claim the row, run the handler, record the terminal
    /// status. Handler errors are logged and recorded, never retried here;
    /// a handler that wants a retry re-schedules explicitly.
    pub async fn fire(&self, key: TaskKey) {
        let ctx = Ctx::for_task(&format!("task-{:?}", key.task_type));

        match tasks::mark_running(&self.db, key).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(trace_id = %ctx.trace_id, %key, "stale or cancelled firing, skipping");
                return;
            }
            Err(e) => {
                error!(trace_id = %ctx.trace_id, %key, error = %e, "failed to claim task row");
                return;
            }
        }

        let Some(handler) = self.handler.get().cloned() else {
            error!(trace_id = %ctx.trace_id, %key, "no task handler registered");
            let _ = tasks::mark_done(&self.db, key, TaskStatus::Failed).await;
            return;
        };

        let outcome = handler.handle(&ctx, key).await;
        let status = match &outcome {
            Ok(()) => TaskStatus::Finished,
            Err(e) => {
                error!(trace_id = %ctx.trace_id, %key, error = %e, "task handler failed");
                TaskStatus::Failed
            }
        };

        if let Err(e) = tasks::mark_done(&self.db, key, status).await {
            error!(trace_id = %ctx.trace_id, %key, error = %e, "failed to record task status");
            return;
        }

        info!(trace_id = %ctx.trace_id, %key, ?status, "task completed");
    }
}
