//! Startup recovery for the persisted task store.
//!
//! The process must not start serving with an unknown set of outstanding
//! timers, so a failure to load the rows is fatal to startup.

use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use super::Scheduler;
use crate::error::AppError;
use crate::repos::tasks;

/// Grace delay for work that came due while the process was down. Firing
/// overdue tasks in a burst at t=0 would race subsystems that are still
/// initializing.
pub const RECOVERY_GRACE: Duration = Duration::minutes(1);

/// Effective due time for a recovered row: original time if still in the
/// future, otherwise `now + RECOVERY_GRACE`. Never earlier than the grace
/// deadline for overdue rows.
pub fn recovery_due(now: OffsetDateTime, due_at: OffsetDateTime) -> OffsetDateTime {
    if due_at > now {
        due_at
    } else {
        now + RECOVERY_GRACE
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Rows re-armed with an in-process timer.
    pub rearmed: usize,
    /// One-shot markers finished without executing.
    pub finished_markers: usize,
}

impl Scheduler {
    /// Re-arm every SCHEDULED/RUNNING row from the store.
    ///
    /// RUNNING rows are treated like SCHEDULED ones: the process died
    /// mid-execution and the handler's own idempotency re-check makes a
    /// second run safe.
    pub async fn recover(&self) -> Result<RecoveryReport, AppError> {
        let now = OffsetDateTime::now_utc();
        let active = tasks::find_active(&self.db).await?;

        let mut report = RecoveryReport::default();
        for task in active {
            let key = task.key();

            if task.task_type.is_one_shot_marker() {
                tasks::mark_finished_unexecuted(&self.db, key).await?;
                report.finished_markers += 1;
                info!(%key, "one-shot marker finished without executing");
                continue;
            }

            let due_at = recovery_due(now, task.due_at);
            if due_at != task.due_at {
                warn!(%key, original = %task.due_at, deferred = %due_at, "overdue task deferred by recovery grace");
            }
            tasks::rearm(&self.db, key, due_at).await?;
            self.arm(key, due_at);
            report.rearmed += 1;
        }

        info!(
            rearmed = report.rearmed,
            finished_markers = report.finished_markers,
            "scheduler recovery complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn future_due_times_are_kept() {
        let now = OffsetDateTime::now_utc();
        let due = now + Duration::minutes(10);
        assert_eq!(recovery_due(now, due), due);
    }

    #[test]
    fn overdue_tasks_get_the_grace_delay() {
        let now = OffsetDateTime::now_utc();
        let due = now - Duration::hours(2);
        assert_eq!(recovery_due(now, due), now + RECOVERY_GRACE);
    }

    #[test]
    fn tasks_due_exactly_now_are_deferred() {
        let now = OffsetDateTime::now_utc();
        assert_eq!(recovery_due(now, now), now + RECOVERY_GRACE);
    }
}
