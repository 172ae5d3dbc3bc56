//! Deferred side effects of a committed mutation.
//!
//! Services mutate the aggregate inside a transaction and describe their
//! outward effects here; the boundary (HTTP handler or task router)
//! applies timer commands and dispatches notices only after the
//! transaction commits. Messaging is best-effort and never rolls the
//! mutation back.

use time::OffsetDateTime;

use crate::repos::tasks::TaskKey;
use crate::scheduler::TimerCmd;
use crate::services::notices::{Notice, RefSlot};

#[derive(Debug, Default)]
pub struct Outcome {
    pub timers: Vec<TimerCmd>,
    pub notices: Vec<Notice>,
}

impl Outcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, key: TaskKey, due_at: OffsetDateTime) {
        self.timers.push(TimerCmd::Arm { key, due_at });
    }

    pub fn disarm(&mut self, key: TaskKey) {
        self.timers.push(TimerCmd::Disarm { key });
    }

    pub fn send(&mut self, target: impl Into<String>, text: impl Into<String>) {
        self.notices.push(Notice::send(target, text));
    }

    pub fn send_tracked(
        &mut self,
        target: impl Into<String>,
        text: impl Into<String>,
        slot: RefSlot,
    ) {
        self.notices.push(Notice::send_tracked(target, text, slot));
    }

    pub fn retract(&mut self, reference: impl Into<String>) {
        self.notices.push(Notice::retract(reference));
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty() && self.notices.is_empty()
    }

    pub fn merge(&mut self, other: Outcome) {
        self.timers.extend(other.timers);
        self.notices.extend(other.notices);
    }
}
