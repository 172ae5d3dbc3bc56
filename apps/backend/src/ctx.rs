//! Per-operation diagnostic context.
//!
//! Every entry point — an HTTP request or a scheduler firing — creates a
//! `Ctx` and passes it down explicitly. Services attach `ctx.trace_id` to
//! their log events so one operation's records correlate across layers.

use ulid::Ulid;

#[derive(Debug, Clone)]
pub struct Ctx {
    pub trace_id: String,
}

impl Ctx {
    /// Context for an inbound HTTP request; the trace id comes from the
    /// request-trace middleware.
    pub fn for_request(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
        }
    }

    /// Context for a scheduler firing or other background work.
    pub fn for_task(label: &str) -> Self {
        Self {
            trace_id: format!("{label}-{}", Ulid::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_contexts_are_unique() {
        let a = Ctx::for_task("submit-timeout");
        let b = Ctx::for_task("submit-timeout");
        assert_ne!(a.trace_id, b.trace_id);
        assert!(a.trace_id.starts_with("submit-timeout-"));
    }
}
