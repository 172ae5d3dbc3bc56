//! Outward notification dispatch.
//!
//! Runs strictly after the authoritative mutation commits. Send failures
//! are logged and swallowed; internal state is the single source of truth
//! and messages are best-effort.

use tracing::{info, warn};

use crate::ctx::Ctx;
use crate::messaging::MessageRef;
use crate::repos::{matches as matches_repo, participants as participants_repo};
use crate::state::app_state::AppState;

/// Where to persist the transport handle a send returns, so a later flow
/// can retract the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefSlot {
    Poll(i64),
    FormedNotice(i64),
    SubmitNotice(i64),
    ClaimMsg(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Send {
        target: String,
        text: String,
        buttons: Option<Vec<String>>,
        slot: Option<RefSlot>,
    },
    Retract {
        reference: String,
    },
}

impl Notice {
    pub fn send(target: impl Into<String>, text: impl Into<String>) -> Self {
        Notice::Send {
            target: target.into(),
            text: text.into(),
            buttons: None,
            slot: None,
        }
    }

    pub fn send_tracked(
        target: impl Into<String>,
        text: impl Into<String>,
        slot: RefSlot,
    ) -> Self {
        Notice::Send {
            target: target.into(),
            text: text.into(),
            buttons: None,
            slot: Some(slot),
        }
    }

    pub fn retract(reference: impl Into<String>) -> Self {
        Notice::Retract {
            reference: reference.into(),
        }
    }
}

/// Fire every notice in order. Never fails the caller.
pub async fn dispatch(ctx: &Ctx, state: &AppState, notices: Vec<Notice>) {
    for notice in notices {
        match notice {
            Notice::Send {
                target,
                text,
                buttons,
                slot,
            } => match state.messenger.send(&target, &text, buttons).await {
                Ok(reference) => {
                    info!(trace_id = %ctx.trace_id, target, reference = %reference.0, "notice sent");
                    if let Some(slot) = slot {
                        store_reference(state, slot, &reference).await;
                    }
                }
                Err(e) => {
                    warn!(trace_id = %ctx.trace_id, target, error = %e, "notice send failed");
                }
            },
            Notice::Retract { reference } => {
                let handle = MessageRef(reference);
                if let Err(e) = state.messenger.delete(&handle).await {
                    warn!(trace_id = %ctx.trace_id, reference = %handle.0, error = %e, "notice retraction failed");
                }
            }
        }
    }
}

async fn store_reference(state: &AppState, slot: RefSlot, reference: &MessageRef) {
    let value = Some(reference.0.clone());
    let stored = match slot {
        RefSlot::Poll(match_id) => matches_repo::set_poll_ref(&state.db, match_id, value)
            .await
            .map(|_| ()),
        RefSlot::FormedNotice(match_id) => {
            matches_repo::set_formed_notice_ref(&state.db, match_id, value)
                .await
                .map(|_| ())
        }
        RefSlot::SubmitNotice(match_id) => {
            matches_repo::set_submit_notice_ref(&state.db, match_id, value)
                .await
                .map(|_| ())
        }
        RefSlot::ClaimMsg(participant_id) => {
            participants_repo::set_claim_msg_ref(&state.db, participant_id, value)
                .await
                .map(|_| ())
        }
    };

    if let Err(e) = stored {
        warn!(?slot, error = %e, "failed to store message reference");
    }
}
