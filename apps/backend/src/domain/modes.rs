//! Game-mode routing table.
//!
//! Kept as data rather than a `match` so adding a mode is one table row and
//! a missing row is a loud lookup failure instead of a silently wrong arm.

use crate::entities::matches::GameMode;
use crate::errors::domain::{DomainError, ValidationKind};

/// Per-mode coordination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSpec {
    pub mode: GameMode,
    /// Positive votes needed before the match counts as formed.
    pub required_players: usize,
    /// Outward routing key for notices about matches of this mode.
    pub destination: &'static str,
}

pub const MODES: &[ModeSpec] = &[
    ModeSpec {
        mode: GameMode::Duel,
        required_players: 2,
        destination: "room:duel",
    },
    ModeSpec {
        mode: GameMode::Standard,
        required_players: 4,
        destination: "room:standard",
    },
    ModeSpec {
        mode: GameMode::Grand,
        required_players: 6,
        destination: "room:grand",
    },
];

/// Look up the spec for a mode.
pub fn mode_spec(mode: GameMode) -> Result<&'static ModeSpec, DomainError> {
    MODES.iter().find(|s| s.mode == mode).ok_or_else(|| {
        DomainError::validation(
            ValidationKind::Other("UNROUTED_MODE".into()),
            format!("No routing entry for mode {mode:?}"),
        )
    })
}

pub fn required_players(mode: GameMode) -> Result<usize, DomainError> {
    Ok(mode_spec(mode)?.required_players)
}
