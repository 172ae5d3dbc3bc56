use crate::entities::matches::GameMode;

/// Fields required to create a match row.
#[derive(Debug, Clone)]
pub struct MatchCreate {
    pub game_mode: GameMode,
    pub owner_id: Option<i64>,
    pub poll_ref: Option<String>,
}

impl MatchCreate {
    pub fn new(game_mode: GameMode, owner_id: Option<i64>, poll_ref: Option<String>) -> Self {
        Self {
            game_mode,
            owner_id,
            poll_ref,
        }
    }
}
