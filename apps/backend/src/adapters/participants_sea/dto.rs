/// Fields required to create a participant row.
#[derive(Debug, Clone)]
pub struct ParticipantCreate {
    pub match_id: i64,
    pub player_id: i64,
}

impl ParticipantCreate {
    pub fn new(match_id: i64, player_id: i64) -> Self {
        Self {
            match_id,
            player_id,
        }
    }
}
