use sea_orm::Iterable;

use super::modes::{mode_spec, required_players};
use crate::entities::matches::GameMode;

#[test]
fn every_mode_has_a_routing_entry() {
    for mode in GameMode::iter() {
        let spec = mode_spec(mode).expect("mode must be routed");
        assert!(spec.required_players >= 2);
        assert!(!spec.destination.is_empty());
    }
}

#[test]
fn standard_mode_needs_four_players() {
    assert_eq!(required_players(GameMode::Standard).unwrap(), 4);
}
