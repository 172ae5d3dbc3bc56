use proptest::prelude::*;

use super::placement::{lowest_open_rank, missing_place, next_place, AutoFill};

#[test]
fn next_place_counts_from_one() {
    assert_eq!(next_place(0), 1);
    assert_eq!(next_place(1), 2);
    assert_eq!(next_place(3), 4);
}

#[test]
fn leader_slot_picks_lowest_rank_without_leader() {
    // Participants in aggregate order hold places 3, 1, 4, 2; rank 1 has a
    // leader already, so rank 2 (index 3) is next.
    let ranks = [
        (Some(3), false),
        (Some(1), true),
        (Some(4), false),
        (Some(2), false),
    ];
    assert_eq!(lowest_open_rank(&ranks), Some(3));
}

#[test]
fn leader_slot_ignores_unplaced_participants() {
    let ranks = [(None, false), (Some(2), false)];
    assert_eq!(lowest_open_rank(&ranks), Some(1));
}

#[test]
fn leader_slot_none_when_all_assigned() {
    let ranks = [(Some(1), true), (Some(2), true)];
    assert_eq!(lowest_open_rank(&ranks), None);
}

#[test]
fn missing_place_fills_single_gap() {
    // Three of four placed, rank 3 unclaimed
    let places = [Some(1), Some(2), None, Some(4)];
    assert_eq!(
        missing_place(&places),
        AutoFill::Fill { index: 2, place: 3 }
    );
}

#[test]
fn missing_place_never_infers_rank_one() {
    let places = [None, Some(2), Some(3), Some(4)];
    assert_eq!(missing_place(&places), AutoFill::RankOneMissing);
}

#[test]
fn missing_place_requires_exactly_one_gap() {
    assert_eq!(
        missing_place(&[Some(1), None, None, Some(4)]),
        AutoFill::NotApplicable
    );
    assert_eq!(
        missing_place(&[Some(1), Some(2), Some(3), Some(4)]),
        AutoFill::NotApplicable
    );
}

proptest! {
    /// Claiming in any order over n participants yields places {1..n} in
    /// call order.
    #[test]
    fn place_sequence_is_call_order(n in 1usize..12) {
        let mut places: Vec<Option<i16>> = vec![None; n];
        for k in 0..n {
            let claimed = places.iter().filter(|p| p.is_some()).count();
            places[k] = Some(next_place(claimed));
        }
        let got: Vec<i16> = places.into_iter().map(|p| p.unwrap()).collect();
        let want: Vec<i16> = (1..=n as i16).collect();
        prop_assert_eq!(got, want);
    }

    /// Leader assignment fills ranks bottom-up no matter the claim order.
    #[test]
    fn leaders_fill_ranks_bottom_up(keys in prop::collection::vec(any::<u32>(), 2..10)) {
        // Derive a place permutation from the random keys.
        let n = keys.len();
        let mut perm: Vec<usize> = (0..n).collect();
        perm.sort_by_key(|&i| keys[i]);

        // Participants hold places equal to perm[i] + 1 (a permutation).
        let mut ranks: Vec<(Option<i16>, bool)> =
            perm.iter().map(|p| (Some(*p as i16 + 1), false)).collect();

        let mut filled_places = Vec::new();
        while let Some(idx) = lowest_open_rank(&ranks) {
            filled_places.push(ranks[idx].0.unwrap());
            ranks[idx].1 = true;
        }

        let want: Vec<i16> = (1..=n as i16).collect();
        prop_assert_eq!(filled_places, want);
    }
}
