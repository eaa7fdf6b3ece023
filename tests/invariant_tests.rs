//! Property tests for the arena and the reward bridge.

use osprey::mcts::Arena;
use osprey::reward::{centipawn_from_prob, winning_prob};
use osprey::MATE;
use proptest::prelude::*;

proptest! {
    #[test]
    fn winning_prob_is_a_probability(cp in -(MATE - 64)..=(MATE - 64)) {
        let p = winning_prob(cp);
        prop_assert!(p > 0.0 && p < 1.0, "cp {cp} gave p={p}");
    }

    #[test]
    fn winning_prob_is_monotone(a in -3000i32..=3000, b in -3000i32..=3000) {
        prop_assume!(a < b);
        prop_assert!(winning_prob(a) < winning_prob(b));
    }

    #[test]
    fn reward_bridge_round_trips_within_one_centipawn(cp in -2000i32..=2000) {
        let back = centipawn_from_prob(winning_prob(cp));
        prop_assert!((back - cp).abs() <= 1, "cp {cp} came back as {back}");
    }

    #[test]
    fn inverse_bridge_is_total(p in 0.0f64..=1.0) {
        let cp = centipawn_from_prob(p);
        prop_assert!((-MATE..=MATE).contains(&cp));
    }

    #[test]
    fn arena_allocations_are_aligned_and_disjoint(sizes in prop::collection::vec(1usize..200, 1..32)) {
        let mut arena = Arena::with_capacity(1 << 16);
        let mut previous_end = arena.current() as usize;
        for &size in &sizes {
            let ptr = arena.allocate(size).unwrap().as_ptr() as usize;
            prop_assert_eq!(ptr % 16, 0);
            prop_assert!(ptr >= previous_end, "allocation overlaps its predecessor");
            previous_end = ptr + size;
        }
    }

    #[test]
    fn arena_reset_restores_the_initial_cursor(sizes in prop::collection::vec(1usize..200, 1..32)) {
        let mut arena = Arena::with_capacity(1 << 16);
        let fresh = arena.allocate(8).unwrap();
        arena.reset();
        for &size in &sizes {
            arena.allocate(size).unwrap();
        }
        arena.reset();
        prop_assert_eq!(arena.size(), 0);
        let again = arena.allocate(8).unwrap();
        prop_assert_eq!(again.as_ptr(), fresh.as_ptr());
    }
}

#[test]
fn saturated_probabilities_hit_the_mate_sentinels() {
    assert_eq!(centipawn_from_prob(0.0), -MATE);
    assert_eq!(centipawn_from_prob(1.0), MATE);
}
