//! Rollout policies and playout simulation.
//!
//! A playout plays a bounded number of random plies from the current
//! position and scores what it reaches: an actual game end maps to the
//! exact reward, anything else goes through the static evaluator and the
//! logistic bridge. Rewards are in `[-1, 1]` for the side to move where
//! the playout started.

use crate::board::BoardStack;
use crate::eval::Evaluator;
use crate::reward::winning_prob;
use chess::ChessMove;
use rand::distributions::WeightedIndex;
use rand::prelude::*;

/// Playout length bound, in plies.
pub const ROLLOUT_BUDGET: u32 = 3;

/// How playout moves are chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RolloutPolicy {
    /// Uniformly random legal move.
    Uniform,
    /// Sample proportionally to how bad each reply leaves the opponent:
    /// weight `(1 - winning_prob(eval))³` per candidate.
    EvalWeighted,
}

/// Pick a playout move from `moves` under `policy`.
pub fn pick_move<R: Rng>(
    policy: RolloutPolicy,
    pos: &mut BoardStack,
    evaluator: &Evaluator,
    rng: &mut R,
    moves: &[ChessMove],
) -> ChessMove {
    debug_assert!(!moves.is_empty());
    match policy {
        RolloutPolicy::Uniform => moves[rng.gen_range(0..moves.len())],
        RolloutPolicy::EvalWeighted => {
            let weights: Vec<f64> = moves
                .iter()
                .map(|&mv| {
                    if !pos.make_move(mv) {
                        return 0.0;
                    }
                    // After the move the evaluation is from the
                    // opponent's point of view.
                    let losing = 1.0 - winning_prob(evaluator.eval(pos.current_state()));
                    pos.undo_move();
                    100.0 * losing.powi(3)
                })
                .collect();
            match WeightedIndex::new(&weights) {
                Ok(dist) => moves[dist.sample(rng)],
                // All-zero weights degenerate to a uniform pick.
                Err(_) => moves[rng.gen_range(0..moves.len())],
            }
        }
    }
}

/// Play up to `budget` random plies from the current position and score
/// the result for the side to move at entry.
///
/// Game-end rewards are exact: `-1` when the entering side ends up
/// mated, `+1` when the opponent does (unreachable from a legal
/// position, handled all the same), `0` for stalemate. A budget-bounded
/// leaf is scored by the evaluator, flipped to the entering side's
/// perspective, and squashed to `(-1, 1)` through the logistic bridge.
///
/// The position is left at the playout leaf; the caller rewinds.
pub fn simulate<R: Rng>(
    pos: &mut BoardStack,
    evaluator: &Evaluator,
    rng: &mut R,
    policy: RolloutPolicy,
    budget: u32,
) -> f64 {
    let color = pos.side_to_move();
    let mut remaining = budget;
    let mut moves = Vec::new();

    loop {
        moves.clear();
        pos.generate_moves(&mut moves);

        if moves.is_empty() {
            return if pos.in_check(color) {
                -1.0
            } else if pos.in_check(!color) {
                1.0
            } else {
                0.0
            };
        }
        if remaining == 0 {
            break;
        }

        let mv = pick_move(policy, pos, evaluator, rng, &moves);
        let made = pos.make_move(mv);
        debug_assert!(made, "generated move {mv} was rejected");
        remaining -= 1;
    }

    let mut score = evaluator.eval(pos.current_state());
    if pos.side_to_move() != color {
        score = -score;
    }
    2.0 * winning_prob(score) - 1.0
}
