//! Quiescence search.
//!
//! Extends the horizon with captures and promotions only, so the static
//! evaluation is read from positions where no immediate tactics hang.
//! The stand-pat score acts as a floor: the side to move can always
//! decline the noisy continuation.

use crate::search::alpha_beta::Searcher;
use crate::search::ordering::ScoredMoves;
use crate::MAX_DEPTH;

impl<'a> Searcher<'a> {
    /// Tail search over noisy moves with a fail-hard window. No killer or
    /// history maintenance happens here; ordering is MVV-LVA only.
    pub fn quiescence(&mut self, mut alpha: i32, beta: i32) -> i32 {
        assert!(alpha < beta, "inverted window: {alpha} >= {beta}");

        self.info.nodes += 1;

        let ply = self.pos.ply();
        if ply > self.info.seldepth {
            self.info.seldepth = ply;
        }

        let stand_pat = self.evaluator.eval(self.pos.current_state());
        let ply = ply as usize;
        if ply >= MAX_DEPTH - 1 {
            return stand_pat;
        }
        self.stack[ply].score = stand_pat;

        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let mut moves = Vec::with_capacity(32);
        self.pos.generate_noisy(&mut moves);
        let mut ordered = ScoredMoves::score(self.pos, moves, None, None, self.history);

        let mut searched = 0u32;
        while let Some(mv) = ordered.next_best() {
            if !self.pos.make_move(mv) {
                continue;
            }
            searched += 1;
            let score = -self.quiescence(-beta, -alpha);
            self.pos.undo_move();

            if self.info.search_stopped() {
                return 0;
            }

            if score >= beta {
                if searched == 1 {
                    self.info.fail_high_first += 1;
                }
                self.info.fail_high += 1;
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }
}
