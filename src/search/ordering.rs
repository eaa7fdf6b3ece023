//! Move ordering.
//!
//! Moves are scored once per node and then consumed best-first through
//! [`ScoredMoves::next_best`], a selection scan that is stable for equal
//! scores. The tiers, from highest: principal-variation hint, captures
//! by MVV-LVA, promotions, the two killer moves of the current ply, and
//! finally the history counter for quiet moves.

use crate::board::{captured_piece, BoardStack};
use crate::search::history::HistoryTable;
use chess::{ChessMove, Piece};

const PV_BONUS: i32 = 2_000_000;
const CAPTURE_BONUS: i32 = 1_000_000;
const PROMOTION_BONUS: i32 = 900_000;
const KILLER_BONUS: [i32; 2] = [800_000, 790_000];

/// Rough piece worth for exchange ranking.
fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => 100,
        Piece::Knight => 320,
        Piece::Bishop => 330,
        Piece::Rook => 500,
        Piece::Queen => 900,
        Piece::King => 20_000,
    }
}

/// Most-valuable-victim / least-valuable-attacker score.
fn mvv_lva(victim: Piece, attacker: Piece) -> i32 {
    10 * piece_value(victim) - piece_value(attacker)
}

/// A scored move list consumed best-first.
pub struct ScoredMoves {
    moves: Vec<ChessMove>,
    scores: Vec<i32>,
    cursor: usize,
}

impl ScoredMoves {
    /// Score `moves` for the current position.
    ///
    /// `killers` carries the current ply's killer slots; pass `None` in
    /// quiescence, where killers are not maintained.
    pub fn score(
        pos: &BoardStack,
        moves: Vec<ChessMove>,
        pv_hint: Option<ChessMove>,
        killers: Option<&[Option<ChessMove>; 2]>,
        history: &HistoryTable,
    ) -> Self {
        let board = pos.current_state();
        let side = board.side_to_move();
        let scores = moves
            .iter()
            .map(|&mv| {
                if pv_hint == Some(mv) {
                    return PV_BONUS;
                }
                if let Some(victim) = captured_piece(board, mv) {
                    let attacker = board
                        .piece_on(mv.get_source())
                        .expect("capture has a moving piece");
                    return CAPTURE_BONUS + mvv_lva(victim, attacker);
                }
                if let Some(promo) = mv.get_promotion() {
                    return PROMOTION_BONUS + piece_value(promo);
                }
                if let Some(killers) = killers {
                    for (slot, bonus) in killers.iter().zip(KILLER_BONUS) {
                        if *slot == Some(mv) {
                            return bonus;
                        }
                    }
                }
                let piece = board
                    .piece_on(mv.get_source())
                    .expect("move has a moving piece");
                history.get(side, piece, mv.get_dest().to_index())
            })
            .collect();
        ScoredMoves {
            moves,
            scores,
            cursor: 0,
        }
    }

    /// Pop the highest-scoring remaining move; `None` when exhausted.
    /// Ties go to the earliest-generated move.
    pub fn next_best(&mut self) -> Option<ChessMove> {
        if self.cursor >= self.moves.len() {
            return None;
        }
        let mut best = self.cursor;
        for i in self.cursor + 1..self.moves.len() {
            if self.scores[i] > self.scores[best] {
                best = i;
            }
        }
        self.moves.swap(self.cursor, best);
        self.scores.swap(self.cursor, best);
        let mv = self.moves[self.cursor];
        self.cursor += 1;
        Some(mv)
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}
