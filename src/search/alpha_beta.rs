//! Fail-hard negamax with principal-variation recovery.
//!
//! [`Searcher`] bundles the per-search state: the position, the search
//! stack (killer slots and cached static scores per ply), and the
//! triangular PV table. The negamax here is deliberately plain — no
//! transposition table, no pruning beyond alpha-beta itself — with
//! quiescence resolving tactics at the horizon.

use crate::board::{captured_piece, BoardStack, MAX_MOVES};
use crate::eval::Evaluator;
use crate::search::history::HistoryTable;
use crate::search::info::SearchInfo;
use crate::search::ordering::ScoredMoves;
use crate::{MATE, MAX_DEPTH};
use chess::{ChessMove, ALL_SQUARES};

/// Per-ply search state.
#[derive(Clone, Copy, Default)]
pub struct SearchStackEntry {
    /// Last two quiet moves that caused a beta cutoff at this ply.
    /// Persist across siblings within one depth iteration.
    pub killers: [Option<ChessMove>; 2],
    /// Cached static evaluation at this ply.
    pub score: i32,
}

/// One row of the triangular PV table.
///
/// Rows use absolute indexing: the row for ply `p` stores its line in
/// `moves[p..len]`, so a child row can be spliced in with a straight
/// copy. Row 0 therefore reads as the full principal variation.
#[derive(Clone)]
struct PvLine {
    moves: [ChessMove; MAX_DEPTH],
    len: usize,
}

impl Default for PvLine {
    fn default() -> Self {
        PvLine {
            moves: [ChessMove::new(ALL_SQUARES[0], ALL_SQUARES[0], None); MAX_DEPTH],
            len: 0,
        }
    }
}

/// Triangular principal-variation table, one row per ply.
pub struct PvTable {
    rows: Vec<PvLine>,
}

impl PvTable {
    fn new() -> Self {
        PvTable {
            rows: vec![PvLine::default(); MAX_DEPTH + 1],
        }
    }

    fn clear(&mut self) {
        for row in &mut self.rows {
            row.len = 0;
        }
    }

    /// Truncate the row for `ply` on node entry.
    fn begin_node(&mut self, ply: usize) {
        self.rows[ply].len = ply;
    }

    /// Record `mv` as the best move at `ply` and splice the child line
    /// from the row below.
    fn update(&mut self, ply: usize, mv: ChessMove) {
        let (head, tail) = self.rows.split_at_mut(ply + 1);
        let row = &mut head[ply];
        let child = &tail[0];
        row.moves[ply] = mv;
        if child.len > ply + 1 {
            row.moves[ply + 1..child.len].copy_from_slice(&child.moves[ply + 1..child.len]);
        }
        row.len = child.len.max(ply + 1);
    }

    /// The best line found from the root.
    pub fn root_line(&self) -> &[ChessMove] {
        &self.rows[0].moves[..self.rows[0].len]
    }
}

/// Alpha-beta search state for one search.
pub struct Searcher<'a> {
    pub pos: &'a mut BoardStack,
    pub evaluator: &'a Evaluator,
    pub history: &'a mut HistoryTable,
    pub info: &'a mut SearchInfo,
    pub stack: Vec<SearchStackEntry>,
    pub pv: PvTable,
}

impl<'a> Searcher<'a> {
    pub fn new(
        pos: &'a mut BoardStack,
        evaluator: &'a Evaluator,
        history: &'a mut HistoryTable,
        info: &'a mut SearchInfo,
    ) -> Self {
        Searcher {
            pos,
            evaluator,
            history,
            info,
            stack: vec![SearchStackEntry::default(); MAX_DEPTH],
            pv: PvTable::new(),
        }
    }

    /// Reset state for a fresh search: age the history evidence, clear
    /// the PV table and counters, zero the stack, and pin the current
    /// position as ply 0.
    pub fn init_search(&mut self) {
        self.history.age();
        self.pv.clear();
        self.info.clear();
        for entry in &mut self.stack {
            *entry = SearchStackEntry::default();
        }
        self.pos.set_search_root();
    }

    /// Negamax with a fail-hard `[alpha, beta]` window.
    ///
    /// Returns a score from the side to move's perspective. A return of 0
    /// after a stop request is a discarded partial result; the iterative
    /// deepening driver never uses it.
    pub fn negamax(&mut self, mut alpha: i32, beta: i32, depth: i32) -> i32 {
        assert!(alpha < beta, "inverted window: {alpha} >= {beta}");
        debug_assert!(depth >= 0);

        if depth == 0 {
            return self.quiescence(alpha, beta);
        }

        self.info.nodes += 1;

        let ply = self.pos.ply();
        if ply > 0 && (self.pos.is_repetition() || self.pos.fifty_move() >= 100) {
            // Jittered draw score: nudges the engine away from repeating
            // lines without meaningfully biasing the evaluation.
            return -2 + (self.info.nodes & 3) as i32;
        }
        if ply as usize >= MAX_DEPTH - 1 {
            return self.evaluator.eval(self.pos.current_state());
        }
        let ply = ply as usize;

        self.pv.begin_node(ply);
        self.stack[ply].score = self.evaluator.eval(self.pos.current_state());

        let board = *self.pos.current_state();
        let side = board.side_to_move();

        let mut moves = Vec::with_capacity(MAX_MOVES);
        self.pos.generate_moves(&mut moves);
        let killers = self.stack[ply].killers;
        let mut ordered = ScoredMoves::score(self.pos, moves, None, Some(&killers), self.history);

        let mut legal_moves = 0u32;
        while let Some(mv) = ordered.next_best() {
            if !self.pos.make_move(mv) {
                continue;
            }
            legal_moves += 1;
            let score = -self.negamax(-beta, -alpha, depth - 1);
            self.pos.undo_move();

            if self.info.search_stopped() {
                return 0;
            }

            if score >= beta {
                if legal_moves == 1 {
                    self.info.fail_high_first += 1;
                }
                self.info.fail_high += 1;
                if captured_piece(&board, mv).is_none() && mv.get_promotion().is_none() {
                    let entry = &mut self.stack[ply];
                    if entry.killers[0] != Some(mv) {
                        entry.killers[1] = entry.killers[0];
                        entry.killers[0] = Some(mv);
                    }
                    let piece = board
                        .piece_on(mv.get_source())
                        .expect("moved piece exists on the pre-move board");
                    self.history.update(side, piece, mv.get_dest().to_index(), depth);
                }
                return beta;
            }
            if score > alpha {
                alpha = score;
                self.pv.update(ply, mv);
            }
        }

        if legal_moves == 0 {
            return if self.pos.in_check(side) {
                -MATE + ply as i32
            } else {
                0
            };
        }

        alpha
    }
}
