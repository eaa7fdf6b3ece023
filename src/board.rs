//! Position capability for both search cores.
//!
//! [`BoardStack`] wraps the `chess` crate's copy-make [`Board`] in an
//! explicit make/undo stack and layers on the bookkeeping the searches
//! need but the base crate does not track: a halfmove (fifty-move)
//! counter, the Zobrist history for repetition detection, and a
//! search-root marker so ply-from-root falls out of the stack depth.
//!
//! Move generation is strictly legal (`MoveGen::new_legal`), which is a
//! valid pseudolegal superset; `make_move` still reports illegality for
//! externally supplied moves (UCI input, corrupted tree links).

use chess::{
    get_bishop_moves, get_king_moves, get_knight_moves, get_pawn_attacks, get_rook_moves, Board,
    BitBoard, ChessMove, Color, Piece, Square,
};
use std::str::FromStr;

/// Upper bound on the number of moves in any chess position; used to
/// size move buffers up front.
pub const MAX_MOVES: usize = 256;

/// A chess position with make/undo history.
///
/// The stack owns every position since construction, so undo is a pop and
/// repetition detection is a scan of stored hashes. Entry 0 is the game
/// root (startpos or a FEN); `root_ply` marks where the current search
/// started, so `ply()` is the distance searched from there.
#[derive(Clone)]
pub struct BoardStack {
    boards: Vec<Board>,
    hashes: Vec<u64>,
    fifty: Vec<u32>,
    root_ply: usize,
}

impl BoardStack {
    /// Starting position.
    pub fn new() -> Self {
        Self::with_board(Board::default())
    }

    /// Stack rooted at an arbitrary position.
    pub fn with_board(board: Board) -> Self {
        let hash = board.get_hash();
        BoardStack {
            boards: vec![board],
            hashes: vec![hash],
            // The `chess` FEN parser does not surface the halfmove clock,
            // so a freshly rooted stack always starts the counter at zero.
            fifty: vec![0],
            root_ply: 0,
        }
    }

    /// Stack rooted at a FEN position.
    pub fn from_fen(fen: &str) -> Result<Self, chess::Error> {
        Ok(Self::with_board(Board::from_str(fen)?))
    }

    /// The current position.
    pub fn current_state(&self) -> &Board {
        self.boards.last().expect("board stack is never empty")
    }

    /// Side to move in the current position.
    pub fn side_to_move(&self) -> Color {
        self.current_state().side_to_move()
    }

    /// Ply distance from the search root.
    pub fn ply(&self) -> i32 {
        (self.boards.len() - 1 - self.root_ply) as i32
    }

    /// Halfmoves since the last capture or pawn move.
    pub fn fifty_move(&self) -> u32 {
        *self.fifty.last().expect("board stack is never empty")
    }

    /// Mark the current position as the search root (`ply() == 0`).
    pub fn set_search_root(&mut self) {
        self.root_ply = self.boards.len() - 1;
    }

    /// Pop back to the search root, discarding everything made since
    /// [`set_search_root`](Self::set_search_root). Restores the exact
    /// entry state: the retained boards, hashes, and counters are the
    /// same values that were pushed on the way down.
    pub fn rewind_to_root(&mut self) {
        self.boards.truncate(self.root_ply + 1);
        self.hashes.truncate(self.root_ply + 1);
        self.fifty.truncate(self.root_ply + 1);
    }

    /// Apply `mv`, returning `false` (position unchanged) if it is not
    /// legal in the current position.
    pub fn make_move(&mut self, mv: ChessMove) -> bool {
        let board = *self.current_state();
        if !board.legal(mv) {
            return false;
        }
        let resets_clock = board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            || board.piece_on(mv.get_dest()).is_some();
        let next = board.make_move_new(mv);
        let fifty = if resets_clock { 0 } else { self.fifty_move() + 1 };
        self.boards.push(next);
        self.hashes.push(next.get_hash());
        self.fifty.push(fifty);
        true
    }

    /// Reverse the last successful [`make_move`](Self::make_move).
    pub fn undo_move(&mut self) {
        debug_assert!(self.boards.len() > 1, "undo without a matching make");
        self.boards.pop();
        self.hashes.pop();
        self.fifty.pop();
    }

    /// True iff the current position's hash occurred earlier in the game.
    ///
    /// Only positions within the current reversible-move window can
    /// repeat, so the scan is bounded by the fifty-move counter.
    pub fn is_repetition(&self) -> bool {
        let last = self.hashes.len() - 1;
        let window = self.fifty_move() as usize;
        let first = last.saturating_sub(window);
        self.hashes[first..last].contains(&self.hashes[last])
    }

    /// All legal moves in the current position, appended to `out`.
    pub fn generate_moves(&self, out: &mut Vec<ChessMove>) {
        out.extend(chess::MoveGen::new_legal(self.current_state()));
    }

    /// Captures and promotions in the current position, appended to `out`.
    pub fn generate_noisy(&self, out: &mut Vec<ChessMove>) {
        let board = self.current_state();
        for mv in chess::MoveGen::new_legal(board) {
            if is_capture(board, mv) || mv.get_promotion().is_some() {
                out.push(mv);
            }
        }
    }

    /// True iff `color`'s king is attacked in the current position.
    ///
    /// The `chess` crate only exposes checkers for the side to move;
    /// for the other side we scan attackers of its king square directly.
    pub fn in_check(&self, color: Color) -> bool {
        let board = self.current_state();
        if board.side_to_move() == color {
            board.checkers().popcnt() > 0
        } else {
            square_attacked(board, board.king_square(color), !color)
        }
    }
}

impl Default for BoardStack {
    fn default() -> Self {
        Self::new()
    }
}

/// True iff `mv` captures a piece (including en passant).
pub fn is_capture(board: &Board, mv: ChessMove) -> bool {
    board.piece_on(mv.get_dest()).is_some()
        || (board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            && mv.get_source().get_file() != mv.get_dest().get_file())
}

/// The piece captured by `mv`, if any.
pub fn captured_piece(board: &Board, mv: ChessMove) -> Option<Piece> {
    if let Some(piece) = board.piece_on(mv.get_dest()) {
        Some(piece)
    } else if board.piece_on(mv.get_source()) == Some(Piece::Pawn)
        && mv.get_source().get_file() != mv.get_dest().get_file()
    {
        Some(Piece::Pawn) // en passant
    } else {
        None
    }
}

/// True iff `sq` is attacked by any piece of color `by`.
fn square_attacked(board: &Board, sq: Square, by: Color) -> bool {
    let occupied = *board.combined();
    let them = *board.color_combined(by);

    let pawns = get_pawn_attacks(sq, !by, them & *board.pieces(Piece::Pawn));
    let knights = get_knight_moves(sq) & them & *board.pieces(Piece::Knight);
    let kings = get_king_moves(sq) & them & *board.pieces(Piece::King);
    let diag = get_bishop_moves(sq, occupied)
        & them
        & (*board.pieces(Piece::Bishop) | *board.pieces(Piece::Queen));
    let lines = get_rook_moves(sq, occupied)
        & them
        & (*board.pieces(Piece::Rook) | *board.pieces(Piece::Queen));

    (pawns | knights | kings | diag | lines) != BitBoard(0)
}
