//! Iterative deepening driver for the alpha-beta engine.
//!
//! Searches depth 1, 2, ... up to the configured limit, emitting one
//! `info` line per completed depth and a final `bestmove`. A stop
//! request or expired deadline discards the interrupted depth and
//! reports the last fully completed one.

use crate::board::BoardStack;
use crate::eval::Evaluator;
use crate::search::alpha_beta::Searcher;
use crate::search::history::HistoryTable;
use crate::search::info::{EngineState, SearchInfo};
use crate::{is_mate_score, plies_to_mate, MATE};
use chess::ChessMove;

/// Result of a completed (or cancelled) search.
#[derive(Clone, Debug, Default)]
pub struct SearchReport {
    /// Best root move from the last completed depth; `None` when no depth
    /// completed or the root has no legal move.
    pub best_move: Option<ChessMove>,
    /// Score of the last completed depth, side to move's perspective.
    pub score: i32,
    /// Principal variation of the last completed depth.
    pub pv: Vec<ChessMove>,
    /// Last completed depth.
    pub depth: i32,
}

/// Search `pos` by iterative deepening, printing UCI `info` lines and a
/// final `bestmove`. The position is preserved (make/undo balanced).
pub fn search(
    pos: &mut BoardStack,
    evaluator: &Evaluator,
    history: &mut HistoryTable,
    info: &mut SearchInfo,
) -> SearchReport {
    let mut report = SearchReport::default();
    let depth_limit = info.depth_limit;

    let mut searcher = Searcher::new(pos, evaluator, history, info);
    searcher.init_search();

    for depth in 1..=depth_limit {
        let score = searcher.negamax(-MATE, MATE, depth);

        if searcher.info.search_stopped() {
            break;
        }

        report.score = score;
        report.depth = depth;
        report.pv = searcher.pv.root_line().to_vec();
        report.best_move = report.pv.first().copied();

        print_search_info(score, depth, searcher.info, &report.pv);

        if is_mate_score(score) {
            break;
        }
    }

    match report.best_move {
        Some(mv) => println!("bestmove {mv}"),
        None => println!("bestmove 0000"),
    }

    info.state = EngineState::Stopped;
    report
}

fn print_search_info(score: i32, depth: i32, info: &SearchInfo, pv: &[ChessMove]) {
    let score_field = if is_mate_score(score) {
        let plies = plies_to_mate(score);
        format!("mate {}", if score > 0 { plies } else { -plies })
    } else {
        format!("cp {score}")
    };
    let line = pv
        .iter()
        .map(|mv| mv.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    println!(
        "info depth {} seldepth {} score {} nodes {} time {} pv {}",
        depth,
        info.seldepth,
        score_field,
        info.nodes,
        info.elapsed_ms(),
        line
    );
}
