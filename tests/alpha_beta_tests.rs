//! End-to-end tests for the alpha-beta engine.

use osprey::board::BoardStack;
use osprey::eval::Evaluator;
use osprey::search::{search, HistoryTable, SearchInfo, SearchReport, Searcher};
use osprey::{is_mate_score, plies_to_mate, MATE};
use std::time::{Duration, Instant};

fn run(fen: &str, depth: i32) -> (SearchReport, BoardStack) {
    let mut pos = BoardStack::from_fen(fen).expect("test FEN parses");
    let evaluator = Evaluator::new();
    let mut history = HistoryTable::new();
    let mut info = SearchInfo::with_depth(depth);
    info.start();
    let report = search(&mut pos, &evaluator, &mut history, &mut info);
    (report, pos)
}

#[test]
fn opening_search_picks_a_mainstream_move() {
    let (report, _) = run(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        4,
    );
    assert_eq!(report.depth, 4);
    let best = report.best_move.expect("root has moves").to_string();
    assert!(
        ["e2e4", "d2d4", "g1f3", "c2c4", "b1c3"].contains(&best.as_str()),
        "unexpected opening move {best}"
    );
}

#[test]
fn finds_back_rank_mate_in_one() {
    let (report, _) = run("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 2);
    assert_eq!(report.best_move.unwrap().to_string(), "a1a8");
    assert_eq!(report.score, MATE - 1);
    assert!(is_mate_score(report.score));
    assert_eq!(plies_to_mate(report.score), 1);
}

#[test]
fn sees_the_forced_mate_against_the_mover() {
    // White's only move is Ka2, after which Qb2 is mate.
    let (report, _) = run("8/1q6/8/8/8/2k5/8/K7 w - - 0 1", 4);
    assert!(report.score < 0, "score {} should be losing", report.score);
    assert!(is_mate_score(report.score));
    assert_eq!(plies_to_mate(report.score), 1);
    assert_eq!(report.pv.first().unwrap().to_string(), "a1a2");
    assert_eq!(report.pv.get(1).unwrap().to_string(), "b7b2");
}

#[test]
fn avoids_stalemating_with_overwhelming_material() {
    let (report, _) = run("7k/8/6Q1/8/8/8/8/6K1 w - - 0 1", 3);
    let best = report.best_move.unwrap().to_string();
    assert_ne!(best, "g6g7", "g6g7 is stalemate");
    assert!(report.score > 500, "winning side scored {}", report.score);
}

#[test]
fn position_is_preserved_across_a_search() {
    let fen = "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";
    let mut pos = BoardStack::from_fen(fen).unwrap();
    let before = *pos.current_state();
    let evaluator = Evaluator::new();
    let mut history = HistoryTable::new();
    let mut info = SearchInfo::with_depth(3);
    info.start();
    search(&mut pos, &evaluator, &mut history, &mut info);
    assert!(*pos.current_state() == before, "position changed");
    assert_eq!(pos.ply(), 0);
}

#[test]
fn principal_variation_is_playable() {
    let (report, mut pos) = run(
        "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
        4,
    );
    assert!(!report.pv.is_empty());
    for &mv in &report.pv {
        assert!(pos.make_move(mv), "PV move {mv} is not legal in sequence");
    }
    for _ in &report.pv {
        pos.undo_move();
    }
}

#[test]
fn one_ply_negamax_matches_best_child_quiescence() {
    let fen = "rnbqkb1r/pppppppp/5n2/8/3P4/8/PPP1PPPP/RNBQKBNR w KQkq - 1 2";
    let evaluator = Evaluator::new();

    // Reference: for every legal move, the negated full-window
    // quiescence score of the child; a 1-ply negamax must agree with
    // the maximum.
    let mut pos = BoardStack::from_fen(fen).unwrap();
    let mut moves = Vec::new();
    pos.generate_moves(&mut moves);
    let mut expected = -MATE;
    for &mv in &moves {
        let mut history = HistoryTable::new();
        let mut info = SearchInfo::new();
        info.start();
        let mut child_pos = BoardStack::from_fen(fen).unwrap();
        assert!(child_pos.make_move(mv));
        child_pos.set_search_root();
        let mut searcher = Searcher::new(&mut child_pos, &evaluator, &mut history, &mut info);
        let score = -searcher.quiescence(-MATE, MATE);
        expected = expected.max(score);
    }

    let mut history = HistoryTable::new();
    let mut info = SearchInfo::new();
    info.start();
    let mut searcher = Searcher::new(&mut pos, &evaluator, &mut history, &mut info);
    searcher.init_search();
    let got = searcher.negamax(-MATE, MATE, 1);
    assert_eq!(got, expected);
}

#[test]
fn stop_request_cuts_a_deep_search_short() {
    let mut pos = BoardStack::new();
    let evaluator = Evaluator::new();
    let mut history = HistoryTable::new();
    let mut info = SearchInfo::with_depth(30);
    info.start();
    let stop = info.stop_handle();

    let handle = std::thread::spawn(move || {
        let started = Instant::now();
        let report = search(&mut pos, &evaluator, &mut history, &mut info);
        (report, started.elapsed())
    });

    std::thread::sleep(Duration::from_millis(50));
    stop.store(true, std::sync::atomic::Ordering::Release);
    let (report, elapsed) = handle.join().unwrap();

    assert!(
        elapsed < Duration::from_secs(2),
        "search took {elapsed:?} to honor the stop"
    );
    // Depth 1 always completes well inside 50ms, so a best move from a
    // completed depth must be available.
    assert!(report.best_move.is_some());
    assert!(report.depth >= 1);
}

#[test]
fn deadline_stops_the_search() {
    let mut pos = BoardStack::new();
    let evaluator = Evaluator::new();
    let mut history = HistoryTable::new();
    let mut info = SearchInfo::with_depth(30);
    info.set_movetime(Duration::from_millis(100));
    info.start();
    let started = Instant::now();
    let report = search(&mut pos, &evaluator, &mut history, &mut info);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(report.best_move.is_some());
}

#[test]
fn repetition_is_scored_as_a_near_draw() {
    // A shuffle position: the search must not value repeating at
    // anything far from zero. Rook endgame where White has nothing
    // better than small maneuvering.
    let (report, _) = run("6k1/6pp/8/8/8/8/6PP/R5K1 w - - 0 1", 4);
    assert!(report.best_move.is_some());
    assert!(
        report.score > -50,
        "rook-up side should not read as losing, got {}",
        report.score
    );
}
