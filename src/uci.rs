//! UCI protocol driver.
//!
//! Owns stdin and the engine state between searches. Each `go` spawns
//! one worker thread that runs a search to completion; the driver keeps
//! only the shared stop flag, which `stop` and `quit` flip. The history
//! table travels into the worker and comes back on join, so its aging
//! policy spans the whole game.

use crate::board::BoardStack;
use crate::eval::Evaluator;
use crate::mcts::MctsEngine;
use crate::search::{self, HistoryTable, SearchInfo};
use chess::{ChessMove, File, Piece, Rank, Square};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

const ENGINE_NAME: &str = "Osprey";
const ENGINE_AUTHOR: &str = "the osprey authors";

/// Errors from malformed UCI input. Reported as `info string` lines and
/// otherwise ignored, per protocol custom.
#[derive(Debug, thiserror::Error)]
pub enum UciError {
    #[error("malformed position command: missing startpos or fen keyword")]
    MalformedPosition,

    #[error("invalid FEN: {fen}")]
    InvalidFen { fen: String },

    #[error("invalid move: {uci_move}")]
    InvalidMove { uci_move: String },

    #[error("illegal move: {uci_move}")]
    IllegalMove { uci_move: String },

    #[error("invalid value for go parameter {param}: {value}")]
    InvalidGoValue { param: String, value: String },
}

/// Parameters accepted by `go`.
#[derive(Debug, Clone, Copy, Default)]
struct GoParams {
    depth: Option<i32>,
    movetime: Option<u64>,
    wtime: Option<u64>,
    btime: Option<u64>,
    winc: Option<u64>,
    binc: Option<u64>,
    infinite: bool,
    mcts: bool,
}

/// The UCI engine loop.
pub struct UciEngine {
    pos: BoardStack,
    evaluator: Arc<Evaluator>,
    history: Option<HistoryTable>,
    use_mcts: bool,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<HistoryTable>>,
}

impl UciEngine {
    pub fn new() -> Self {
        UciEngine {
            pos: BoardStack::new(),
            evaluator: Arc::new(Evaluator::new()),
            history: Some(HistoryTable::new()),
            use_mcts: false,
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Read and dispatch commands until `quit`.
    pub fn run(&mut self) {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            if !self.dispatch(line.trim()) {
                break;
            }
        }
        self.finish_search();
    }

    /// Handle one command line; false means quit.
    fn dispatch(&mut self, line: &str) -> bool {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = tokens.first() else {
            return true;
        };
        match command {
            "uci" => {
                println!("id name {ENGINE_NAME}");
                println!("id author {ENGINE_AUTHOR}");
                println!("option name UseMCTS type check default false");
                println!("uciok");
            }
            "isready" => println!("readyok"),
            "ucinewgame" => {
                self.finish_search();
                self.pos = BoardStack::new();
                if let Some(history) = self.history.as_mut() {
                    history.clear();
                }
            }
            "setoption" => self.set_option(&tokens[1..]),
            "position" => {
                self.finish_search();
                if let Err(err) = self.set_position(&tokens[1..]) {
                    println!("info string error: {err}");
                }
            }
            "go" => match parse_go(&tokens[1..]) {
                Ok(params) => self.go(params),
                Err(err) => println!("info string error: {err}"),
            },
            "stop" => {
                self.stop.store(true, Ordering::Release);
                self.finish_search();
            }
            "quit" => {
                self.stop.store(true, Ordering::Release);
                return false;
            }
            _ => {} // Unknown commands are ignored per UCI custom.
        }
        true
    }

    fn set_option(&mut self, tokens: &[&str]) {
        // setoption name <id> value <x>
        let mut name = None;
        let mut value = None;
        let mut it = tokens.iter();
        while let Some(&tok) = it.next() {
            match tok {
                "name" => name = it.next().copied(),
                "value" => value = it.next().copied(),
                _ => {}
            }
        }
        if name.map(str::to_ascii_lowercase).as_deref() == Some("usemcts") {
            self.use_mcts = value.map(str::to_ascii_lowercase).as_deref() == Some("true");
        }
    }

    fn set_position(&mut self, tokens: &[&str]) -> Result<(), UciError> {
        let (stack, rest) = match tokens.first() {
            Some(&"startpos") => (BoardStack::new(), &tokens[1..]),
            Some(&"fen") => {
                if tokens.len() < 7 {
                    return Err(UciError::InvalidFen {
                        fen: tokens[1..].join(" "),
                    });
                }
                let fen = tokens[1..7].join(" ");
                let stack = BoardStack::from_fen(&fen)
                    .map_err(|_| UciError::InvalidFen { fen: fen.clone() })?;
                (stack, &tokens[7..])
            }
            _ => return Err(UciError::MalformedPosition),
        };

        let mut stack = stack;
        let moves = match rest.first() {
            Some(&"moves") => &rest[1..],
            _ => &[],
        };
        for token in moves {
            let mv = parse_uci_move(token)?;
            if !stack.make_move(mv) {
                return Err(UciError::IllegalMove {
                    uci_move: (*token).to_string(),
                });
            }
        }
        self.pos = stack;
        Ok(())
    }

    fn go(&mut self, params: GoParams) {
        self.finish_search();

        let mut info = SearchInfo::new();
        if let Some(depth) = params.depth {
            info.depth_limit = depth.clamp(1, crate::MAX_DEPTH as i32 - 1);
        }
        if let Some(ms) = params.movetime {
            info.set_movetime(Duration::from_millis(ms));
        } else if !params.infinite {
            // Out-of-scope time management gets a bare-bones allocation:
            // a thirtieth of the clock plus half the increment.
            let (time, inc) = match self.pos.side_to_move() {
                chess::Color::White => (params.wtime, params.winc),
                chess::Color::Black => (params.btime, params.binc),
            };
            if let Some(time) = time {
                let budget = (time / 30 + inc.unwrap_or(0) / 2).max(10);
                info.set_movetime(Duration::from_millis(budget));
            }
        }
        info.start();

        self.stop = info.stop_handle();
        let mut pos = self.pos.clone();
        let evaluator = Arc::clone(&self.evaluator);
        let mut history = self.history.take().unwrap_or_default();
        let use_mcts = self.use_mcts || params.mcts;

        self.worker = Some(std::thread::spawn(move || {
            if use_mcts {
                let mut engine = MctsEngine::new();
                engine.search(&mut pos, &evaluator, &mut info);
            } else {
                search::search(&mut pos, &evaluator, &mut history, &mut info);
            }
            history
        }));
    }

    /// Join the worker from the previous `go`, recovering the history
    /// table it carried.
    fn finish_search(&mut self) {
        if let Some(worker) = self.worker.take() {
            if let Ok(history) = worker.join() {
                self.history = Some(history);
            }
        }
        if self.history.is_none() {
            self.history = Some(HistoryTable::new());
        }
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn go_value(param: &str, value: Option<&str>) -> Result<u64, UciError> {
    let value = value.unwrap_or("");
    value.parse::<u64>().map_err(|_| UciError::InvalidGoValue {
        param: param.to_string(),
        value: value.to_string(),
    })
}

fn parse_go(tokens: &[&str]) -> Result<GoParams, UciError> {
    let mut params = GoParams::default();
    let mut it = tokens.iter();
    while let Some(&tok) = it.next() {
        match tok {
            "depth" => params.depth = Some(go_value(tok, it.next().copied())? as i32),
            "movetime" => params.movetime = Some(go_value(tok, it.next().copied())?),
            "wtime" => params.wtime = Some(go_value(tok, it.next().copied())?),
            "btime" => params.btime = Some(go_value(tok, it.next().copied())?),
            "winc" => params.winc = Some(go_value(tok, it.next().copied())?),
            "binc" => params.binc = Some(go_value(tok, it.next().copied())?),
            "infinite" => params.infinite = true,
            "mcts" => params.mcts = true,
            _ => {} // movestogo, nodes, ponder: accepted and ignored.
        }
    }
    Ok(params)
}

/// Parse a long-algebraic move (`e2e4`, `e7e8q`).
pub fn parse_uci_move(text: &str) -> Result<ChessMove, UciError> {
    let invalid = || UciError::InvalidMove {
        uci_move: text.to_string(),
    };
    let bytes = text.as_bytes();
    if bytes.len() < 4 || bytes.len() > 5 {
        return Err(invalid());
    }
    let square = |file: u8, rank: u8| -> Result<Square, UciError> {
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(invalid());
        }
        Ok(Square::make_square(
            Rank::from_index((rank - b'1') as usize),
            File::from_index((file - b'a') as usize),
        ))
    };
    let source = square(bytes[0], bytes[1])?;
    let dest = square(bytes[2], bytes[3])?;
    let promotion = match bytes.get(4) {
        None => None,
        Some(b'q') => Some(Piece::Queen),
        Some(b'r') => Some(Piece::Rook),
        Some(b'b') => Some(Piece::Bishop),
        Some(b'n') => Some(Piece::Knight),
        Some(_) => return Err(invalid()),
    };
    Ok(ChessMove::new(source, dest, promotion))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_promotion_moves() {
        let mv = parse_uci_move("e2e4").unwrap();
        assert_eq!(mv.to_string(), "e2e4");
        let promo = parse_uci_move("e7e8q").unwrap();
        assert_eq!(promo.get_promotion(), Some(Piece::Queen));
    }

    #[test]
    fn rejects_garbage_moves() {
        assert!(parse_uci_move("").is_err());
        assert!(parse_uci_move("e2").is_err());
        assert!(parse_uci_move("z9e4").is_err());
        assert!(parse_uci_move("e2e4x").is_err());
    }

    #[test]
    fn go_parser_reads_depth_and_movetime() {
        let params = parse_go(&["depth", "6", "movetime", "250"]).unwrap();
        assert_eq!(params.depth, Some(6));
        assert_eq!(params.movetime, Some(250));
        assert!(!params.mcts);
    }

    #[test]
    fn go_parser_flags_bad_values() {
        assert!(parse_go(&["depth", "six"]).is_err());
        assert!(parse_go(&["movetime"]).is_err());
    }

    #[test]
    fn position_with_moves_applies_them() {
        let mut engine = UciEngine::new();
        engine
            .set_position(&["startpos", "moves", "e2e4", "e7e5"])
            .unwrap();
        assert_eq!(engine.pos.fifty_move(), 0);
        assert!(engine
            .set_position(&["startpos", "moves", "e2e5"])
            .is_err());
    }
}
