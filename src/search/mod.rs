pub mod alpha_beta;
pub mod history;
pub mod info;
pub mod iterative_deepening;
pub mod ordering;
pub mod quiescence;

pub use alpha_beta::{Searcher, SearchStackEntry};
pub use history::{HistoryTable, HISTORY_AGING_SHIFT};
pub use info::{EngineState, SearchInfo};
pub use iterative_deepening::{search, SearchReport};
pub use ordering::ScoredMoves;
