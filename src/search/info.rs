//! Search bookkeeping and stop control.
//!
//! One [`SearchInfo`] is owned by the worker for the duration of a
//! search. The only value shared with the driver thread is the stop
//! flag, an atomic boolean with release/acquire ordering; everything
//! else is worker-private statistics the driver may read after the
//! search returns.

use crate::MAX_DEPTH;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Lifecycle of a search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Searching,
    Stopped,
}

/// Mutable record threaded through a single search.
#[derive(Debug)]
pub struct SearchInfo {
    /// Nodes visited (negamax/quiescence entries, or MCTS tree insertions).
    pub nodes: u64,
    /// Deepest ply reached.
    pub seldepth: i32,
    /// Iterative-deepening depth cap.
    pub depth_limit: i32,
    /// When the search was started.
    pub start_time: Instant,
    /// Hard deadline, honored only when `time_set` is true.
    pub deadline: Option<Instant>,
    pub time_set: bool,
    pub state: EngineState,
    /// Beta cutoffs observed.
    pub fail_high: u64,
    /// Beta cutoffs produced by the first move searched; the ratio
    /// against `fail_high` measures move-ordering quality.
    pub fail_high_first: u64,
    stop: Arc<AtomicBool>,
}

impl SearchInfo {
    pub fn new() -> Self {
        SearchInfo {
            nodes: 0,
            seldepth: 0,
            depth_limit: MAX_DEPTH as i32 - 1,
            start_time: Instant::now(),
            deadline: None,
            time_set: false,
            state: EngineState::Idle,
            fail_high: 0,
            fail_high_first: 0,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Depth-limited search.
    pub fn with_depth(depth: i32) -> Self {
        let mut info = Self::new();
        info.depth_limit = depth.clamp(1, MAX_DEPTH as i32 - 1);
        info
    }

    /// Time-limited search.
    pub fn with_movetime(movetime: Duration) -> Self {
        let mut info = Self::new();
        info.set_movetime(movetime);
        info
    }

    pub fn set_movetime(&mut self, movetime: Duration) {
        self.start_time = Instant::now();
        self.deadline = Some(self.start_time + movetime);
        self.time_set = true;
    }

    /// Mark the search as running; called by the driver before handing
    /// the record to the worker.
    pub fn start(&mut self) {
        self.start_time = Instant::now();
        self.state = EngineState::Searching;
    }

    /// Zero the per-search counters. The depth limit, timing fields, and
    /// the shared stop flag are preserved.
    pub fn clear(&mut self) {
        self.nodes = 0;
        self.seldepth = 0;
        self.fail_high = 0;
        self.fail_high_first = 0;
        self.state = EngineState::Searching;
    }

    /// Handle the driver keeps to cancel the search from another thread.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// True iff the search must wind down: the driver requested a stop or
    /// the deadline has passed. Called from the hot loops, so the clock
    /// is only consulted when a deadline is armed.
    pub fn search_stopped(&self) -> bool {
        if self.stop_requested() {
            return true;
        }
        if self.time_set {
            if let Some(deadline) = self.deadline {
                return Instant::now() >= deadline;
            }
        }
        false
    }

    /// Milliseconds since the search started, for `info` lines.
    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }
}

impl Default for SearchInfo {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_preserves_limits_and_timing() {
        let mut info = SearchInfo::with_depth(7);
        info.set_movetime(Duration::from_millis(500));
        info.nodes = 42;
        info.seldepth = 9;
        info.fail_high = 3;
        info.clear();
        assert_eq!(info.nodes, 0);
        assert_eq!(info.seldepth, 0);
        assert_eq!(info.fail_high, 0);
        assert_eq!(info.depth_limit, 7);
        assert!(info.time_set);
        assert_eq!(info.state, EngineState::Searching);
    }

    #[test]
    fn stop_flag_crosses_threads() {
        let info = SearchInfo::new();
        let handle = info.stop_handle();
        assert!(!info.search_stopped());
        let t = std::thread::spawn(move || handle.store(true, Ordering::Release));
        t.join().unwrap();
        assert!(info.search_stopped());
    }

    #[test]
    fn deadline_expiry_stops_the_search() {
        let mut info = SearchInfo::new();
        info.set_movetime(Duration::from_millis(0));
        assert!(info.search_stopped());
    }
}
