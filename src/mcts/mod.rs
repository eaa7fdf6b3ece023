//! Monte Carlo Tree Search engine.
//!
//! The classic four-phase loop — select, expand, simulate, backpropagate
//! — over an arena-allocated tree. Child selection uses UCB1; playouts
//! are short random rollouts scored through the evaluator and the
//! logistic reward bridge. Arena exhaustion is a soft failure: the
//! engine stops growing the tree and keeps refining the statistics it
//! already has until the driver stops it.

pub mod arena;
pub mod node;
pub mod simulation;

pub use arena::{Arena, DEFAULT_ARENA_MB};
pub use node::{Node, NodeId, Tree};
pub use simulation::{simulate, RolloutPolicy, ROLLOUT_BUDGET};

use crate::board::BoardStack;
use crate::eval::Evaluator;
use crate::reward::centipawn_from_prob;
use crate::search::info::{EngineState, SearchInfo};
use chess::ChessMove;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// UCB1 exploration constant (sqrt 2).
pub const UCB_CONST: f64 = 1.41421356237;

/// Tunables for one engine instance.
#[derive(Clone, Copy, Debug)]
pub struct MctsConfig {
    pub exploration_constant: f64,
    pub rollout_budget: u32,
    pub rollout_policy: RolloutPolicy,
    /// Emit an `info` line every this many tree nodes.
    pub info_interval: u64,
}

impl Default for MctsConfig {
    fn default() -> Self {
        MctsConfig {
            exploration_constant: UCB_CONST,
            rollout_budget: ROLLOUT_BUDGET,
            rollout_policy: RolloutPolicy::Uniform,
            info_interval: 10_000,
        }
    }
}

/// Statistics from one search, for diagnostics and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct MctsStats {
    pub iterations: u64,
    pub tree_nodes: u32,
    pub infos_emitted: u32,
    /// The arena filled up at some point during the search.
    pub arena_full: bool,
}

/// A Monte Carlo search engine owning its tree arena.
///
/// The arena is reserved once and reused: every search starts from a
/// fresh root and tears the tree down on exit, so no two searches ever
/// share nodes.
pub struct MctsEngine {
    tree: Tree,
    config: MctsConfig,
    rng: StdRng,
}

impl MctsEngine {
    pub fn new() -> Self {
        Self::with_tree(Tree::new(), MctsConfig::default())
    }

    /// Engine over an arena of exactly `bytes` bytes (tests exercise the
    /// exhaustion path this way).
    pub fn with_arena_capacity(bytes: usize) -> Self {
        Self::with_tree(Tree::with_capacity(bytes), MctsConfig::default())
    }

    pub fn with_config(config: MctsConfig) -> Self {
        Self::with_tree(Tree::new(), config)
    }

    pub fn with_tree(tree: Tree, config: MctsConfig) -> Self {
        MctsEngine {
            tree,
            config,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn arena(&self) -> &Arena {
        self.tree.arena()
    }

    /// Search the current position until stopped, then print `bestmove`
    /// and return it with the run's statistics.
    ///
    /// The position is restored to its entry state after every iteration
    /// and on return; `info.state` is `Stopped` afterwards.
    pub fn search(
        &mut self,
        pos: &mut BoardStack,
        evaluator: &Evaluator,
        info: &mut SearchInfo,
    ) -> (Option<ChessMove>, MctsStats) {
        let mut stats = MctsStats::default();

        info.clear();
        pos.set_search_root();
        self.tree.clear();

        let root = match self.tree.alloc(Node::new(pos, None, None)) {
            Some(root) => root,
            None => {
                // Degenerate arena that cannot even hold the root.
                stats.arena_full = true;
                println!("bestmove 0000");
                info.state = EngineState::Stopped;
                return (None, stats);
            }
        };

        while !info.search_stopped() {
            // 1) Selection: descend the best UCB child while the tree
            //    already covers every move of the current node.
            let mut node_id = root;
            loop {
                let node = self.tree.node(node_id);
                if node.is_terminal() || !node.is_fully_expanded() {
                    break;
                }
                let child = self
                    .tree
                    .best_child(node_id, self.config.exploration_constant)
                    .expect("fully expanded non-terminal node has children");
                let mv = self
                    .tree
                    .node(child)
                    .action
                    .expect("non-root node has an action");
                if !pos.make_move(mv) {
                    panic!(
                        "tree stores illegal move {mv} in position {}",
                        pos.current_state()
                    );
                }
                node_id = child;
            }

            // 2) Expansion: add one sampled untried move, unless the
            //    arena is full — then keep working with the tree as-is.
            if !self.tree.node(node_id).is_terminal() {
                if self.tree.has_space() {
                    if let Some(child) = expand(&mut self.tree, node_id, pos, &mut self.rng) {
                        node_id = child;
                        info.nodes += 1;
                        info.seldepth = info.seldepth.max(pos.ply());
                    }
                } else {
                    stats.arena_full = true;
                }
            }

            // 3) Simulation.
            let reward = simulate(
                pos,
                evaluator,
                &mut self.rng,
                self.config.rollout_policy,
                self.config.rollout_budget,
            );

            // 4) Backpropagation.
            backprop(&mut self.tree, node_id, reward);

            // 5) Periodic progress report.
            if info.nodes > 0 && info.nodes % self.config.info_interval == 0 {
                if self.print_info(root, info) {
                    stats.infos_emitted += 1;
                }
            }

            // 6) Back to the root position for the next iteration.
            pos.rewind_to_root();
            stats.iterations += 1;
        }

        pos.rewind_to_root();
        stats.tree_nodes = self.tree.len();

        // Report the pure exploitation winner.
        let best_move = self
            .tree
            .best_child(root, 0.0)
            .and_then(|child| self.tree.node(child).action);
        match best_move {
            Some(mv) => println!("bestmove {mv}"),
            None => println!("bestmove 0000"),
        }

        self.tree.clear();
        info.state = EngineState::Stopped;
        (best_move, stats)
    }

    /// Emit an `info` line for the current exploitation-best child.
    /// Returns false when the root has no children yet.
    fn print_info(&self, root: NodeId, info: &SearchInfo) -> bool {
        let Some(best) = self.tree.best_child(root, 0.0) else {
            return false;
        };
        let child = self.tree.node(best);
        let q = child.ucb(self.tree.node(root).visits, 0.0);
        let cp = centipawn_from_prob((q + 1.0) / 2.0);
        let mv = child.action.expect("non-root node has an action");
        println!(
            "info depth {} score cp {} nodes {} time {} pv {}",
            info.seldepth,
            cp,
            info.nodes,
            info.elapsed_ms(),
            mv
        );
        true
    }
}

impl Default for MctsEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Expand `node_id` by one sampled untried move; advances `pos` to the
/// new child's position. Returns `None` when every untried move turned
/// out illegal (the node then reads as fully expanded).
fn expand<R: Rng>(
    tree: &mut Tree,
    node_id: NodeId,
    pos: &mut BoardStack,
    rng: &mut R,
) -> Option<NodeId> {
    let mv = loop {
        let node = tree.node_mut(node_id);
        if node.untried_moves.is_empty() {
            return None;
        }
        let pick = rng.gen_range(0..node.untried_moves.len());
        let mv = node.untried_moves.swap_remove(pick);
        // Generation is legal-only, but the contract allows a
        // pseudolegal source: rejected samples just leave the list.
        if pos.make_move(mv) {
            break mv;
        }
    };
    let child = tree.alloc(Node::new(pos, Some(mv), Some(node_id)));
    match child {
        Some(child) => {
            tree.node_mut(node_id).children.push(child);
            Some(child)
        }
        None => {
            // Lost the race against exhaustion after the pre-check; put
            // the position back and leave the move unexpanded this round.
            pos.undo_move();
            tree.node_mut(node_id).untried_moves.push(mv);
            None
        }
    }
}

/// Credit `reward` to `from` and every ancestor, flipping the sign at
/// each step: a node's statistics are kept from the perspective of the
/// side to move at its parent, which is the side that chooses it.
pub fn backprop(tree: &mut Tree, from: NodeId, mut reward: f64) {
    let mut current = Some(from);
    while let Some(id) = current {
        reward = -reward;
        let node = tree.node_mut(id);
        node.update(reward);
        current = node.parent;
    }
}
