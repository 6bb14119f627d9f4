//! Expectimax search policy (single-threaded and parallel) for 2048.
//!
//! This module provides two policy implementations:
//! - [`Expectimax`]: single-threaded expectimax.
//! - [`ExpectimaxParallel`]: rayon-based parallel expectimax.
//!
//! Both share the same public surface and leaf heuristic (empty cells,
//! merges, monotonicity, smoothness and tile mass per line), and both
//! implement [`crate::strategy::Strategy`] under the `expectimax` and
//! `expectimax-par` identifiers.
//!
//! Notes
//! - The engine's lookup and heuristic tables are initialized lazily; the
//!   constructors warm them for you.
//! - Expectimax is deterministic; randomness only occurs when applying moves
//!   with `GameState::make_move`.
//!
//! Quick start
//! ```
//! use agents_2048::engine::Board;
//! use agents_2048::expectimax::{Expectimax, ExpectimaxConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(123);
//! let b0 = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
//! let mut ex = Expectimax::with_config(ExpectimaxConfig { depth_cap: Some(2), ..Default::default() });
//! assert!(ex.best_move(b0).is_some());
//! ```

use crate::engine::{self, Board, Move};
use crate::game::GameState;
use crate::strategy::features::{monotonic_cols, monotonic_rows, smoothness};
use crate::strategy::{candidate, candidates, invalid_move_text, relative_label, Evaluations, MoveEvaluation};

mod heuristic;
mod search_par;
mod search_seq;

pub use search_par::ExpectimaxParallel;
pub use search_seq::Expectimax;

/// Configurable knobs for Expectimax.
///
/// - `prob_cutoff`: prune chance branches when cumulative probability falls below this value.
/// - `depth_cap`: optional hard cap for depth (None keeps dynamic depth uncapped).
/// - `cache_enabled`: enable/disable transposition table usage.
/// - `par_thresholds`: thresholds used only by the parallel implementation.
#[derive(Debug, Clone)]
pub struct ExpectimaxConfig {
    /// Probability cutoff for chance-node pruning.
    pub prob_cutoff: f32,
    /// Optional hard cap on depth.
    pub depth_cap: Option<u64>,
    /// Enable/disable transposition caching.
    pub cache_enabled: bool,
    /// Thresholds used by the parallel implementation.
    pub par_thresholds: ParThresholds,
}

impl Default for ExpectimaxConfig {
    fn default() -> Self {
        Self {
            prob_cutoff: 1e-4,
            depth_cap: None,
            cache_enabled: true,
            par_thresholds: ParThresholds::default(),
        }
    }
}

/// Thresholds used to balance parallel overheads.
#[derive(Debug, Clone, Copy)]
pub struct ParThresholds {
    pub max_par_depth: u64,
    pub par_depth: u64,
    pub par_slots: usize,
    pub cache_min_depth: u64,
}

impl Default for ParThresholds {
    fn default() -> Self {
        Self { max_par_depth: 4, par_depth: 4, par_slots: 6, cache_min_depth: 3 }
    }
}

/// Per-branch expected value at the root (no normalization).
///
/// - `ev` is the expected value for taking `dir` from the current board.
/// - `legal` is false when the move is a no-op for the current board.
#[derive(Debug, Clone, Copy)]
pub struct BranchEval {
    pub dir: Move,
    pub ev: f64,
    pub legal: bool,
}

/// Basic search stats for a single evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    pub nodes: u64,
    pub peak_nodes: u64,
}

/// Common helper for constructors to ensure tables are initialized.
fn warm_engine_and_heuristics() {
    // Safe to call multiple times.
    engine::new();
    heuristic::warm();
}

/// Search depth for `board`: one ply per distinct tile beyond two, at least 3.
fn dynamic_depth(board: Board, depth_cap: Option<u64>) -> u64 {
    let dyn_depth = 3.max(i64::from(board.count_distinct()) - 2) as u64;
    match depth_cap { Some(cap) => dyn_depth.min(cap.max(1)), None => dyn_depth }
}

fn empty_branches() -> [BranchEval; 4] {
    Move::ALL.map(|dir| BranchEval { dir, ev: 0.0, legal: false })
}

/// Legal branch with the highest EV; ties go to the earliest direction.
fn best_branch(branches: &[BranchEval; 4]) -> Option<Move> {
    let mut best: Option<&BranchEval> = None;
    for branch in branches.iter().filter(|branch| branch.legal) {
        match best {
            Some(top) if branch.ev <= top.ev => {}
            _ => best = Some(branch),
        }
    }
    best.map(|branch| branch.dir)
}

/// Shared `Strategy::evaluate_all_moves` body for both search variants.
fn branch_evaluations(state: &GameState, branches: &[BranchEval; 4], depth: u64) -> Evaluations {
    let legal: Vec<&BranchEval> = branches.iter().filter(|b| b.legal).collect();
    let best = legal.iter().map(|b| b.ev).fold(f64::NEG_INFINITY, f64::max);
    let worst = legal.iter().map(|b| b.ev).fold(f64::INFINITY, f64::min);
    let cands = candidates(state);
    let evaluations = cands
        .iter()
        .filter_map(|c| {
            let branch = legal.iter().find(|b| b.dir == c.dir)?;
            Some(MoveEvaluation {
                direction: c.dir,
                score: branch.ev,
                score_delta: c.outcome.score_delta,
                empty_tiles: c.empty_tiles(),
                label: relative_label(branch.ev, best, worst).to_string(),
                reasoning: format!("expected value {:.0} over {} plies", branch.ev, depth),
            })
        })
        .collect();
    Evaluations { valid_moves: cands.iter().map(|c| c.dir).collect(), evaluations }
}

/// Shared `Strategy::explain_move` body for both search variants.
fn branch_explanation(dir: Move, state: &GameState, branches: &[BranchEval; 4], depth: u64) -> String {
    let Some(c) = candidate(state, dir) else { return invalid_move_text(dir) };
    let ev = branches.iter().find(|b| b.dir == dir).map(|b| b.ev).unwrap_or_default();
    if best_branch(branches) == Some(dir) {
        let after = c.outcome.board;
        format!(
            "searching {depth} plies, {dir} has the highest expected value ({ev:.0}); it leaves {} empty, {}/8 lines ordered, smoothness {:.0}",
            after.count_empty(),
            monotonic_rows(after) + monotonic_cols(after),
            smoothness(after)
        )
    } else {
        format!("searching {depth} plies, {dir} expects {ev:.0}, below the best branch")
    }
}
