use ahash::RandomState as AHasher;
use dashmap::DashMap;
use rayon::prelude::*;

use crate::engine::{Board, Move};
use crate::game::GameState;
use crate::strategy::{Evaluations, Strategy};

use super::heuristic::get_heuristic_score;
use super::{
    best_branch, branch_evaluations, branch_explanation, dynamic_depth, empty_branches, warm_engine_and_heuristics,
    BranchEval, ExpectimaxConfig, ParThresholds, SearchStats,
};

#[derive(Clone, Copy)]
struct TranspositionEntry { score: f64, move_depth: u64 }

type SharedTable = DashMap<Board, TranspositionEntry, AHasher>;

/// Parallel Expectimax using rayon and a shared `DashMap` transposition table.
///
/// Same decisions as [`super::Expectimax`] up to cache timing; node counts
/// are not tracked.
#[derive(Debug, Clone)]
pub struct ExpectimaxParallel {
    cfg: ExpectimaxConfig,
    stats: SearchStats,
}

impl ExpectimaxParallel {
    pub fn new() -> Self { Self::with_config(ExpectimaxConfig::default()) }

    pub fn with_config(cfg: ExpectimaxConfig) -> Self {
        warm_engine_and_heuristics();
        Self { cfg, stats: SearchStats::default() }
    }

    /// Compute the best move using parallel expectimax.
    ///
    /// This is a convenience wrapper around `branch_evals` that just picks the best move.
    #[inline]
    pub fn best_move(&mut self, board: Board) -> Option<Move> {
        let branches = self.branch_evals(board);
        best_branch(&branches)
    }

    /// Core function: compute EV for each direction (no normalization) in parallel.
    ///
    /// Returns a fixed array in order: `[Up, Down, Left, Right]` and marks
    /// illegal moves as `legal=false`.
    pub fn branch_evals(&mut self, board: Board) -> [BranchEval; 4] {
        self.stats.nodes = 0;
        self.search_branches(board)
    }

    /// EV at root (max node), equivalent to the best branch EV; 0 without legal moves.
    pub fn state_value(&mut self, board: Board) -> f64 {
        let branches = self.branch_evals(board);
        let best = branches
            .iter()
            .filter(|branch| branch.legal)
            .map(|branch| branch.ev)
            .fold(f64::NEG_INFINITY, f64::max);
        if best.is_finite() { best } else { 0.0 }
    }

    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    #[inline]
    pub fn depth_for(&self, board: Board) -> u64 { dynamic_depth(board, self.cfg.depth_cap) }

    fn search_branches(&self, board: Board) -> [BranchEval; 4] {
        let depth = self.depth_for(board);
        let map: SharedTable = DashMap::with_hasher(AHasher::new());
        let out_vec: Vec<(usize, BranchEval)> = Move::ALL
            .par_iter()
            .enumerate()
            .filter_map(|(i, &dir)| {
                let new_board = board.shift(dir);
                if new_board == board {
                    return None;
                }
                let ev = self.expectimax_parallel(new_board, Node::Chance, depth, 1.0, &map);
                Some((i, BranchEval { dir, ev, legal: true }))
            })
            .collect();
        let mut out = empty_branches();
        for (i, be) in out_vec { out[i] = be; }
        out
    }

    fn expectimax_parallel(
        &self,
        board: Board,
        node: Node,
        move_depth: u64,
        cum_prob: f32,
        map: &SharedTable,
    ) -> f64 {
        match node {
            Node::Max => self.evaluate_max_parallel(board, move_depth, cum_prob, map),
            Node::Chance => self.evaluate_chance_parallel(board, move_depth, cum_prob, map),
        }
    }

    fn evaluate_max_parallel(&self, board: Board, move_depth: u64, cum_prob: f32, map: &SharedTable) -> f64 {
        let ParThresholds { max_par_depth, .. } = self.cfg.par_thresholds;
        let child = |dir: Move| {
            let new_board = board.shift(dir);
            (new_board != board).then(|| self.expectimax_parallel(new_board, Node::Chance, move_depth, cum_prob, map))
        };
        let best = if move_depth >= max_par_depth {
            Move::ALL
                .par_iter()
                .filter_map(|&dir| child(dir))
                .reduce(|| f64::NEG_INFINITY, f64::max)
        } else {
            Move::ALL.iter().filter_map(|&dir| child(dir)).fold(f64::NEG_INFINITY, f64::max)
        };
        // dead end
        if best.is_finite() { best } else { 0.0 }
    }

    fn evaluate_chance_parallel(&self, board: Board, move_depth: u64, cum_prob: f32, map: &SharedTable) -> f64 {
        if move_depth == 0 || cum_prob < self.cfg.prob_cutoff {
            return get_heuristic_score(board);
        }
        if self.cfg.cache_enabled {
            if let Some(entry) = map.get(&board) {
                if entry.move_depth >= move_depth { return entry.score; }
            }
        }
        let num_empty_tiles = board.count_empty() as usize;
        if num_empty_tiles == 0 { return get_heuristic_score(board); }
        let mut slots = Vec::with_capacity(num_empty_tiles);
        let mut tmp = board.raw();
        let mut insert_tile = 1u64;
        while slots.len() < num_empty_tiles {
            if (tmp & 0xf) == 0 { slots.push(insert_tile); }
            tmp >>= 4;
            insert_tile <<= 4;
        }
        let base_prob = cum_prob / (num_empty_tiles as f32);
        let spawn = |ins: u64| {
            let new_board_2 = Board::from_raw(board.raw() | ins);
            let s2 = self.expectimax_parallel(new_board_2, Node::Max, move_depth - 1, base_prob * 0.9, map) * 0.9;
            let new_board_4 = Board::from_raw(board.raw() | (ins << 1));
            let s4 = self.expectimax_parallel(new_board_4, Node::Max, move_depth - 1, base_prob * 0.1, map) * 0.1;
            s2 + s4
        };
        let ParThresholds { par_depth, par_slots, cache_min_depth, .. } = self.cfg.par_thresholds;
        let sum: f64 = if move_depth >= par_depth && slots.len() >= par_slots {
            slots.par_iter().map(|&ins| spawn(ins)).sum()
        } else {
            slots.iter().map(|&ins| spawn(ins)).sum()
        };
        let score = sum / (num_empty_tiles as f64);
        if self.cfg.cache_enabled && move_depth >= cache_min_depth {
            map.insert(board, TranspositionEntry { score, move_depth });
        }
        score
    }
}

#[derive(Clone, Copy)]
enum Node { Max, Chance }

impl Default for ExpectimaxParallel { fn default() -> Self { Self::new() } }

impl Strategy for ExpectimaxParallel {
    fn name(&self) -> &'static str { "expectimax-par" }

    fn next_move(&mut self, state: &GameState) -> Option<Move> { self.best_move(state.board) }

    fn explain_move(&self, dir: Move, state: &GameState) -> String {
        let branches = self.search_branches(state.board);
        branch_explanation(dir, state, &branches, self.depth_for(state.board))
    }

    fn evaluate_all_moves(&mut self, state: &GameState) -> Evaluations {
        let branches = self.branch_evals(state.board);
        branch_evaluations(state, &branches, self.depth_for(state.board))
    }
}
