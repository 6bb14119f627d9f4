use std::collections::HashMap;

use crate::engine::{Board, Move};
use crate::game::GameState;
use crate::strategy::{Evaluations, Strategy};

use super::heuristic::get_heuristic_score;
use super::{
    best_branch, branch_evaluations, branch_explanation, dynamic_depth, empty_branches, warm_engine_and_heuristics,
    BranchEval, ExpectimaxConfig, SearchStats,
};

enum Node { Max, Chance }

#[derive(Clone, Copy)]
struct TranspositionEntry { score: f64, move_depth: u64 }

type Table = HashMap<Board, TranspositionEntry>;

/// Single-threaded Expectimax search.
///
/// Constructors warm engine/heuristic tables. The search reads `&self`
/// only, so explanations can be produced without touching the stats.
#[derive(Debug, Clone)]
pub struct Expectimax {
    cfg: ExpectimaxConfig,
    stats: SearchStats,
}

impl Expectimax {
    pub fn new() -> Self { Self::with_config(ExpectimaxConfig::default()) }

    pub fn with_config(cfg: ExpectimaxConfig) -> Self {
        warm_engine_and_heuristics();
        Self { cfg, stats: SearchStats::default() }
    }

    /// Compute the best move using expectimax.
    ///
    /// Example
    /// ```
    /// use agents_2048::engine::Board;
    /// use agents_2048::expectimax::{Expectimax, ExpectimaxConfig};
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// let mut ex = Expectimax::with_config(ExpectimaxConfig { depth_cap: Some(2), ..Default::default() });
    /// assert!(ex.best_move(b).is_some());
    /// ```
    #[inline]
    pub fn best_move(&mut self, board: Board) -> Option<Move> {
        let branches = self.branch_evals(board);
        best_branch(&branches)
    }

    /// Compute EV for each direction (no normalization).
    ///
    /// Returns a fixed array in order: `[Up, Down, Left, Right]` and marks
    /// illegal moves as `legal=false`.
    pub fn branch_evals(&mut self, board: Board) -> [BranchEval; 4] {
        let (out, nodes) = self.search_branches(board);
        self.record(nodes);
        out
    }

    /// EV at root (max node), equivalent to the best branch EV.
    ///
    /// A board without legal moves is worth 0.
    pub fn state_value(&mut self, board: Board) -> f64 {
        let mut map = Table::new();
        let mut state_count = 0u64;
        let depth = self.depth_for(board);
        let res = self.expectimax(board, Node::Max, depth, 1.0, &mut map, &mut state_count);
        self.record(state_count);
        res.score
    }

    /// Statistics collected from the last call to [`Self::best_move`],
    /// [`Self::branch_evals`] or [`Self::state_value`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    #[inline]
    pub fn depth_for(&self, board: Board) -> u64 { dynamic_depth(board, self.cfg.depth_cap) }

    fn record(&mut self, nodes: u64) {
        self.stats.nodes = nodes;
        self.stats.peak_nodes = self.stats.peak_nodes.max(nodes);
    }

    fn search_branches(&self, board: Board) -> ([BranchEval; 4], u64) {
        let depth = self.depth_for(board);
        let mut map = Table::new();
        let mut state_count = 0u64;
        let mut out = empty_branches();
        for (slot, dir) in out.iter_mut().zip(Move::ALL) {
            let new_board = board.shift(dir);
            if new_board != board {
                let ev = self.expectimax(new_board, Node::Chance, depth, 1.0, &mut map, &mut state_count).score;
                *slot = BranchEval { dir, ev, legal: true };
            }
        }
        (out, state_count)
    }

    fn expectimax(
        &self,
        board: Board,
        node: Node,
        move_depth: u64,
        cum_prob: f32,
        map: &mut Table,
        state_count: &mut u64,
    ) -> ExpectimaxResult {
        *state_count += 1;
        match node {
            Node::Max => self.evaluate_max(board, move_depth, cum_prob, map, state_count),
            Node::Chance => self.evaluate_chance(board, move_depth, cum_prob, map, state_count),
        }
    }

    fn evaluate_max(
        &self,
        board: Board,
        move_depth: u64,
        cum_prob: f32,
        map: &mut Table,
        state_count: &mut u64,
    ) -> ExpectimaxResult {
        let mut best_score = f64::NEG_INFINITY;
        for direction in Move::ALL {
            let new_board = board.shift(direction);
            if new_board != board {
                let score = self.expectimax(new_board, Node::Chance, move_depth, cum_prob, map, state_count).score;
                best_score = best_score.max(score);
            }
        }
        // dead end
        if best_score == f64::NEG_INFINITY {
            best_score = 0.0;
        }
        ExpectimaxResult { score: best_score }
    }

    fn evaluate_chance(
        &self,
        board: Board,
        move_depth: u64,
        cum_prob: f32,
        map: &mut Table,
        state_count: &mut u64,
    ) -> ExpectimaxResult {
        if move_depth == 0 || cum_prob < self.cfg.prob_cutoff {
            return ExpectimaxResult { score: get_heuristic_score(board) };
        }
        // Cache lookup (respect depth)
        if self.cfg.cache_enabled {
            if let Some(entry) = map.get(&board) {
                if entry.move_depth >= move_depth {
                    return ExpectimaxResult { score: entry.score };
                }
            }
        }
        let num_empty_tiles = board.count_empty();
        if num_empty_tiles == 0 {
            return ExpectimaxResult { score: get_heuristic_score(board) };
        }
        let mut tiles_searched = 0;
        let mut tmp: u64 = board.raw();
        let mut insert_tile: u64 = 1;
        let mut score = 0.0;
        let base_prob = cum_prob / num_empty_tiles as f32;
        while tiles_searched < num_empty_tiles {
            if (tmp & 0xf) == 0 {
                let new_board2 = Board::from_raw(board.raw() | insert_tile);
                score += self
                    .expectimax(new_board2, Node::Max, move_depth - 1, base_prob * 0.9, map, state_count)
                    .score
                    * 0.9;
                let new_board4 = Board::from_raw(board.raw() | (insert_tile << 1));
                score += self
                    .expectimax(new_board4, Node::Max, move_depth - 1, base_prob * 0.1, map, state_count)
                    .score
                    * 0.1;
                tiles_searched += 1;
            }
            tmp >>= 4;
            insert_tile <<= 4;
        }
        score /= f64::from(num_empty_tiles);
        if self.cfg.cache_enabled {
            map.insert(board, TranspositionEntry { score, move_depth });
        }
        ExpectimaxResult { score }
    }
}

#[derive(Debug, Clone, Copy)]
struct ExpectimaxResult { score: f64 }

impl Default for Expectimax { fn default() -> Self { Self::new() } }

impl Strategy for Expectimax {
    fn name(&self) -> &'static str { "expectimax" }

    fn next_move(&mut self, state: &GameState) -> Option<Move> { self.best_move(state.board) }

    fn explain_move(&self, dir: Move, state: &GameState) -> String {
        let (branches, _) = self.search_branches(state.board);
        branch_explanation(dir, state, &branches, self.depth_for(state.board))
    }

    fn evaluate_all_moves(&mut self, state: &GameState) -> Evaluations {
        let branches = self.branch_evals(state.board);
        branch_evaluations(state, &branches, self.depth_for(state.board))
    }
}
