use crate::engine::{Board, Move};
use crate::game::GameState;

use super::{candidate, candidates, graded_evaluations, invalid_move_text, pick_best, Candidate, Evaluations, Strategy};

/// Serpentine path from the bottom-left corner: bottom row left to right,
/// the row above right to left, and so on.
#[rustfmt::skip]
const SNAKE_PATH: [(usize, usize); 16] = [
    (3, 0), (3, 1), (3, 2), (3, 3),
    (2, 3), (2, 2), (2, 1), (2, 0),
    (1, 0), (1, 1), (1, 2), (1, 3),
    (0, 3), (0, 2), (0, 1), (0, 0),
];

/// Each step along the path is worth a quarter of the previous one.
const DECAY: f64 = 0.25;

/// Arrange tiles in descending order along a snake-shaped gradient.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnakeStrategy;

/// Weighted tile sum along [`SNAKE_PATH`]; the anchor cell has weight 1.
pub fn snake_value(board: Board) -> f64 {
    let mut weight = 1.0;
    let mut total = 0.0;
    for &(row, col) in &SNAKE_PATH {
        total += weight * f64::from(board.get(row, col));
        weight *= DECAY;
    }
    total
}

impl SnakeStrategy {
    fn score(c: &Candidate) -> f64 {
        snake_value(c.outcome.board) + c.outcome.score_delta as f64
    }
}

impl Strategy for SnakeStrategy {
    fn name(&self) -> &'static str { "snake" }

    fn next_move(&mut self, state: &GameState) -> Option<Move> {
        pick_best(&candidates(state), Self::score)
    }

    fn explain_move(&self, dir: Move, state: &GameState) -> String {
        let Some(c) = candidate(state, dir) else { return invalid_move_text(dir) };
        let before = snake_value(state.board);
        let after = snake_value(c.outcome.board);
        if after >= before {
            format!("{dir} strengthens the snake gradient ({before:.1} -> {after:.1})")
        } else {
            format!("{dir} loosens the snake gradient ({before:.1} -> {after:.1}) but is the best option left")
        }
    }

    fn evaluate_all_moves(&mut self, state: &GameState) -> Evaluations {
        graded_evaluations(state, Self::score, |c, _| {
            format!("gradient {:.1}, +{} points", snake_value(c.outcome.board), c.outcome.score_delta)
        })
    }
}
