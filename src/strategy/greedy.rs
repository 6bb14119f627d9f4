use crate::engine::Move;
use crate::game::GameState;

use super::{candidate, candidates, graded_evaluations, invalid_move_text, pick_best, Candidate, Evaluations, Strategy};

/// Take the move with the largest immediate score, then the emptier board.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyStrategy;

impl GreedyStrategy {
    fn score(c: &Candidate) -> f64 {
        c.outcome.score_delta as f64 + f64::from(c.empty_tiles()) / 100.0
    }
}

impl Strategy for GreedyStrategy {
    fn name(&self) -> &'static str { "greedy" }

    fn next_move(&mut self, state: &GameState) -> Option<Move> {
        pick_best(&candidates(state), Self::score)
    }

    fn explain_move(&self, dir: Move, state: &GameState) -> String {
        match candidate(state, dir) {
            Some(c) if c.outcome.score_delta > 0 => format!(
                "{dir} earns {} points now from {} merge(s), leaving {} empty cells",
                c.outcome.score_delta,
                c.merges,
                c.empty_tiles()
            ),
            Some(c) => format!("no merge is available; {dir} keeps {} cells empty", c.empty_tiles()),
            None => invalid_move_text(dir),
        }
    }

    fn evaluate_all_moves(&mut self, state: &GameState) -> Evaluations {
        graded_evaluations(state, Self::score, |c, _| {
            format!("+{} points, {} empty", c.outcome.score_delta, c.empty_tiles())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Board;

    #[test]
    fn takes_the_biggest_merge() {
        let b = Board::from_rows([[2, 2, 0, 0], [0, 0, 0, 0], [64, 0, 0, 0], [64, 0, 0, 0]]).unwrap();
        let state = GameState::new(b);
        // up/down merge the 64s (128 points), left/right only the 2s
        assert_eq!(GreedyStrategy.next_move(&state), Some(Move::Up));
        assert!(GreedyStrategy.explain_move(Move::Up, &state).contains("128 points"));
    }

    #[test]
    fn breaks_score_ties_on_empty_cells() {
        let b = Board::from_rows([[2, 4, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        let state = GameState::new(b);
        // nothing merges and every valid move keeps 14 empties: first in order wins
        assert_eq!(GreedyStrategy.next_move(&state), Some(Move::Down));
    }
}
