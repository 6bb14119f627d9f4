use crate::engine::{Board, Move};
use crate::game::GameState;

use super::features::{is_corner, positions_of};
use super::{candidate, candidates, graded_evaluations, invalid_move_text, pick_best, Candidate, Evaluations, Strategy};

const ANCHOR: (usize, usize) = (3, 0);
const ANCHOR_BONUS: f64 = 1000.0;
const OTHER_CORNER_BONUS: f64 = 300.0;
const EMPTY_WEIGHT: f64 = 20.0;

/// Keep the largest tile pinned to the bottom-left corner.
///
/// Down and left are preferred, right is neutral and up is a last resort
/// since it pulls the anchor row away from the corner.
#[derive(Debug, Clone, Copy, Default)]
pub struct CornerStrategy;

fn direction_preference(dir: Move) -> f64 {
    match dir {
        Move::Down => 40.0,
        Move::Left => 30.0,
        Move::Right => 0.0,
        Move::Up => -100.0,
    }
}

fn corner_bonus(board: Board) -> f64 {
    let max = board.highest_tile();
    let spots = positions_of(board, max);
    if spots.contains(&ANCHOR) {
        ANCHOR_BONUS
    } else if spots.into_iter().any(is_corner) {
        OTHER_CORNER_BONUS
    } else {
        0.0
    }
}

impl CornerStrategy {
    fn score(c: &Candidate) -> f64 {
        corner_bonus(c.outcome.board)
            + c.outcome.score_delta as f64
            + EMPTY_WEIGHT * f64::from(c.empty_tiles())
            + direction_preference(c.dir)
    }
}

impl Strategy for CornerStrategy {
    fn name(&self) -> &'static str { "corner" }

    fn next_move(&mut self, state: &GameState) -> Option<Move> {
        pick_best(&candidates(state), Self::score)
    }

    fn explain_move(&self, dir: Move, state: &GameState) -> String {
        let Some(c) = candidate(state, dir) else { return invalid_move_text(dir) };
        let bonus = corner_bonus(c.outcome.board);
        let max = c.outcome.board.highest_tile();
        if bonus >= ANCHOR_BONUS {
            format!("{dir} keeps the {max} tile anchored bottom-left ({} empty)", c.empty_tiles())
        } else if bonus > 0.0 {
            format!("{dir} holds the {max} tile in a corner, though not the bottom-left anchor")
        } else if dir == Move::Up {
            format!("{dir} is a last resort: it drags the {max} tile out of its corner")
        } else {
            format!("{dir} leaves the {max} tile off the corner; best available to recover")
        }
    }

    fn evaluate_all_moves(&mut self, state: &GameState) -> Evaluations {
        graded_evaluations(state, Self::score, |c, _| {
            let anchored = corner_bonus(c.outcome.board) >= ANCHOR_BONUS;
            format!(
                "max tile {} {}, +{} points, {} empty",
                c.outcome.board.highest_tile(),
                if anchored { "anchored" } else { "off anchor" },
                c.outcome.score_delta,
                c.empty_tiles()
            )
        })
    }
}
