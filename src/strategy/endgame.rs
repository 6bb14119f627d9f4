//! Phase-aware policy that plays for the 2048 tile.
//!
//! The phase is recomputed from `(max tile, empty cells)` on every call; the
//! strategy itself holds no state.

use std::fmt;

use serde::Serialize;

use crate::engine::{Board, Move, TileValue};
use crate::game::GameState;

use super::features::{
    blocked_pairs, can_merge_value, is_corner, is_edge, max_in_corner, mergeable_pairs, monotonic_cols,
    monotonic_rows, positions_of,
};
use super::{candidate, candidates, invalid_move_text, pick_best, Candidate, Evaluations, MoveEvaluation, Strategy};

const WIN_TILE: TileValue = 2048;
const HALF_WIN: TileValue = 1024;

/// Stage of play derived from the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Foundation,
    Survival,
    LateGame,
    Endgame,
}

impl Phase {
    /// `max >= 1024` → Endgame, `max >= 512` → LateGame, `empty <= 6` → Survival, else Foundation.
    pub fn of(max_tile: TileValue, empty: u32) -> Phase {
        if max_tile >= 1024 {
            Phase::Endgame
        } else if max_tile >= 512 {
            Phase::LateGame
        } else if empty <= 6 {
            Phase::Survival
        } else {
            Phase::Foundation
        }
    }

    pub fn of_state(state: &GameState) -> Phase { Phase::of(state.max_tile(), state.empty_tiles()) }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Foundation => "foundation",
            Phase::Survival => "survival",
            Phase::LateGame => "late-game",
            Phase::Endgame => "endgame",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// Switches heuristics by [`Phase`]: build freely early, hoard space when
/// crowded, line tiles up once 512 appears and chase the final merge at 1024.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndgameStrategy;

fn count_value(board: Board, value: TileValue) -> usize { positions_of(board, value).len() }

/// Whether the move itself produced a (new) 2048 tile.
fn creates_win_tile(before: Board, after: Board) -> bool {
    count_value(after, WIN_TILE) > count_value(before, WIN_TILE)
}

fn endgame_score(before: Board, c: &Candidate) -> f64 {
    let after = c.outcome.board;
    let mut score = 0.0;
    if creates_win_tile(before, after) {
        score += 10_000.0;
    }
    for pos in positions_of(after, HALF_WIN) {
        if is_corner(pos) {
            score += 200.0;
        } else if is_edge(pos) {
            score += 100.0;
        }
    }
    score += 500.0 * mergeable_pairs(after, 1024) as f64;
    score += 300.0 * mergeable_pairs(after, 512) as f64;
    score -= 1000.0 * blocked_pairs(after, 256) as f64;
    let empty = c.empty_tiles();
    if empty >= 2 {
        score += 50.0 * f64::from(empty);
    } else {
        score -= 500.0;
    }
    score
}

/// Corner occupancy of the max tile (worth 5) plus 10 per monotonic row and column.
fn positioning(board: Board) -> u32 {
    let corner = if max_in_corner(board) { 5 } else { 0 };
    corner + 10 * monotonic_rows(board) + 10 * monotonic_cols(board)
}

fn late_game_score(c: &Candidate) -> f64 {
    50.0 * f64::from(c.merges) + 10.0 * f64::from(positioning(c.outcome.board)) + 20.0 * f64::from(c.empty_tiles())
}

fn survival_score(c: &Candidate) -> f64 { f64::from(c.empty_tiles()) }

fn foundation_score(c: &Candidate) -> f64 {
    let bias = if matches!(c.dir, Move::Left | Move::Down) { 10.0 } else { 0.0 };
    100.0 * f64::from(c.merges) + bias
}

impl EndgameStrategy {
    fn score(phase: Phase, before: Board, c: &Candidate) -> f64 {
        match phase {
            Phase::Endgame => endgame_score(before, c),
            Phase::LateGame => late_game_score(c),
            Phase::Survival => survival_score(c),
            Phase::Foundation => foundation_score(c),
        }
    }

    fn reasoning(phase: Phase, before: Board, c: &Candidate) -> String {
        let after = c.outcome.board;
        match phase {
            Phase::Endgame if creates_win_tile(before, after) => format!("{} merges the 1024 tiles into 2048", c.dir),
            Phase::Endgame if can_merge_value(after, HALF_WIN) => {
                format!("{} leaves a clear path between two 1024 tiles", c.dir)
            }
            Phase::Endgame if blocked_pairs(after, 256) > 0 => format!(
                "{} leaves {} high-tile pair(s) blocked",
                c.dir,
                blocked_pairs(after, 256)
            ),
            Phase::Endgame => format!("{} keeps {} cells free around the high tiles", c.dir, c.empty_tiles()),
            Phase::LateGame => format!(
                "{} merges {} tile(s), positioning {}, {} empty",
                c.dir,
                c.merges,
                positioning(after),
                c.empty_tiles()
            ),
            Phase::Survival => format!("{} frees the most room: {} empty cells", c.dir, c.empty_tiles()),
            Phase::Foundation => format!("{} merges {} tile(s) while building towards the corner", c.dir, c.merges),
        }
    }
}

impl Strategy for EndgameStrategy {
    fn name(&self) -> &'static str { "endgame" }

    fn next_move(&mut self, state: &GameState) -> Option<Move> {
        let phase = Phase::of_state(state);
        pick_best(&candidates(state), |c| Self::score(phase, state.board, c))
    }

    fn explain_move(&self, dir: Move, state: &GameState) -> String {
        let phase = Phase::of_state(state);
        match candidate(state, dir) {
            Some(c) => format!(
                "{} phase (max tile {}, {} empty): {}",
                phase,
                state.max_tile(),
                state.empty_tiles(),
                Self::reasoning(phase, state.board, &c)
            ),
            None => invalid_move_text(dir),
        }
    }

    fn evaluate_all_moves(&mut self, state: &GameState) -> Evaluations {
        let phase = Phase::of_state(state);
        let cands = candidates(state);
        let evaluations = cands
            .iter()
            .map(|c| MoveEvaluation {
                direction: c.dir,
                score: Self::score(phase, state.board, c),
                score_delta: c.outcome.score_delta,
                empty_tiles: c.empty_tiles(),
                label: phase.name().to_string(),
                reasoning: Self::reasoning(phase, state.board, c),
            })
            .collect();
        Evaluations { valid_moves: cands.iter().map(|c| c.dir).collect(), evaluations }
    }
}
