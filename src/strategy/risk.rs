//! High-variance policy that trades board safety for a shot at 2048.

use std::fmt;

use serde::Serialize;

use crate::engine::{Board, Move, TileValue};
use crate::game::GameState;

use super::features::{can_merge_value, mergeable_pairs, positions_of};
use super::{candidate, candidates, invalid_move_text, pick_best, Candidate, Evaluations, MoveEvaluation, Strategy};

pub const DEFAULT_TOLERANCE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Classify a move by how much room it costs and how crowded it leaves the board.
    pub fn of(before: Board, after: Board) -> RiskLevel {
        let (empty_before, empty_after) = (before.count_empty(), after.count_empty());
        let drop = empty_before.saturating_sub(empty_after);
        if (drop >= 2 && after.highest_tile() <= before.highest_tile()) || empty_after <= 2 {
            RiskLevel::High
        } else if drop >= 1 || empty_after <= 4 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// Score breakdown for one candidate direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskAssessment {
    pub gain: f64,
    pub win_potential: f64,
    pub risk: RiskLevel,
    pub tolerance: f64,
    pub composite: f64,
}

/// Chases the 2048 tile, accepting crowded boards when the payoff is close.
///
/// Risk tolerance starts at the base value (0.7 by default) and rises as the
/// game nears its end: 0.8 from a 512 tile, 0.9 from a 1024 tile and 1.0
/// once four or fewer cells are free.
#[derive(Debug, Clone, Copy)]
pub struct RiskTakerStrategy {
    base_tolerance: f64,
}

impl Default for RiskTakerStrategy {
    fn default() -> Self { Self { base_tolerance: DEFAULT_TOLERANCE } }
}

/// The board holds a 2048, or one slide away from making one.
fn can_create_win(board: Board) -> bool {
    board.highest_tile() >= 2048 || can_merge_value(board, 1024)
}

/// Win-potential in `[0, 1]` for a simulated board.
pub fn win_potential(board: Board) -> f64 {
    let max = board.highest_tile();
    let mut wp: f64 = match max {
        m if m >= 1024 => 0.8,
        m if m >= 512 => 0.4,
        m if m >= 256 => 0.2,
        _ => 0.05,
    };
    let empty = board.count_empty();
    if empty <= 2 {
        wp *= 0.3;
    } else if empty >= 6 {
        wp *= 1.5;
    }
    let holds_1024 = !positions_of(board, 1024).is_empty();
    if can_create_win(board) || (holds_1024 && mergeable_pairs(board, 512) > 0) {
        wp = 0.9;
    }
    wp.min(1.0)
}

impl RiskTakerStrategy {
    pub fn with_base_tolerance(base_tolerance: f64) -> Self {
        Self { base_tolerance: base_tolerance.clamp(0.0, 1.0) }
    }

    /// Tolerance adjusted for the current position.
    pub fn tolerance(&self, state: &GameState) -> f64 {
        let max: TileValue = state.max_tile();
        let raised = if state.empty_tiles() <= 4 {
            1.0
        } else if max >= 1024 {
            0.9
        } else if max >= 512 {
            0.8
        } else {
            self.base_tolerance
        };
        raised.max(self.base_tolerance)
    }

    pub fn assess(&self, state: &GameState, c: &Candidate) -> RiskAssessment {
        let tolerance = self.tolerance(state);
        let after = c.outcome.board;
        let gain = c.outcome.score_delta as f64;
        let wp = win_potential(after);
        let risk = RiskLevel::of(state.board, after);

        let mut composite = gain + 1000.0 * wp;
        match risk {
            RiskLevel::High if wp > 0.3 => composite += 2000.0 * tolerance,
            RiskLevel::High => composite -= 1000.0 * (1.0 - tolerance),
            RiskLevel::Medium => composite += 500.0 * tolerance * wp,
            RiskLevel::Low => {}
        }
        if after.count_empty() <= 3 {
            composite += 500.0 * tolerance;
        }
        if state.max_tile() >= 1024 && can_create_win(after) {
            composite += 5000.0;
        }
        RiskAssessment { gain, win_potential: wp, risk, tolerance, composite }
    }
}

impl Strategy for RiskTakerStrategy {
    fn name(&self) -> &'static str { "risktaker" }

    fn next_move(&mut self, state: &GameState) -> Option<Move> {
        pick_best(&candidates(state), |c| self.assess(state, c).composite)
    }

    fn explain_move(&self, dir: Move, state: &GameState) -> String {
        let Some(c) = candidate(state, dir) else { return invalid_move_text(dir) };
        let a = self.assess(state, &c);
        let stance = match a.risk {
            RiskLevel::High if a.win_potential > 0.3 => "a gamble worth taking",
            RiskLevel::High => "a gamble taken only because nothing safer scores higher",
            RiskLevel::Medium => "a measured risk",
            RiskLevel::Low => "a safe move",
        };
        format!(
            "{dir} is {stance}: {} risk, win potential {:.2}, tolerance {:.1}, +{} points",
            a.risk, a.win_potential, a.tolerance, c.outcome.score_delta
        )
    }

    fn evaluate_all_moves(&mut self, state: &GameState) -> Evaluations {
        let cands = candidates(state);
        let evaluations = cands
            .iter()
            .map(|c| {
                let a = self.assess(state, c);
                MoveEvaluation {
                    direction: c.dir,
                    score: a.composite,
                    score_delta: c.outcome.score_delta,
                    empty_tiles: c.empty_tiles(),
                    label: a.risk.name().to_string(),
                    reasoning: format!("win potential {:.2}, tolerance {:.1}", a.win_potential, a.tolerance),
                }
            })
            .collect();
        Evaluations { valid_moves: cands.iter().map(|c| c.dir).collect(), evaluations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::MoveOutcome;

    const ROOMY: [[TileValue; 4]; 4] = [[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]];

    fn board(rows: [[TileValue; 4]; 4]) -> Board {
        Board::from_rows(rows).unwrap()
    }

    /// Assess a made-up transition from `before` to `after` worth `gain` points.
    fn assess(before: [[TileValue; 4]; 4], after: [[TileValue; 4]; 4], gain: u64) -> RiskAssessment {
        let state = GameState::new(board(before));
        let c = Candidate {
            dir: Move::Left,
            outcome: MoveOutcome { board: board(after), score_delta: gain },
            merges: 0,
        };
        RiskTakerStrategy::default().assess(&state, &c)
    }

    fn close(a: f64, b: f64) -> bool { (a - b).abs() < 1e-9 }

    #[test]
    fn high_risk_without_potential_is_penalised() {
        let a = assess(ROOMY, [[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [8, 16, 0, 0]], 10);
        assert_eq!(a.risk, RiskLevel::High);
        assert!(close(a.win_potential, 0.05 * 0.3));
        assert_eq!(a.tolerance, 0.7);
        // gain + potential - penalty + desperation
        assert!(close(a.composite, 10.0 + 15.0 - 300.0 + 350.0), "{}", a.composite);
    }

    #[test]
    fn high_risk_with_potential_is_a_gamble() {
        let a = assess(ROOMY, [[1024, 1024, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [8, 16, 0, 0]], 0);
        assert_eq!(a.risk, RiskLevel::High);
        assert_eq!(a.win_potential, 0.9);
        assert!(close(a.composite, 900.0 + 1400.0 + 350.0), "{}", a.composite);
    }

    #[test]
    fn medium_risk_scales_with_potential() {
        let a = assess(ROOMY, [[512, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [0; 4]], 8);
        assert_eq!(a.risk, RiskLevel::Medium);
        assert_eq!(a.win_potential, 0.4);
        assert!(close(a.composite, 8.0 + 400.0 + 500.0 * 0.7 * 0.4), "{}", a.composite);
    }

    #[test]
    fn desperation_bonus_below_four_empty_cells() {
        let roomier = assess(ROOMY, [[512, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [0; 4]], 0);
        let tighter = assess(ROOMY, [[512, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [8, 0, 0, 0]], 0);
        assert_eq!((roomier.risk, tighter.risk), (RiskLevel::Medium, RiskLevel::Medium));
        assert_eq!(roomier.win_potential, tighter.win_potential);
        assert!(close(tighter.composite - roomier.composite, 500.0 * 0.7));
    }

    #[test]
    fn creating_2048_from_1024_earns_flat_bonus() {
        let before = [[1024, 0, 0, 0], [0, 0, 1024, 0], [0; 4], [0; 4]];
        let a = assess(before, [[1024, 0, 1024, 0], [0; 4], [0; 4], [0; 4]], 0);
        assert_eq!(a.risk, RiskLevel::Low);
        assert_eq!(a.tolerance, 0.9);
        assert!(close(a.composite, 900.0 + 5000.0), "{}", a.composite);
        // same result from a board that held no 1024 yet: one cell lost, no flat bonus
        let a = assess(ROOMY, [[1024, 0, 1024, 0], [0; 4], [0; 4], [0; 4]], 0);
        assert_eq!(a.risk, RiskLevel::Medium);
        assert!(close(a.composite, 900.0 + 500.0 * 0.7 * 0.9), "{}", a.composite);
    }

    #[test]
    fn base_tolerance_is_a_floor() {
        let open = GameState::new(board(ROOMY));
        assert_eq!(RiskTakerStrategy::with_base_tolerance(0.95).tolerance(&open), 0.95);
        assert_eq!(RiskTakerStrategy::with_base_tolerance(3.0).tolerance(&open), 1.0);
        let late = GameState::new(board([[512, 0, 0, 0], [0; 4], [0; 4], [0; 4]]));
        assert_eq!(RiskTakerStrategy::with_base_tolerance(0.1).tolerance(&late), 0.8);
    }

    #[test]
    fn tolerance_rises_towards_the_end() {
        let s = RiskTakerStrategy::default();
        let open = GameState::new(board([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]));
        assert_eq!(s.tolerance(&open), 0.7);
        let late = GameState::new(board([[512, 0, 0, 0], [0; 4], [0; 4], [0; 4]]));
        assert_eq!(s.tolerance(&late), 0.8);
        let end = GameState::new(board([[1024, 0, 0, 0], [0; 4], [0; 4], [0; 4]]));
        assert_eq!(s.tolerance(&end), 0.9);
        let crowded = GameState::new(board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [8, 0, 0, 0]]));
        assert_eq!(s.tolerance(&crowded), 1.0);
    }

    #[test]
    fn win_potential_brackets() {
        assert_eq!(win_potential(board([[256, 0, 0, 0], [0; 4], [0; 4], [0; 4]])), 0.2 * 1.5);
        assert!((win_potential(board([[1024, 0, 0, 0], [0; 4], [0; 4], [0; 4]])) - 1.0).abs() < 1e-9);
        assert_eq!(win_potential(board([[1024, 0, 1024, 0], [0; 4], [0; 4], [0; 4]])), 0.9);
        assert_eq!(win_potential(board([[1024, 0, 0, 0], [512, 0, 0, 512], [0; 4], [0; 4]])), 0.9);
    }

    #[test]
    fn risk_levels() {
        let roomy = board([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert_eq!(RiskLevel::of(roomy, roomy), RiskLevel::Low);
        let tight = board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [8, 16, 0, 0]]);
        assert_eq!(RiskLevel::of(roomy, tight), RiskLevel::High);
        let snug = board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 0, 0], [8, 16, 0, 0]]);
        assert_eq!(RiskLevel::of(snug, snug), RiskLevel::Medium);
    }

    #[test]
    fn goes_for_the_win_merge() {
        let s = GameState::new(board([[0, 1024, 1024, 0], [2, 4, 8, 16], [4, 8, 16, 32], [8, 16, 32, 64]]));
        let mut strategy = RiskTakerStrategy::default();
        let pick = strategy.next_move(&s).unwrap();
        assert!(matches!(pick, Move::Left | Move::Right));
        let evals = strategy.evaluate_all_moves(&s);
        assert_eq!(evals.best().map(|e| e.direction), Some(pick));
        assert!(strategy.explain_move(pick, &s).contains("win potential"));
    }
}
