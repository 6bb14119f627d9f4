use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::engine::Move;
use crate::game::GameState;

use super::{candidate, candidates, invalid_move_text, Evaluations, MoveEvaluation, Strategy};

/// Uniformly random valid move. Baseline for comparisons.
#[derive(Debug, Clone)]
pub struct RandomStrategy {
    rng: StdRng,
}

impl RandomStrategy {
    pub fn new(seed: u64) -> Self { Self { rng: StdRng::seed_from_u64(seed) } }
}

impl Strategy for RandomStrategy {
    fn name(&self) -> &'static str { "random" }

    fn next_move(&mut self, state: &GameState) -> Option<Move> {
        state.valid_moves().choose(&mut self.rng).copied()
    }

    fn explain_move(&self, dir: Move, state: &GameState) -> String {
        match candidate(state, dir) {
            Some(_) => format!("{dir} was drawn uniformly from {} valid moves", state.valid_moves().len()),
            None => invalid_move_text(dir),
        }
    }

    fn evaluate_all_moves(&mut self, state: &GameState) -> Evaluations {
        let cands = candidates(state);
        let p = 1.0 / cands.len().max(1) as f64;
        let evaluations = cands
            .iter()
            .map(|c| MoveEvaluation {
                direction: c.dir,
                score: p,
                score_delta: c.outcome.score_delta,
                empty_tiles: c.empty_tiles(),
                label: "uniform".to_string(),
                reasoning: format!("chosen with probability {p:.2}"),
            })
            .collect();
        Evaluations { valid_moves: cands.iter().map(|c| c.dir).collect(), evaluations }
    }
}
