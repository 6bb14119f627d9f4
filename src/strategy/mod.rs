//! Move-selection policies.
//!
//! Every policy implements [`Strategy`]: propose a move, explain a move and
//! score every valid direction. Policies are resolved by identifier through
//! [`StrategyKind`] and used as `Box<dyn Strategy + Send>`; callers never need
//! the concrete type.
//!
//! ```
//! use agents_2048::engine::Board;
//! use agents_2048::game::GameState;
//! use agents_2048::strategy::{StrategyKind, StrategyOptions};
//!
//! let state = GameState::new(Board::from_rows([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap());
//! let mut policy = StrategyKind::resolve("greedy").build(&StrategyOptions::default());
//! let dir = policy.next_move(&state).unwrap();
//! assert!(state.valid_moves().contains(&dir));
//! println!("{}", policy.explain_move(dir, &state));
//! ```

use serde::Serialize;
use tracing::warn;

use crate::engine::{Move, Score};
use crate::expectimax::{Expectimax, ExpectimaxConfig, ExpectimaxParallel};
use crate::game::{simulate_move, GameState, MoveOutcome};

mod corner;
mod endgame;
pub mod features;
mod greedy;
mod random;
mod risk;
mod snake;

pub use corner::CornerStrategy;
pub use endgame::{EndgameStrategy, Phase};
pub use greedy::GreedyStrategy;
pub use random::RandomStrategy;
pub use risk::{RiskAssessment, RiskLevel, RiskTakerStrategy, DEFAULT_TOLERANCE};
pub use snake::SnakeStrategy;

/// Capability set shared by every policy.
///
/// Object-safe so it can be used as `Box<dyn Strategy>`.
pub trait Strategy {
    /// Registry identifier, e.g. `"corner"`.
    fn name(&self) -> &'static str;

    /// Pick a direction. `None` exactly when `state` has no valid move.
    fn next_move(&mut self, state: &GameState) -> Option<Move>;

    /// Human-readable rationale for playing `dir` from `state`.
    fn explain_move(&self, dir: Move, state: &GameState) -> String;

    /// One diagnostic record per valid direction, in `Move::ALL` order.
    fn evaluate_all_moves(&mut self, state: &GameState) -> Evaluations;
}

/// Diagnostic record for one candidate direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveEvaluation {
    pub direction: Move,
    /// The policy's own numeric signal; higher is better.
    pub score: f64,
    pub score_delta: Score,
    pub empty_tiles: u32,
    /// Qualitative classification (e.g. `"best"`, `"high"` risk, a phase name).
    pub label: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluations {
    pub valid_moves: Vec<Move>,
    pub evaluations: Vec<MoveEvaluation>,
}

impl Evaluations {
    /// Highest-scoring record; ties go to the earliest direction.
    pub fn best(&self) -> Option<&MoveEvaluation> {
        self.evaluations.iter().fold(None, |best: Option<&MoveEvaluation>, e| match best {
            Some(b) if b.score >= e.score => Some(b),
            _ => Some(e),
        })
    }
}

/// A valid direction together with its simulated result.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub dir: Move,
    pub outcome: MoveOutcome,
    /// Tiles consumed by merges.
    pub merges: u32,
}

impl Candidate {
    #[inline]
    pub fn empty_tiles(&self) -> u32 { self.outcome.board.count_empty() }
}

/// Simulate every valid direction of `state`, in `Move::ALL` order.
pub fn candidates(state: &GameState) -> Vec<Candidate> {
    Move::ALL
        .into_iter()
        .filter_map(|dir| {
            let outcome = simulate_move(state, dir);
            if outcome.is_noop(state.board) {
                return None;
            }
            let merges = features::merge_count(state.board, outcome.board);
            Some(Candidate { dir, outcome, merges })
        })
        .collect()
}

/// Candidate for `dir`, or `None` if the move does not change the board.
pub fn candidate(state: &GameState, dir: Move) -> Option<Candidate> {
    candidates(state).into_iter().find(|c| c.dir == dir)
}

/// Direction of the highest score; the first candidate wins ties.
pub fn pick_best<F>(cands: &[Candidate], mut score: F) -> Option<Move>
where
    F: FnMut(&Candidate) -> f64,
{
    let mut best: Option<(Move, f64)> = None;
    for c in cands {
        let s = score(c);
        match best {
            Some((_, top)) if s <= top => {}
            _ => best = Some((c.dir, s)),
        }
    }
    best.map(|(dir, _)| dir)
}

/// Relative grade of `score` within `[worst, best]`.
pub(crate) fn relative_label(score: f64, best: f64, worst: f64) -> &'static str {
    if score >= best {
        "best"
    } else if best > worst && (score - worst) / (best - worst) >= 0.5 {
        "good"
    } else if score > worst {
        "fair"
    } else {
        "poor"
    }
}

/// Build records for policies whose label is the relative grade of their score.
pub(crate) fn graded_evaluations<S, R>(state: &GameState, mut score: S, mut reason: R) -> Evaluations
where
    S: FnMut(&Candidate) -> f64,
    R: FnMut(&Candidate, f64) -> String,
{
    let cands = candidates(state);
    let scored: Vec<(Candidate, f64)> = cands.iter().map(|c| (*c, score(c))).collect();
    let best = scored.iter().map(|(_, s)| *s).fold(f64::NEG_INFINITY, f64::max);
    let worst = scored.iter().map(|(_, s)| *s).fold(f64::INFINITY, f64::min);
    let evaluations = scored
        .into_iter()
        .map(|(c, s)| MoveEvaluation {
            direction: c.dir,
            score: s,
            score_delta: c.outcome.score_delta,
            empty_tiles: c.empty_tiles(),
            label: relative_label(s, best, worst).to_string(),
            reasoning: reason(&c, s),
        })
        .collect();
    Evaluations { valid_moves: cands.iter().map(|c| c.dir).collect(), evaluations }
}

pub(crate) fn invalid_move_text(dir: Move) -> String {
    format!("{dir} does not change the board")
}

/// Construction knobs shared by the registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyOptions {
    /// Seed for policies that draw random numbers.
    pub seed: u64,
    /// Depth cap for the expectimax searches (`None` keeps the dynamic depth).
    pub search_depth: Option<u64>,
    /// Floor of the risk-taker's tolerance, in `[0, 1]`.
    pub risk_tolerance: f64,
}

impl Default for StrategyOptions {
    fn default() -> Self { Self { seed: 0, search_depth: Some(4), risk_tolerance: DEFAULT_TOLERANCE } }
}

/// Every policy known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    #[default]
    Corner,
    Snake,
    Greedy,
    Expectimax,
    ExpectimaxParallel,
    Endgame,
    RiskTaker,
    Random,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 8] = [
        StrategyKind::Corner,
        StrategyKind::Snake,
        StrategyKind::Greedy,
        StrategyKind::Expectimax,
        StrategyKind::ExpectimaxParallel,
        StrategyKind::Endgame,
        StrategyKind::RiskTaker,
        StrategyKind::Random,
    ];

    /// Canonical identifier.
    pub fn id(self) -> &'static str {
        match self {
            StrategyKind::Corner => "corner",
            StrategyKind::Snake => "snake",
            StrategyKind::Greedy => "greedy",
            StrategyKind::Expectimax => "expectimax",
            StrategyKind::ExpectimaxParallel => "expectimax-par",
            StrategyKind::Endgame => "endgame",
            StrategyKind::RiskTaker => "risktaker",
            StrategyKind::Random => "random",
        }
    }

    /// Exact lookup by identifier or alias (case-insensitive).
    pub fn parse(name: &str) -> Option<StrategyKind> {
        match name.trim().to_ascii_lowercase().as_str() {
            "corner" => Some(StrategyKind::Corner),
            "snake" => Some(StrategyKind::Snake),
            "greedy" => Some(StrategyKind::Greedy),
            "expectimax" | "smoothness" => Some(StrategyKind::Expectimax),
            "expectimax-par" | "expectimax-parallel" => Some(StrategyKind::ExpectimaxParallel),
            "endgame" | "endgame-specialist" => Some(StrategyKind::Endgame),
            "risktaker" | "risk-taker" | "risk" => Some(StrategyKind::RiskTaker),
            "random" => Some(StrategyKind::Random),
            _ => None,
        }
    }

    /// Lookup that degrades to the default policy for unknown identifiers.
    ///
    /// ```
    /// use agents_2048::strategy::StrategyKind;
    /// assert_eq!(StrategyKind::resolve("snake"), StrategyKind::Snake);
    /// assert_eq!(StrategyKind::resolve("no-such-policy"), StrategyKind::default());
    /// ```
    pub fn resolve(name: &str) -> StrategyKind {
        StrategyKind::parse(name).unwrap_or_else(|| {
            let fallback = StrategyKind::default();
            warn!(requested = name, fallback = fallback.id(), "Unknown strategy, using default");
            fallback
        })
    }

    /// [`Self::resolve`] each name, keeping the first occurrence of every kind.
    ///
    /// Aliases and unknown names can land on a kind that is already listed.
    pub fn resolve_all<S: AsRef<str>>(names: &[S]) -> Vec<StrategyKind> {
        let mut kinds = Vec::new();
        for kind in names.iter().map(|name| StrategyKind::resolve(name.as_ref())) {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }

    pub fn build(self, opts: &StrategyOptions) -> Box<dyn Strategy + Send> {
        let search_cfg = ExpectimaxConfig { depth_cap: opts.search_depth, ..Default::default() };
        match self {
            StrategyKind::Corner => Box::new(CornerStrategy),
            StrategyKind::Snake => Box::new(SnakeStrategy),
            StrategyKind::Greedy => Box::new(GreedyStrategy),
            StrategyKind::Expectimax => Box::new(Expectimax::with_config(search_cfg)),
            StrategyKind::ExpectimaxParallel => Box::new(ExpectimaxParallel::with_config(search_cfg)),
            StrategyKind::Endgame => Box::new(EndgameStrategy),
            StrategyKind::RiskTaker => Box::new(RiskTakerStrategy::with_base_tolerance(opts.risk_tolerance)),
            StrategyKind::Random => Box::new(RandomStrategy::new(opts.seed)),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Resolve `name` (falling back to the default policy) and build it.
pub fn from_name(name: &str, opts: &StrategyOptions) -> Box<dyn Strategy + Send> {
    StrategyKind::resolve(name).build(opts)
}
