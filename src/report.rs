//! Aggregate statistics over finished runs.

use serde::Serialize;

use crate::agent::RunSummary;
use crate::engine::{Score, TileValue};

/// A run counts as won once it produced this tile.
pub const WIN_TILE: TileValue = 2048;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyReport {
    pub strategy: String,
    pub games: usize,
    pub avg_score: f64,
    pub max_score: Score,
    pub avg_moves: f64,
    pub avg_max_tile: f64,
    pub best_tile: TileValue,
    pub win_rate: f64,
}

impl StrategyReport {
    /// Summarise `runs` of one strategy. Empty input yields zeroed averages.
    pub fn from_runs(strategy: &str, runs: &[RunSummary]) -> Self {
        let games = runs.len();
        let n = games.max(1) as f64;
        let sum = |f: fn(&RunSummary) -> f64| runs.iter().map(f).sum::<f64>() / n;
        Self {
            strategy: strategy.to_string(),
            games,
            avg_score: sum(|r| r.final_score as f64),
            max_score: runs.iter().map(|r| r.final_score).max().unwrap_or(0),
            avg_moves: sum(|r| r.moves as f64),
            avg_max_tile: sum(|r| f64::from(r.max_tile)),
            best_tile: runs.iter().map(|r| r.max_tile).max().unwrap_or(0),
            win_rate: runs.iter().filter(|r| r.max_tile >= WIN_TILE).count() as f64 / n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::StopReason;

    fn run(score: Score, max_tile: TileValue, moves: u64) -> RunSummary {
        RunSummary {
            strategy: "corner".into(),
            moves,
            final_score: score,
            max_tile,
            stop_reason: StopReason::GameOver,
        }
    }

    #[test]
    fn averages_and_win_rate() {
        let runs = [run(1000, 512, 100), run(3000, 2048, 300), run(2000, 1024, 200), run(4000, 4096, 400)];
        let r = StrategyReport::from_runs("corner", &runs);
        assert_eq!(r.games, 4);
        assert_eq!(r.avg_score, 2500.0);
        assert_eq!(r.max_score, 4000);
        assert_eq!(r.avg_moves, 250.0);
        assert_eq!(r.avg_max_tile, 1920.0);
        assert_eq!(r.best_tile, 4096);
        assert_eq!(r.win_rate, 0.5);
    }

    #[test]
    fn empty_input_is_all_zero() {
        let r = StrategyReport::from_runs("snake", &[]);
        assert_eq!(r.games, 0);
        assert_eq!(r.avg_score, 0.0);
        assert_eq!(r.win_rate, 0.0);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["strategy"], "snake");
    }
}
