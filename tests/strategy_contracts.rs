//! Contract tests shared by every registered strategy.
use proptest::prelude::*;

use agents_2048::agent::{play_to_end, GameHost, LocalGame, RunnerOptions, StopReason};
use agents_2048::engine::{Board, Move, TileValue};
use agents_2048::game::{simulate_move, GameState};
use agents_2048::strategy::{EndgameStrategy, Strategy, StrategyKind, StrategyOptions};

fn state(rows: [[TileValue; 4]; 4]) -> GameState {
    GameState::new(Board::from_rows(rows).unwrap())
}

fn shallow() -> StrategyOptions {
    StrategyOptions { seed: 3, search_depth: Some(2), ..Default::default() }
}

fn all_strategies() -> Vec<Box<dyn Strategy + Send>> {
    StrategyKind::ALL.iter().map(|k| k.build(&shallow())).collect()
}

#[test]
fn slide_scenarios() {
    let s = state([[2, 2, 4, 0], [0; 4], [0; 4], [0; 4]]);
    let out = simulate_move(&s, Move::Left);
    assert_eq!(out.board.rows()[0], [4, 4, 0, 0]);
    assert_eq!(out.score_delta, 4);

    let s = state([[4, 2, 2, 4], [0; 4], [0; 4], [0; 4]]);
    let out = simulate_move(&s, Move::Left);
    assert_eq!(out.board.rows()[0], [4, 4, 4, 0]);
    assert_eq!(out.score_delta, 4);

    let s = state([[0, 0, 0, 0], [8, 0, 0, 0], [8, 0, 0, 0], [8, 0, 0, 0]]);
    let out = simulate_move(&s, Move::Down);
    let column: Vec<TileValue> = out.board.rows().iter().map(|r| r[0]).collect();
    assert_eq!(column, vec![0, 0, 8, 16]);
    assert_eq!(out.score_delta, 16);
}

#[test]
fn dead_board_yields_no_move_from_anyone() {
    let s = state([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
    assert!(s.is_game_over);
    assert!(s.valid_moves().is_empty());
    for mut strategy in all_strategies() {
        assert_eq!(strategy.next_move(&s), None, "{}", strategy.name());
        let evals = strategy.evaluate_all_moves(&s);
        assert!(evals.valid_moves.is_empty());
        assert!(evals.evaluations.is_empty());
    }
}

#[test]
fn endgame_merges_clear_1024_pair() {
    let s = state([[2, 4, 8, 16], [0, 1024, 0, 1024], [4, 8, 16, 32], [8, 16, 32, 64]]);
    let pick = EndgameStrategy.next_move(&s).unwrap();
    assert!(matches!(pick, Move::Left | Move::Right));
    assert!(simulate_move(&s, pick).board.rows()[1].contains(&2048));
}

#[test]
fn evaluations_cover_exactly_the_valid_moves() {
    let s = state([[2, 0, 0, 2], [4, 0, 0, 0], [0; 4], [0, 0, 8, 0]]);
    for mut strategy in all_strategies() {
        let evals = strategy.evaluate_all_moves(&s);
        assert_eq!(evals.valid_moves, s.valid_moves(), "{}", strategy.name());
        let dirs: Vec<Move> = evals.evaluations.iter().map(|e| e.direction).collect();
        assert_eq!(dirs, s.valid_moves(), "{}", strategy.name());
        for e in &evals.evaluations {
            assert!(!e.reasoning.is_empty());
            assert_eq!(e.score_delta, simulate_move(&s, e.direction).score_delta);
        }
    }
}

#[test]
fn every_strategy_finishes_a_short_game() {
    for kind in StrategyKind::ALL {
        let host = LocalGame::new(21);
        let mut strategy = kind.build(&shallow());
        let opts = RunnerOptions { max_moves: Some(40), ..Default::default() };
        let summary = play_to_end(strategy.as_mut(), &host, &opts);
        assert_eq!(summary.strategy, kind.id());
        assert!(matches!(summary.stop_reason, StopReason::MoveLimit | StopReason::GameOver));
        assert_eq!(summary.final_score, host.current_state().score);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn proposals_are_valid_and_inputs_untouched(ranks in prop::collection::vec(0u64..=10, 16)) {
        let board = Board::from_raw(ranks.iter().fold(0u64, |acc, &r| (acc << 4) | r));
        let s = GameState::new(board);
        let before = s;
        for mut strategy in all_strategies() {
            match strategy.next_move(&s) {
                Some(dir) => prop_assert!(s.valid_moves().contains(&dir), "{} proposed {}", strategy.name(), dir),
                None => prop_assert!(s.is_game_over, "{} gave up early", strategy.name()),
            }
            prop_assert_eq!(s, before);
        }
    }
}
