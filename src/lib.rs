//! agents-2048: a 2048 board engine plus pluggable move-selection agents
//!
//! This crate provides:
//! - A compact `Board` type with pure slide/merge simulation (`engine` module)
//! - An immutable `GameState` carrying score and terminality (`game` module)
//! - Heuristic policies behind one `Strategy` trait (`strategy` module):
//!   corner, snake, greedy, endgame specialist, risk-taker and random
//! - An Expectimax search with single-threaded and parallel variants (`expectimax` module)
//! - A paced background runner and a batch loop (`agent` module)
//! - TOML configuration (`config`) and aggregate statistics (`report`)
//!
//! Quick start:
//! ```
//! use agents_2048::engine::{Board, Move};
//! use agents_2048::game::{simulate_move, GameState};
//!
//! let state = GameState::new(Board::from_rows([[2, 2, 4, 0], [0; 4], [0; 4], [0; 4]]).unwrap());
//! let outcome = simulate_move(&state, Move::Left);
//! assert_eq!(outcome.board.rows()[0], [4, 4, 0, 0]);
//! assert_eq!(outcome.score_delta, 4);
//! ```
//!
//! Full loop
//! ```
//! use agents_2048::agent::{play_to_end, LocalGame, RunnerOptions};
//! use agents_2048::strategy::{StrategyKind, StrategyOptions};
//!
//! let host = LocalGame::new(123);
//! let mut policy = StrategyKind::resolve("endgame").build(&StrategyOptions::default());
//! let opts = RunnerOptions { max_moves: Some(20), ..Default::default() };
//! let summary = play_to_end(policy.as_mut(), &host, &opts);
//! assert!(summary.moves <= 20);
//! ```
pub mod agent;
pub mod config;
pub mod engine;
pub mod expectimax;
pub mod game;
pub mod report;
pub mod strategy;

pub use engine::{Board, Move};
pub use game::GameState;
pub use strategy::{Strategy, StrategyKind};
