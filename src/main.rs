use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use agents_2048::agent::{summarize, tick, tick_interval, AgentRunner, GameHost, LocalGame, RunSummary, StopReason, Tick};
use agents_2048::config::AgentConfig;
use agents_2048::engine::{self as GameEngine, Board, Move};
use agents_2048::game::GameState;
use agents_2048::strategy::{Evaluations, Phase, StrategyKind};

#[derive(Parser)]
#[command(name = "agents-2048")]
#[command(about = "Play and inspect 2048 with heuristic agents")]
#[command(version)]
struct Cli {
    /// Optional TOML file with agent settings; flags override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game and print every board
    Play {
        /// Strategy identifier (see `list`)
        #[arg(short, long)]
        strategy: Option<String>,
        /// Moves per second when running in real time (0.5-10)
        #[arg(long)]
        speed: Option<f64>,
        /// Log the rationale behind every move
        #[arg(long)]
        explain: bool,
        /// RNG seed for tile spawns
        #[arg(long)]
        seed: Option<u64>,
        /// Stop after this many moves
        #[arg(long)]
        max_moves: Option<u64>,
        /// Pace moves through the background runner instead of playing flat out
        #[arg(long)]
        realtime: bool,
    },

    /// Score every direction for a given board and print JSON
    Analyze {
        /// Board rows, top to bottom, e.g. "2,2,4,0/0,0,0,0/0,0,0,0/0,0,0,2"
        #[arg(long)]
        rows: String,
        #[arg(short, long)]
        strategy: Option<String>,
    },

    /// List strategy identifiers
    List,
}

#[derive(Serialize)]
struct Analysis {
    strategy: &'static str,
    phase: Phase,
    board: [[u32; 4]; 4],
    is_game_over: bool,
    recommended: Option<Move>,
    explanation: Option<String>,
    #[serde(flatten)]
    evaluations: Evaluations,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AgentConfig::from_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => AgentConfig::default(),
    };
    init_tracing(&config.log_level);
    GameEngine::new();

    match cli.command {
        Commands::Play { strategy, speed, explain, seed, max_moves, realtime } => {
            if let Some(s) = strategy { config.strategy = s; }
            if let Some(s) = speed { config.speed = s; }
            if let Some(s) = seed { config.seed = s; }
            if max_moves.is_some() { config.max_moves = max_moves; }
            config.explain_moves |= explain;
            config.validate()?;
            let summary = if realtime { play_realtime(&config) } else { play(&config) };
            println!(
                "Strategy: {} | moves: {} | score: {} | max tile: {} | stopped: {:?}",
                summary.strategy, summary.moves, summary.final_score, summary.max_tile, summary.stop_reason
            );
        }
        Commands::Analyze { rows, strategy } => {
            if let Some(s) = strategy { config.strategy = s; }
            let board: Board = rows.parse().with_context(|| format!("parsing board {rows:?}"))?;
            println!("{}", serde_json::to_string_pretty(&analyze(&config, board))?);
        }
        Commands::List => {
            for kind in StrategyKind::ALL {
                let marker = if kind == StrategyKind::default() { " (default)" } else { "" };
                println!("{kind}{marker}");
            }
        }
    }
    Ok(())
}

fn play(config: &AgentConfig) -> RunSummary {
    let mut strategy = config.strategy_kind().build(&config.strategy_options());
    let host = LocalGame::new(config.seed);
    let options = config.runner_options();
    println!("{}", host.current_state().board);
    let mut moves = 0;
    let reason = loop {
        match tick(strategy.as_mut(), &host, &options, moves, &|| false) {
            Tick::Moved(dir, next) => {
                moves += 1;
                println!("{dir} -> score {}\n{}", next.score, next.board);
            }
            Tick::Stopped(reason) => break reason,
        }
    };
    summarize(strategy.name(), &host, moves, reason)
}

fn play_realtime(config: &AgentConfig) -> RunSummary {
    let strategy = config.strategy_kind().build(&config.strategy_options());
    let host = Arc::new(LocalGame::new(config.seed));
    let options = config.runner_options();
    let mut runner = AgentRunner::new(strategy, host.clone(), options);
    runner.start();
    let mut shown = host.current_state();
    println!("{}", shown.board);
    while runner.is_running() {
        thread::sleep(tick_interval(options.speed) / 2);
        let now = host.current_state();
        if now != shown {
            println!("score {}\n{}", now.score, now.board);
            shown = now;
        }
    }
    // a finished worker always hands back a summary unless it panicked
    runner.join().unwrap_or_else(|| {
        summarize(config.strategy_kind().id(), host.as_ref(), host.history().len() as u64, StopReason::Cancelled)
    })
}

fn analyze(config: &AgentConfig, board: Board) -> Analysis {
    let state = GameState::new(board);
    let mut strategy = config.strategy_kind().build(&config.strategy_options());
    let recommended = strategy.next_move(&state);
    Analysis {
        strategy: strategy.name(),
        phase: Phase::of_state(&state),
        board: board.rows(),
        is_game_over: state.is_game_over,
        recommended,
        explanation: recommended.map(|dir| strategy.explain_move(dir, &state)),
        evaluations: strategy.evaluate_all_moves(&state),
    }
}
