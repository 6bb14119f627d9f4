use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use agents_2048::agent::{play_to_end, LocalGame, RunSummary};
use agents_2048::config::AgentConfig;
use agents_2048::engine as GameEngine;
use agents_2048::report::StrategyReport;
use agents_2048::strategy::{StrategyKind, StrategyOptions};

/// Play many seeded games per strategy in parallel and print a JSON report.
#[derive(Parser, Debug)]
#[command(name = "tournament")]
struct Args {
    /// Games per strategy
    #[arg(short, long, default_value_t = 20)]
    games: u64,

    /// Base seed; game `i` uses `seed + i` for every strategy
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Comma-separated identifiers (default: all)
    #[arg(long, value_delimiter = ',')]
    strategies: Vec<String>,

    /// Stop each game after this many moves
    #[arg(long)]
    max_moves: Option<u64>,

    /// Optional TOML file with agent settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// No progress bar
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => AgentConfig::from_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => AgentConfig::default(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    GameEngine::new();

    let kinds: Vec<StrategyKind> = if args.strategies.is_empty() {
        StrategyKind::ALL.to_vec()
    } else {
        StrategyKind::resolve_all(args.strategies.as_slice())
    };
    let mut options = config.runner_options();
    if args.max_moves.is_some() {
        options.max_moves = args.max_moves;
    }
    let jobs: Vec<(StrategyKind, u64)> =
        kinds.iter().flat_map(|&k| (0..args.games).map(move |i| (k, args.seed + i))).collect();

    let pb = if args.quiet { ProgressBar::hidden() } else { ProgressBar::new(jobs.len() as u64) };
    pb.set_style(
        ProgressStyle::with_template("{spinner} {elapsed_precise} [{bar:40}] {pos}/{len} games | {msg}")
            .context("progress template")?
            .progress_chars("=> "),
    );
    let start = Instant::now();
    info!(strategies = kinds.len(), games = args.games, seed = args.seed, "tournament started");

    let runs: Vec<(StrategyKind, RunSummary)> = jobs
        .par_iter()
        .map(|&(kind, seed)| {
            let opts = StrategyOptions { seed, ..config.strategy_options() };
            let mut strategy = kind.build(&opts);
            let host = LocalGame::new(seed);
            let summary = play_to_end(strategy.as_mut(), &host, &options);
            pb.set_message(format!("{} scored {}", summary.strategy, summary.final_score));
            pb.inc(1);
            (kind, summary)
        })
        .collect();
    pb.finish_and_clear();

    let reports: Vec<StrategyReport> = kinds
        .iter()
        .map(|&kind| {
            let mine: Vec<RunSummary> = runs.iter().filter(|(k, _)| *k == kind).map(|(_, r)| r.clone()).collect();
            StrategyReport::from_runs(kind.id(), &mine)
        })
        .collect();
    info!(elapsed_s = start.elapsed().as_secs_f64(), games = runs.len(), "tournament finished");
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
