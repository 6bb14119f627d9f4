use agents_2048::engine::{self as GameEngine, Board, Move};
use agents_2048::expectimax::{ExpectimaxConfig, ExpectimaxParallel};
use agents_2048::game::GameState;
use agents_2048::strategy::{features, Phase, StrategyKind, StrategyOptions};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use rayon::ThreadPoolBuilder;
use std::hint::black_box;

fn warm() { GameEngine::new(); }

fn corpus() -> Vec<GameState> {
    let mut rng = StdRng::seed_from_u64(7777);
    let mut boards = Vec::new();
    let mut b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    boards.push(b);
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..64 {
        let dir = seq[i % seq.len()];
        let nb = b.shift(dir);
        if nb != b { b = nb.with_random_tile(&mut rng); }
        boards.push(b);
    }
    boards.into_iter().map(GameState::new).collect()
}

fn bench_next_move(c: &mut Criterion) {
    warm();
    let states = corpus();
    let opts = StrategyOptions { search_depth: Some(2), ..Default::default() };
    for kind in StrategyKind::ALL {
        let mut strategy = kind.build(&opts);
        c.bench_function(&format!("next_move/{kind}"), |bch| {
            bch.iter(|| {
                let mut acc = 0u64;
                for s in &states {
                    acc ^= strategy.next_move(s).map(|m| m as u64).unwrap_or(0);
                }
                black_box(acc)
            })
        });
    }
}

fn bench_evaluate_all(c: &mut Criterion) {
    warm();
    let states = corpus();
    for kind in [StrategyKind::Endgame, StrategyKind::RiskTaker, StrategyKind::Corner] {
        let mut strategy = kind.build(&StrategyOptions::default());
        c.bench_function(&format!("evaluate_all_moves/{kind}"), |bch| {
            bch.iter(|| {
                let mut acc = 0usize;
                for s in &states { acc += strategy.evaluate_all_moves(s).evaluations.len(); }
                black_box(acc)
            })
        });
    }
}

/// Board measurements the heuristic policies call once per candidate.
fn bench_features(c: &mut Criterion) {
    let boards: Vec<Board> = corpus().into_iter().map(|s| s.board).collect();
    let mut group = c.benchmark_group("features");
    group.bench_function("blocked_pairs", |bch| {
        bch.iter(|| black_box(boards.iter().map(|&b| features::blocked_pairs(b, 256)).sum::<usize>()))
    });
    group.bench_function("mergeable_pairs", |bch| {
        bch.iter(|| black_box(boards.iter().map(|&b| features::mergeable_pairs(b, 4)).sum::<usize>()))
    });
    group.bench_function("monotonic_lines", |bch| {
        bch.iter(|| {
            black_box(boards.iter().map(|&b| features::monotonic_rows(b) + features::monotonic_cols(b)).sum::<u32>())
        })
    });
    group.bench_function("smoothness", |bch| {
        bch.iter(|| black_box(boards.iter().map(|&b| features::smoothness(b)).sum::<f64>()))
    });
    group.bench_function("phase", |bch| {
        bch.iter(|| {
            black_box(boards.iter().filter(|&&b| Phase::of(b.highest_tile(), b.count_empty()) == Phase::Survival).count())
        })
    });
    group.finish();
}

fn bench_par_e2e(c: &mut Criterion) {
    warm();
    // Pin a small pool for stability
    let pool = ThreadPoolBuilder::new().num_threads(4).build().unwrap();
    let cfg = ExpectimaxConfig { depth_cap: Some(4), ..Default::default() };
    let mut ex = ExpectimaxParallel::with_config(cfg);
    c.bench_function("e2e_par/64_moves", |bch| {
        bch.iter(|| pool.install(|| {
            let mut rng = StdRng::seed_from_u64(13);
            let mut b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
            let mut steps = 0;
            while steps < 64 && !b.is_game_over() {
                if let Some(dir) = ex.best_move(b) { b = b.make_move(dir, &mut rng); } else { break; }
                steps += 1;
            }
            black_box((b.raw(), steps))
        }))
    });
}

criterion_group!(strategies, bench_next_move, bench_evaluate_all, bench_features, bench_par_e2e);
criterion_main!(strategies);
