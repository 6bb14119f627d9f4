//! Drives a [`Strategy`] against a game host at a fixed cadence.
//!
//! The host owns the authoritative [`GameState`]; the runner only reads it and
//! submits moves. [`AgentRunner`] plays on a worker thread and can be stopped
//! at any time. [`play_to_end`] is the synchronous equivalent for batch use.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::engine::{Move, Score, TileValue};
use crate::game::GameState;
use crate::strategy::Strategy;

pub const MIN_SPEED: f64 = 0.5;
pub const MAX_SPEED: f64 = 10.0;
pub const DEFAULT_SPEED: f64 = 2.0;

/// Clamp a moves-per-second value into `[MIN_SPEED, MAX_SPEED]`.
pub fn clamp_speed(speed: f64) -> f64 {
    if speed.is_nan() { MIN_SPEED } else { speed.clamp(MIN_SPEED, MAX_SPEED) }
}

/// Delay between two decisions at `speed` moves per second.
pub fn tick_interval(speed: f64) -> Duration { Duration::from_secs_f64(1.0 / clamp_speed(speed)) }

/// Holder of the live game. Implementations perform the actual state transition.
pub trait GameHost: Send + Sync {
    fn current_state(&self) -> GameState;

    /// Apply `dir`; `None` when the move does not change the board.
    fn submit_move(&self, dir: Move) -> Option<GameState>;
}

struct LocalInner {
    state: GameState,
    rng: StdRng,
    history: Vec<Move>,
}

/// In-process host: a game state plus a seeded RNG for tile spawns.
pub struct LocalGame {
    inner: Mutex<LocalInner>,
}

impl LocalGame {
    /// Fresh game with two random tiles, reproducible from `seed`.
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let state = GameState::start(&mut rng);
        Self::from_parts(state, rng)
    }

    /// Continue from an existing position; later spawns are drawn from `seed`.
    pub fn with_state(state: GameState, seed: u64) -> Self { Self::from_parts(state, StdRng::seed_from_u64(seed)) }

    fn from_parts(state: GameState, rng: StdRng) -> Self {
        Self { inner: Mutex::new(LocalInner { state, rng, history: Vec::new() }) }
    }

    fn lock(&self) -> MutexGuard<'_, LocalInner> { self.inner.lock().unwrap_or_else(PoisonError::into_inner) }

    /// Moves applied so far, oldest first.
    pub fn history(&self) -> Vec<Move> { self.lock().history.clone() }
}

impl GameHost for LocalGame {
    fn current_state(&self) -> GameState { self.lock().state }

    fn submit_move(&self, dir: Move) -> Option<GameState> {
        let mut inner = self.lock();
        let LocalInner { state, rng, history } = &mut *inner;
        let next = state.make_move(dir, rng)?;
        *state = next;
        history.push(dir);
        Some(next)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    /// The board had no valid move left.
    GameOver,
    /// The strategy declined to move.
    NoMove,
    /// The host refused the proposed move.
    Rejected,
    MoveLimit,
    Cancelled,
}

/// Outcome of one run, returned when the runner stops.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub strategy: String,
    pub moves: u64,
    pub final_score: Score,
    pub max_tile: TileValue,
    pub stop_reason: StopReason,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunnerOptions {
    /// Decisions per second, clamped on use.
    pub speed: f64,
    /// Log the strategy's rationale for every move.
    pub explain_moves: bool,
    pub max_moves: Option<u64>,
}

impl Default for RunnerOptions {
    fn default() -> Self { Self { speed: DEFAULT_SPEED, explain_moves: false, max_moves: None } }
}

/// Result of a single decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    Moved(Move, GameState),
    Stopped(StopReason),
}

/// One decision: read the host, ask the strategy, submit unless `cancelled()`.
///
/// `moves_made` counts moves already submitted in this run.
pub fn tick(
    strategy: &mut dyn Strategy,
    host: &dyn GameHost,
    options: &RunnerOptions,
    moves_made: u64,
    cancelled: &dyn Fn() -> bool,
) -> Tick {
    if options.max_moves.is_some_and(|limit| moves_made >= limit) {
        return Tick::Stopped(StopReason::MoveLimit);
    }
    let state = host.current_state();
    if state.is_game_over {
        return Tick::Stopped(StopReason::GameOver);
    }
    let Some(dir) = strategy.next_move(&state) else {
        return Tick::Stopped(StopReason::NoMove);
    };
    if options.explain_moves {
        info!(strategy = strategy.name(), %dir, "{}", strategy.explain_move(dir, &state));
    }
    if cancelled() {
        return Tick::Stopped(StopReason::Cancelled);
    }
    match host.submit_move(dir) {
        Some(next) => {
            debug!(strategy = strategy.name(), %dir, score = next.score, "move submitted");
            Tick::Moved(dir, next)
        }
        None => {
            warn!(strategy = strategy.name(), %dir, "host rejected move");
            Tick::Stopped(StopReason::Rejected)
        }
    }
}

/// Build a [`RunSummary`] from the host's current state.
pub fn summarize(strategy: &str, host: &dyn GameHost, moves: u64, stop_reason: StopReason) -> RunSummary {
    let state = host.current_state();
    RunSummary {
        strategy: strategy.to_string(),
        moves,
        final_score: state.score,
        max_tile: state.max_tile(),
        stop_reason,
    }
}

/// Play without pacing until the game ends, the strategy gives up or the move limit is hit.
pub fn play_to_end(strategy: &mut dyn Strategy, host: &dyn GameHost, options: &RunnerOptions) -> RunSummary {
    let mut moves = 0;
    let reason = loop {
        match tick(strategy, host, options, moves, &|| false) {
            Tick::Moved(..) => moves += 1,
            Tick::Stopped(reason) => break reason,
        }
    };
    summarize(strategy.name(), host, moves, reason)
}

type BoxedStrategy = Box<dyn Strategy + Send>;

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<(BoxedStrategy, RunSummary)>,
}

fn stop_requested(rx: &Receiver<()>) -> bool {
    !matches!(rx.try_recv(), Err(TryRecvError::Empty))
}

fn run_worker(
    mut strategy: BoxedStrategy,
    host: Arc<dyn GameHost>,
    options: RunnerOptions,
    stop_rx: Receiver<()>,
) -> (BoxedStrategy, RunSummary) {
    let interval = tick_interval(options.speed);
    let mut moves = 0;
    let reason = loop {
        if stop_requested(&stop_rx) {
            break StopReason::Cancelled;
        }
        match tick(strategy.as_mut(), host.as_ref(), &options, moves, &|| stop_requested(&stop_rx)) {
            Tick::Moved(..) => moves += 1,
            Tick::Stopped(reason) => break reason,
        }
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break StopReason::Cancelled,
        }
    };
    let summary = summarize(strategy.name(), host.as_ref(), moves, reason);
    info!(
        strategy = %summary.strategy,
        moves = summary.moves,
        score = summary.final_score,
        max_tile = summary.max_tile,
        reason = ?summary.stop_reason,
        "agent stopped"
    );
    (strategy, summary)
}

/// Background player with idempotent `start`/`stop`.
///
/// ```
/// use std::sync::Arc;
/// use agents_2048::agent::{AgentRunner, LocalGame, RunnerOptions};
/// use agents_2048::strategy::GreedyStrategy;
///
/// let host = Arc::new(LocalGame::new(1));
/// let opts = RunnerOptions { speed: 10.0, max_moves: Some(3), ..Default::default() };
/// let mut runner = AgentRunner::new(Box::new(GreedyStrategy), host.clone(), opts);
/// runner.start();
/// let summary = runner.join().unwrap();
/// assert!(summary.moves <= 3);
/// ```
pub struct AgentRunner {
    host: Arc<dyn GameHost>,
    options: RunnerOptions,
    strategy: Option<BoxedStrategy>,
    worker: Option<Worker>,
}

impl AgentRunner {
    pub fn new(strategy: BoxedStrategy, host: Arc<dyn GameHost>, options: RunnerOptions) -> Self {
        Self { host, options, strategy: Some(strategy), worker: None }
    }

    /// Spawn the worker. Returns `false` if a run is already in progress.
    pub fn start(&mut self) -> bool {
        if self.worker.is_some() {
            return false;
        }
        let Some(strategy) = self.strategy.take() else { return false };
        let (stop_tx, stop_rx) = mpsc::channel();
        let host = Arc::clone(&self.host);
        let options = self.options;
        info!(strategy = strategy.name(), speed = clamp_speed(options.speed), "agent started");
        let handle = thread::spawn(move || run_worker(strategy, host, options, stop_rx));
        self.worker = Some(Worker { stop_tx, handle });
        true
    }

    /// True while the worker thread is still playing.
    pub fn is_running(&self) -> bool { self.worker.as_ref().is_some_and(|w| !w.handle.is_finished()) }

    /// Cancel the run and wait for the worker. `None` if nothing was running.
    pub fn stop(&mut self) -> Option<RunSummary> {
        let worker = self.worker.as_ref()?;
        // the worker may already have exited on its own
        let _ = worker.stop_tx.send(());
        self.join()
    }

    /// Wait for the run to end by itself. `None` if nothing was running.
    pub fn join(&mut self) -> Option<RunSummary> {
        let Worker { handle, .. } = self.worker.take()?;
        match handle.join() {
            Ok((strategy, summary)) => {
                self.strategy = Some(strategy);
                Some(summary)
            }
            Err(_) => {
                warn!("agent worker panicked; strategy dropped");
                None
            }
        }
    }
}

impl Drop for AgentRunner {
    fn drop(&mut self) { let _ = self.stop(); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Board;
    use crate::strategy::{CornerStrategy, GreedyStrategy};

    fn dead_board() -> Board {
        Board::from_rows([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]).unwrap()
    }

    #[test]
    fn speed_is_clamped() {
        assert_eq!(clamp_speed(0.1), MIN_SPEED);
        assert_eq!(clamp_speed(50.0), MAX_SPEED);
        assert_eq!(clamp_speed(3.0), 3.0);
        assert_eq!(clamp_speed(f64::NAN), MIN_SPEED);
        assert_eq!(tick_interval(4.0), Duration::from_millis(250));
    }

    #[test]
    fn local_game_rejects_noop_moves() {
        let b = Board::from_rows([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        let host = LocalGame::with_state(GameState::new(b), 0);
        assert!(host.submit_move(Move::Up).is_none());
        let next = host.submit_move(Move::Down).unwrap();
        assert_eq!(next.move_count, 1);
        assert_eq!(host.current_state(), next);
        assert_eq!(host.history(), vec![Move::Down]);
    }

    #[test]
    fn tick_stops_on_terminal_state() {
        let host = LocalGame::with_state(GameState::new(dead_board()), 0);
        let t = tick(&mut GreedyStrategy, &host, &RunnerOptions::default(), 0, &|| false);
        assert_eq!(t, Tick::Stopped(StopReason::GameOver));
    }

    #[test]
    fn cancelled_tick_submits_nothing() {
        let host = LocalGame::new(4);
        let before = host.current_state();
        let t = tick(&mut GreedyStrategy, &host, &RunnerOptions::default(), 0, &|| true);
        assert_eq!(t, Tick::Stopped(StopReason::Cancelled));
        assert_eq!(host.current_state(), before);
        assert!(host.history().is_empty());
    }

    #[test]
    fn play_to_end_respects_move_limit() {
        let host = LocalGame::new(11);
        let opts = RunnerOptions { max_moves: Some(5), ..Default::default() };
        let summary = play_to_end(&mut CornerStrategy, &host, &opts);
        assert_eq!(summary.moves, 5);
        assert_eq!(summary.stop_reason, StopReason::MoveLimit);
        assert_eq!(host.history().len(), 5);
        assert_eq!(summary.final_score, host.current_state().score);
    }

    #[test]
    fn play_to_end_finishes_the_game() {
        let host = LocalGame::new(3);
        let summary = play_to_end(&mut GreedyStrategy, &host, &RunnerOptions::default());
        assert_eq!(summary.stop_reason, StopReason::GameOver);
        assert!(host.current_state().is_game_over);
        assert_eq!(summary.moves, host.history().len() as u64);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let host: Arc<LocalGame> = Arc::new(LocalGame::new(5));
        let opts = RunnerOptions { speed: MIN_SPEED, ..Default::default() };
        let mut runner = AgentRunner::new(Box::new(GreedyStrategy), host.clone(), opts);
        assert!(runner.start());
        assert!(!runner.start());
        let summary = runner.stop().unwrap();
        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        // the first decision lands before the first wait
        assert!(summary.moves <= 1);
        assert_eq!(host.history().len() as u64, summary.moves);
        assert!(runner.stop().is_none());
        assert!(!runner.is_running());
        // the strategy comes back, so the runner can be restarted
        assert!(runner.start());
        assert!(runner.stop().is_some());
    }

    #[test]
    fn no_moves_after_stop() {
        let host: Arc<LocalGame> = Arc::new(LocalGame::new(8));
        let opts = RunnerOptions { speed: MAX_SPEED, ..Default::default() };
        let mut runner = AgentRunner::new(Box::new(CornerStrategy), host.clone(), opts);
        runner.start();
        thread::sleep(Duration::from_millis(120));
        let summary = runner.stop().unwrap();
        let frozen = host.history().len();
        assert_eq!(frozen as u64, summary.moves);
        thread::sleep(Duration::from_millis(150));
        assert_eq!(host.history().len(), frozen);
    }
}
