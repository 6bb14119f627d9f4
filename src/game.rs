//! Game state threaded through the engine.
//!
//! [`GameState`] is a plain value: every operation returns a new state and
//! leaves its input untouched. The only accumulated quantity is the score.

use rand::Rng;

use crate::engine::{Board, Move, Score, TileValue};

/// Snapshot of a game: board, accumulated score, terminality and move counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameState {
    pub board: Board,
    pub score: u64,
    pub is_game_over: bool,
    pub move_count: u64,
}

/// Result of simulating one direction: the slid board and the points it earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub board: Board,
    pub score_delta: Score,
}

impl MoveOutcome {
    /// True when the move left the board untouched.
    #[inline]
    pub fn is_noop(&self, before: Board) -> bool { self.board == before }
}

impl GameState {
    /// Wrap an existing board with a zero score and move counter.
    pub fn new(board: Board) -> Self {
        Self { board, score: 0, is_game_over: board.is_game_over(), move_count: 0 }
    }

    /// Start a game with two random tiles.
    ///
    /// ```
    /// use agents_2048::game::GameState;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let state = GameState::start(&mut rng);
    /// assert_eq!(state.board.count_occupied(), 2);
    /// assert!(!state.is_game_over);
    /// ```
    pub fn start<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(Board::EMPTY.with_random_tile(rng).with_random_tile(rng))
    }

    /// Rebuild a state from a board and a known score, e.g. when resuming.
    pub fn with_score(board: Board, score: u64, move_count: u64) -> Self {
        Self { board, score, is_game_over: board.is_game_over(), move_count }
    }

    /// Successor state after sliding in `dir`, without spawning a tile.
    ///
    /// An invalid direction yields an identical board, score and move count.
    pub fn after(&self, dir: Move) -> GameState {
        let outcome = simulate_move(self, dir);
        if outcome.is_noop(self.board) {
            return *self;
        }
        GameState {
            board: outcome.board,
            score: self.score + outcome.score_delta,
            is_game_over: outcome.board.is_game_over(),
            move_count: self.move_count + 1,
        }
    }

    /// Authoritative move: slide, then spawn a random tile.
    ///
    /// Returns `None` when `dir` does not change the board.
    pub fn make_move<R: Rng + ?Sized>(&self, dir: Move, rng: &mut R) -> Option<GameState> {
        let outcome = simulate_move(self, dir);
        if outcome.is_noop(self.board) {
            return None;
        }
        let board = outcome.board.with_random_tile(rng);
        Some(GameState {
            board,
            score: self.score + outcome.score_delta,
            is_game_over: board.is_game_over(),
            move_count: self.move_count + 1,
        })
    }

    /// Directions that change the board, in `Move::ALL` order.
    #[inline]
    pub fn valid_moves(&self) -> Vec<Move> { valid_moves(self) }

    #[inline]
    pub fn max_tile(&self) -> TileValue { self.board.highest_tile() }

    #[inline]
    pub fn empty_tiles(&self) -> u32 { self.board.count_empty() }
}

/// Slide/merge `state.board` in `dir`. Depends only on the board and the direction.
///
/// ```
/// use agents_2048::engine::{Board, Move};
/// use agents_2048::game::{simulate_move, GameState};
/// let b = Board::from_rows([[4, 2, 2, 4], [0; 4], [0; 4], [0; 4]]).unwrap();
/// let out = simulate_move(&GameState::new(b), Move::Left);
/// assert_eq!(out.board.rows()[0], [4, 4, 4, 0]);
/// assert_eq!(out.score_delta, 4);
/// ```
pub fn simulate_move(state: &GameState, dir: Move) -> MoveOutcome {
    let (board, score_delta) = state.board.shift_with_gain(dir);
    MoveOutcome { board, score_delta }
}

/// Directions whose simulation changes the board. Empty exactly when the game is over.
pub fn valid_moves(state: &GameState) -> Vec<Move> {
    state.board.valid_moves()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn after_accumulates_score_and_counts_moves() {
        let b = Board::from_rows([[2, 2, 4, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        let s0 = GameState::with_score(b, 100, 7);
        let s1 = s0.after(Move::Left);
        assert_eq!(s1.score, 104);
        assert_eq!(s1.move_count, 8);
        assert_eq!(s1.board.rows()[0], [4, 4, 0, 0]);
        // the input is untouched
        assert_eq!(s0.score, 100);
    }

    #[test]
    fn after_invalid_direction_is_identity() {
        let b = Board::from_rows([[2, 4, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        let s0 = GameState::new(b);
        assert_eq!(s0.after(Move::Left), s0);
        assert_eq!(s0.after(Move::Up), s0);
    }

    #[test]
    fn make_move_spawns_exactly_one_tile() {
        let mut rng = StdRng::seed_from_u64(11);
        let b = Board::from_rows([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        let s = GameState::new(b).make_move(Move::Left, &mut rng).unwrap();
        assert_eq!(s.board.count_occupied(), 2);
        assert_eq!(s.score, 4);
        assert_eq!(s.move_count, 1);
        assert!(GameState::new(b).make_move(Move::Up, &mut rng).is_none());
    }

    #[test]
    fn repeated_direction_settles() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = GameState::start(&mut rng);
        for _ in 0..20 {
            state = state.make_move(Move::Down, &mut rng).unwrap_or(state);
        }
        for dir in Move::ALL {
            let once = simulate_move(&state, dir).board;
            let settled = GameState::new(once);
            let twice = simulate_move(&settled, dir);
            if once == twice.board {
                assert_eq!(twice.score_delta, 0);
            }
        }
    }

    #[test]
    fn game_over_matches_empty_valid_moves() {
        let dead = Board::from_rows([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]).unwrap();
        let state = GameState::new(dead);
        assert!(state.is_game_over);
        assert!(valid_moves(&state).is_empty());

        let live = Board::from_rows([[2, 2, 4, 8], [4, 8, 16, 32], [8, 16, 32, 64], [16, 32, 64, 128]]).unwrap();
        let state = GameState::new(live);
        assert!(!state.is_game_over);
        assert_eq!(valid_moves(&state), vec![Move::Left, Move::Right]);
    }
}
