use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// Every direction in the fixed enumeration order used for tie-breaking.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Lowercase identifier (`"up"`, `"down"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const LINE_TABLE_SIZE: usize = 0x1_0000; // 65,536 possible 16-bit lines

/// Highest exponent a 4-bit cell can hold (2^15 = 32768).
const MAX_RANK: u64 = 0xf;

struct Stores {
    shift_left: Box<[u64]>,
    shift_right: Box<[u64]>,
    shift_up: Box<[u64]>,
    shift_down: Box<[u64]>,
    // Merge gain when compacting towards the start (left/up) or the end (right/down) of a line.
    gain_start: Box<[Score]>,
    gain_end: Box<[Score]>,
}

type BoardRaw = u64;
type Line = u64;
type Rank = u64;
/// Points earned from merges.
pub type Score = u64;
/// Face value of a tile (0 for an empty cell).
pub type TileValue = u32;

/// Error raised when a board is built from caller-supplied values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("tile value {0} is not a power of two >= 2")]
    NotPowerOfTwo(TileValue),
    #[error("tile value {0} exceeds the largest representable tile (32768)")]
    TileTooLarge(TileValue),
    #[error("expected 4 rows of 4 cells, got {0}")]
    Shape(String),
    #[error("cannot parse cell '{0}'")]
    Cell(String),
}

/// Packed 4x4 2048 board as 16 4-bit exponents in a `u64`.
///
/// Cell `(row, col)` lives in nibble `row * 4 + col`, counted from the most
/// significant end. An exponent of 0 means the cell is empty.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board(BoardRaw);

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self { Board(raw) }

    /// Borrow the raw packed `u64` for this `Board`.
    #[inline]
    pub fn raw(&self) -> BoardRaw { self.0 }

    /// Build a board from tile values in row-major order (`0` marks an empty cell).
    ///
    /// ```
    /// use agents_2048::engine::{Board, BoardError};
    /// let b = Board::from_rows([[2, 2, 4, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
    /// assert_eq!(b.get(0, 2), 4);
    /// assert_eq!(Board::from_rows([[3, 0, 0, 0], [0; 4], [0; 4], [0; 4]]), Err(BoardError::NotPowerOfTwo(3)));
    /// ```
    pub fn from_rows(rows: [[TileValue; 4]; 4]) -> Result<Self, BoardError> {
        let mut raw = 0;
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, &val) in row.iter().enumerate() {
                let rank = value_to_rank(val)?;
                raw |= rank << (60 - 4 * (row_idx * 4 + col_idx));
            }
        }
        Ok(Board(raw))
    }

    /// Tile values in row-major order (`0` for empty cells).
    pub fn rows(self) -> [[TileValue; 4]; 4] {
        let mut out = [[0; 4]; 4];
        for (row_idx, row) in out.iter_mut().enumerate() {
            for (col_idx, cell) in row.iter_mut().enumerate() {
                *cell = self.get(row_idx, col_idx);
            }
        }
        out
    }

    /// Return the board resulting from sliding/merging tiles in `dir` (no random insert).
    ///
    /// ```
    /// use agents_2048::engine::{Board, Move};
    /// let b = Board::from_rows([[2, 2, 4, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
    /// assert_eq!(b.shift(Move::Left).rows()[0], [4, 4, 0, 0]);
    /// ```
    #[inline]
    pub fn shift(self, dir: Move) -> Self { self.shift_with_gain(dir).0 }

    /// Like [`Board::shift`], also returning the points earned by the merges.
    #[inline]
    pub fn shift_with_gain(self, dir: Move) -> (Self, Score) {
        match dir {
            Move::Left | Move::Right => shift_rows(self, dir),
            Move::Up | Move::Down => shift_cols(self, dir),
        }
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a random empty slot, using the provided RNG.
    ///
    /// A full board is returned unchanged.
    ///
    /// ```
    /// use agents_2048::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let empty = self.count_empty();
        if empty == 0 {
            return self;
        }
        let mut index = rng.gen_range(0..empty);
        let mut tmp = self.0;
        let mut tile = generate_random_tile(rng);
        loop {
            while (tmp & 0xf) != 0 {
                tmp >>= 4;
                tile <<= 4;
            }
            if index == 0 { break; }
            index -= 1;
            tmp >>= 4;
            tile <<= 4;
        }
        Board(self.0 | tile)
    }

    /// Perform a move then insert a random tile if the move changed the board, using the provided RNG.
    #[inline]
    pub fn make_move<R: Rng + ?Sized>(self, direction: Move, rng: &mut R) -> Self {
        let moved = self.shift(direction);
        if moved != self { moved.with_random_tile(rng) } else { self }
    }

    /// Directions that change the board, in `Move::ALL` order.
    pub fn valid_moves(self) -> Vec<Move> {
        Move::ALL.into_iter().filter(|&dir| self.shift(dir) != self).collect()
    }

    /// Return true if no legal moves remain.
    ///
    /// ```
    /// use agents_2048::engine::Board;
    /// // Nothing slides on an empty board.
    /// assert!(Board::EMPTY.is_game_over());
    /// ```
    #[inline]
    pub fn is_game_over(self) -> bool { is_game_over(self) }

    /// Return the highest tile value (e.g., 2048) present on the board, 0 when empty.
    #[inline]
    pub fn highest_tile(self) -> TileValue { get_highest_tile_val(self) }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(self) -> u32 { count_empty(self) }

    /// Count the number of occupied cells on the board.
    #[inline]
    pub fn count_occupied(self) -> u32 { count_non_empty(self) }

    /// Sum of every tile value on the board.
    pub fn tile_sum(self) -> u64 {
        (0..16).map(|idx| u64::from(get_tile_val(self, idx))).sum()
    }

    /// Number of distinct tile values on the board.
    pub fn count_distinct(self) -> u32 {
        let mut bitset = 0u32;
        let mut board_copy = self.0;
        while board_copy != 0 {
            bitset |= 1 << (board_copy & 0xf);
            board_copy >>= 4;
        }
        (bitset >> 1).count_ones() // don't count empty tiles
    }

    /// Tile value at `(row, col)`, 0 if empty.
    #[inline]
    pub fn get(self, row: usize, col: usize) -> TileValue { get_tile_val(self, row * 4 + col) }

    /// Tile value at row-major index `idx` (0..16), 0 if empty.
    #[inline]
    pub fn tile_value(self, idx: usize) -> TileValue { get_tile_val(self, idx) }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<String> = (0..16).map(|idx| format_val(get_tile_val(*self, idx))).collect();
        for (row_idx, row) in cells.chunks(4).enumerate() {
            if row_idx > 0 {
                writeln!(f, "--------------------------------")?;
            }
            writeln!(f, "{}|{}|{}|{}", row[0], row[1], row[2], row[3])?;
        }
        Ok(())
    }
}

/// Parses `"2,2,4,0/0,0,0,0/0,0,0,0/0,0,0,0"`: rows separated by `/`, cells by `,`.
/// Empty cells may be written as `0`, `.` or `_`.
impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows: Vec<&str> = s.trim().split('/').collect();
        if rows.len() != 4 {
            return Err(BoardError::Shape(format!("{} rows", rows.len())));
        }
        let mut values = [[0; 4]; 4];
        for (row_idx, row) in rows.iter().enumerate() {
            let cells: Vec<&str> = row.split(',').map(str::trim).collect();
            if cells.len() != 4 {
                return Err(BoardError::Shape(format!("{} cells in row {}", cells.len(), row_idx)));
            }
            for (col_idx, cell) in cells.iter().enumerate() {
                values[row_idx][col_idx] = match *cell {
                    "." | "_" | "" => 0,
                    other => other.parse().map_err(|_| BoardError::Cell(other.to_string()))?,
                };
            }
        }
        Board::from_rows(values)
    }
}

/// Initialize internal tables on first use. Safe to call multiple times.
pub fn new() {
    let _ = stores();
}

/// Slide/merge tiles in the given direction. No randomness.
pub fn shift(board: Board, direction: Move) -> Board { board.shift(direction) }

// Credit to Nneonneo
pub(crate) fn transpose(x: BoardRaw) -> BoardRaw {
    let a1 = x & 0xF0F00F0FF0F00F0F;
    let a2 = x & 0x0000F0F00000F0F0;
    let a3 = x & 0x0F0F00000F0F0000;
    let a = a1 | (a2 << 12) | (a3 >> 12);
    let b1 = a & 0xFF00FF0000FF00FF;
    let b2 = a & 0x00FF00FF00000000;
    let b3 = a & 0x00000000FF00FF00;
    b1 | (b2 >> 24) | (b3 << 24)
}

pub(crate) fn extract_line(board: BoardRaw, line_idx: u64) -> Line {
    (board >> ((3 - line_idx) * 16)) & 0xffff
}

/// Return the cell's actual value (0 if empty), e.g., 2, 4, 8, ...
pub fn get_tile_val(board: Board, idx: usize) -> TileValue {
    rank_to_value(get_tile(board, idx))
}

pub(crate) fn line_to_vec(line: Line) -> Vec<Rank> {
    (0..4).fold(Vec::new(), |mut tiles, tile_idx| {
        tiles.push(line >> ((3 - tile_idx) * 4) & 0xf);
        tiles
    })
}

/// True if no move in any direction changes the board.
pub fn is_game_over(board: Board) -> bool {
    Move::ALL.into_iter().all(|direction| board.shift(direction) == board)
}

/// Count the number of zero tiles.
pub fn count_empty(board: Board) -> u32 {
    16 - count_non_empty(board)
}

/// Highest tile value on the board, 0 for an empty board.
pub fn get_highest_tile_val(board: Board) -> TileValue {
    let max_rank = (0..16).map(|idx| get_tile(board, idx)).max().unwrap_or(0);
    rank_to_value(max_rank)
}

static STORES: OnceLock<Stores> = OnceLock::new();

fn create_stores() -> Stores {
    // Allocate on the heap to avoid large stack frames
    let mut shift_left = vec![0u64; LINE_TABLE_SIZE];
    let mut shift_right = vec![0u64; LINE_TABLE_SIZE];
    let mut shift_up = vec![0u64; LINE_TABLE_SIZE];
    let mut shift_down = vec![0u64; LINE_TABLE_SIZE];
    let mut gain_start = vec![0; LINE_TABLE_SIZE];
    let mut gain_end = vec![0; LINE_TABLE_SIZE];

    for val in 0..LINE_TABLE_SIZE {
        let line = val as u64;
        let (left, left_gain) = shift_line(line, Move::Left);
        let (right, right_gain) = shift_line(line, Move::Right);
        shift_left[val] = left;
        shift_right[val] = right;
        shift_up[val] = shift_line(line, Move::Up).0;
        shift_down[val] = shift_line(line, Move::Down).0;
        gain_start[val] = left_gain;
        gain_end[val] = right_gain;
    }

    Stores {
        shift_left: shift_left.into_boxed_slice(),
        shift_right: shift_right.into_boxed_slice(),
        shift_up: shift_up.into_boxed_slice(),
        shift_down: shift_down.into_boxed_slice(),
        gain_start: gain_start.into_boxed_slice(),
        gain_end: gain_end.into_boxed_slice(),
    }
}

#[inline(always)]
fn stores() -> &'static Stores {
    STORES.get_or_init(create_stores)
}

#[inline(always)]
fn get_line_entry<T: Copy>(table: &[T], idx: u16) -> T {
    debug_assert!((idx as usize) < LINE_TABLE_SIZE);
    // Every table holds LINE_TABLE_SIZE entries, so any u16 index is in bounds.
    unsafe { *table.get_unchecked(idx as usize) }
}

fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R) -> Rank { if rng.gen_range(0..10) < 9 { 1 } else { 2 } }

fn shift_rows(board: Board, move_dir: Move) -> (Board, Score) {
    let s = stores();
    let (table, gains): (&[u64], &[Score]) = match move_dir {
        Move::Left => (&s.shift_left, &s.gain_start),
        Move::Right => (&s.shift_right, &s.gain_end),
        Move::Up | Move::Down => unreachable!("shift_rows only handles horizontal moves"),
    };
    (0..4).fold((Board::EMPTY, 0), |(new_board, gain), row_idx| {
        let row_val = extract_line(board.0, row_idx) as u16;
        let new_row_val = get_line_entry(table, row_val);
        (
            Board(new_board.0 | (new_row_val << (48 - (16 * row_idx)))),
            gain + get_line_entry(gains, row_val),
        )
    })
}

fn shift_cols(board: Board, move_dir: Move) -> (Board, Score) {
    let transpose_board = transpose(board.0);
    let s = stores();
    let (table, gains): (&[u64], &[Score]) = match move_dir {
        Move::Up => (&s.shift_up, &s.gain_start),
        Move::Down => (&s.shift_down, &s.gain_end),
        Move::Left | Move::Right => unreachable!("shift_cols only handles vertical moves"),
    };
    (0..4).fold((Board::EMPTY, 0), |(new_board, gain), col_idx| {
        let col_val = extract_line(transpose_board, col_idx) as u16;
        let new_col_val = get_line_entry(table, col_val);
        (
            Board(new_board.0 | (new_col_val << (12 - (4 * col_idx)))),
            gain + get_line_entry(gains, col_val),
        )
    })
}

fn shift_line(line: Line, direction: Move) -> (Line, Score) {
    let tiles = line_to_vec(line);
    let (shifted, gain) = shift_vec(tiles, direction);
    let packed = match direction {
        Move::Left | Move::Right => vec_to_row(&shifted),
        Move::Up | Move::Down => vec_to_col(&shifted),
    };
    (packed, gain)
}

fn vec_to_row(tiles: &[Rank]) -> Line {
    tiles[0] << 12 | tiles[1] << 8 | tiles[2] << 4 | tiles[3]
}

fn vec_to_col(tiles: &[Rank]) -> Line {
    tiles[0] << 48 | tiles[1] << 32 | tiles[2] << 16 | tiles[3]
}

fn shift_vec(vec: Vec<Rank>, direction: Move) -> (Vec<Rank>, Score) {
    match direction {
        Move::Left | Move::Up => shift_vec_left(vec),
        Move::Right | Move::Down => shift_vec_right(vec),
    }
}

fn shift_vec_right(vec: Vec<Rank>) -> (Vec<Rank>, Score) {
    let rev_vec: Vec<Rank> = vec.into_iter().rev().collect();
    let (shifted, gain) = shift_vec_left(rev_vec);
    (shifted.into_iter().rev().collect(), gain)
}

/// Compact occupied cells towards index 0, merging each adjacent equal pair once.
///
/// A merged tile never merges again in the same pass, and two tiles at
/// `MAX_RANK` stay apart since the result would not fit in a nibble.
fn shift_vec_left(vec: Vec<Rank>) -> (Vec<Rank>, Score) {
    let len = vec.len();
    let occupied: Vec<Rank> = vec.into_iter().filter(|&rank| rank != 0).collect();
    let mut out = Vec::with_capacity(len);
    let mut gain = 0;
    let mut idx = 0;
    while idx < occupied.len() {
        let rank = occupied[idx];
        if idx + 1 < occupied.len() && occupied[idx + 1] == rank && rank < MAX_RANK {
            out.push(rank + 1);
            gain += 1 << (rank + 1);
            idx += 2;
        } else {
            out.push(rank);
            idx += 1;
        }
    }
    out.resize(len, 0);
    (out, gain)
}

fn count_non_empty(board: Board) -> u32 {
    let mut board_copy = board.0;
    board_copy |= board_copy >> 1;
    board_copy |= board_copy >> 2;
    board_copy &= 0x1111111111111111;
    board_copy.count_ones()
}

fn get_tile(board: Board, idx: usize) -> Rank {
    (board.0 >> (60 - (4 * idx))) & 0xf
}

fn rank_to_value(rank: Rank) -> TileValue {
    if rank == 0 { 0 } else { 1 << rank }
}

fn value_to_rank(val: TileValue) -> Result<Rank, BoardError> {
    match val {
        0 => Ok(0),
        1 => Err(BoardError::NotPowerOfTwo(val)),
        v if !v.is_power_of_two() => Err(BoardError::NotPowerOfTwo(v)),
        v if u64::from(v.trailing_zeros()) > MAX_RANK => Err(BoardError::TileTooLarge(v)),
        v => Ok(u64::from(v.trailing_zeros())),
    }
}

fn format_val(val: TileValue) -> String {
    match val {
        0 => String::from("       "),
        x => format!("{:^7}", x),
    }
}
