//! Board measurements shared by the heuristic strategies.

use crate::engine::{Board, TileValue};

/// `(row, col)` position on the board.
pub type Pos = (usize, usize);

/// Positions holding exactly `value`, row-major.
pub fn positions_of(board: Board, value: TileValue) -> Vec<Pos> {
    cells(board).filter(|&(_, v)| v == value).map(|(pos, _)| pos).collect()
}

/// Every occupied cell with its value, row-major.
pub fn occupied(board: Board) -> Vec<(Pos, TileValue)> {
    cells(board).filter(|&(_, v)| v != 0).collect()
}

fn cells(board: Board) -> impl Iterator<Item = (Pos, TileValue)> {
    (0..16).map(move |idx| ((idx / 4, idx % 4), board.tile_value(idx)))
}

#[inline]
pub fn is_corner((row, col): Pos) -> bool {
    (row == 0 || row == 3) && (col == 0 || col == 3)
}

/// True for any border cell, corners included.
#[inline]
pub fn is_edge((row, col): Pos) -> bool {
    row == 0 || row == 3 || col == 0 || col == 3
}

/// Whether every cell strictly between `a` and `b` is empty.
///
/// Returns `None` when the two positions share neither a row nor a column.
pub fn clear_path(board: Board, a: Pos, b: Pos) -> Option<bool> {
    if a.0 == b.0 {
        let (lo, hi) = (a.1.min(b.1), a.1.max(b.1));
        Some((lo + 1..hi).all(|col| board.get(a.0, col) == 0))
    } else if a.1 == b.1 {
        let (lo, hi) = (a.0.min(b.0), a.0.max(b.0));
        Some((lo + 1..hi).all(|row| board.get(row, a.1) == 0))
    } else {
        None
    }
}

/// Two distinct equal tiles on a shared row/column with nothing between them.
pub fn can_tiles_merge(board: Board, a: Pos, b: Pos) -> bool {
    let (va, vb) = (board.get(a.0, a.1), board.get(b.0, b.1));
    a != b && va != 0 && va == vb && clear_path(board, a, b) == Some(true)
}

/// Number of pairs of `value` tiles that one slide could merge.
pub fn mergeable_pairs(board: Board, value: TileValue) -> usize {
    let positions = positions_of(board, value);
    let mut pairs = 0;
    for (i, &a) in positions.iter().enumerate() {
        for &b in &positions[i + 1..] {
            if can_tiles_merge(board, a, b) {
                pairs += 1;
            }
        }
    }
    pairs
}

#[inline]
pub fn can_merge_value(board: Board, value: TileValue) -> bool {
    mergeable_pairs(board, value) > 0
}

/// Pairs of tiles `>= min_value` on a shared row/column with an occupied cell between them.
///
/// Values need not match. Pairs on different rows and columns are assumed
/// reachable and never counted.
pub fn blocked_pairs(board: Board, min_value: TileValue) -> usize {
    let high: Vec<Pos> =
        occupied(board).into_iter().filter(|&(_, v)| v >= min_value).map(|(pos, _)| pos).collect();
    let mut blocked = 0;
    for (i, &a) in high.iter().enumerate() {
        for &b in &high[i + 1..] {
            if clear_path(board, a, b) == Some(false) {
                blocked += 1;
            }
        }
    }
    blocked
}

/// Ignoring empty cells: entirely non-decreasing or entirely non-increasing.
pub fn is_monotonic(line: &[TileValue]) -> bool {
    let tiles: Vec<TileValue> = line.iter().copied().filter(|&v| v != 0).collect();
    tiles.windows(2).all(|w| w[0] <= w[1]) || tiles.windows(2).all(|w| w[0] >= w[1])
}

pub fn monotonic_rows(board: Board) -> u32 {
    board.rows().iter().filter(|row| is_monotonic(&row[..])).count() as u32
}

pub fn monotonic_cols(board: Board) -> u32 {
    (0..4)
        .filter(|&col| {
            let column: Vec<TileValue> = (0..4).map(|row| board.get(row, col)).collect();
            is_monotonic(&column)
        })
        .count() as u32
}

/// Whether a tile with the board's maximum value sits in any corner.
pub fn max_in_corner(board: Board) -> bool {
    let max = board.highest_tile();
    max != 0 && positions_of(board, max).into_iter().any(is_corner)
}

/// Tiles removed by the move from `before` to `after`; each merge removes exactly one.
#[inline]
pub fn merge_count(before: Board, after: Board) -> u32 {
    before.count_occupied().saturating_sub(after.count_occupied())
}

/// Negated sum of exponent gaps between horizontally/vertically adjacent tiles.
///
/// 0 is perfectly smooth; larger gaps give more negative values.
pub fn smoothness(board: Board) -> f64 {
    let rank = |v: TileValue| f64::from(v.trailing_zeros());
    let mut total = 0.0;
    for row in 0..4 {
        for col in 0..4 {
            let v = board.get(row, col);
            if v == 0 {
                continue;
            }
            for (r, c) in [(row, col + 1), (row + 1, col)] {
                if r < 4 && c < 4 {
                    let n = board.get(r, c);
                    if n != 0 {
                        total -= (rank(v) - rank(n)).abs();
                    }
                }
            }
        }
    }
    total
}
