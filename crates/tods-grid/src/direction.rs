//! The six neighbours of a tile.
//!
//! ```text
//!    A   B
//!  F       C
//!    E   D
//! ```
//!
//! Even rows sit half a tile to the left of their odd neighbours, so the
//! diagonal neighbours of an even-row tile are one column further left.

use serde::{Deserialize, Serialize};
use tods_types::Tile;

use crate::layout::is_even;

/// A direction from a tile to one of its six neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Upper left.
    A,
    /// Upper right.
    B,
    /// Right.
    C,
    /// Lower right.
    D,
    /// Lower left.
    E,
    /// Left.
    F,
}

impl Direction {
    /// All directions, clockwise from upper left.
    pub const ALL: [Self; 6] = [Self::A, Self::B, Self::C, Self::D, Self::E, Self::F];
}

/// The neighbour of `tile` in direction `dir`, or `None` when it lies
/// outside the `i32` coordinate range.
pub fn adjacent_tile(tile: Tile, dir: Direction) -> Option<Tile> {
    let shift = if is_even(tile.y) { -1 } else { 0 };
    let (x, y) = (tile.x, tile.y);
    let (x, y) = match dir {
        Direction::A => (x.checked_add(shift)?, y.checked_sub(1)?),
        Direction::B => (x.checked_add(1)?.checked_add(shift)?, y.checked_sub(1)?),
        Direction::C => (x.checked_add(1)?, y),
        Direction::D => (x.checked_add(1)?.checked_add(shift)?, y.checked_add(1)?),
        Direction::E => (x.checked_add(shift)?, y.checked_add(1)?),
        Direction::F => (x.checked_sub(1)?, y),
    };
    Some(Tile::new(x, y))
}

/// The direction leading from `from` to `to`, or `None` when `to` is not
/// one of its six neighbours.
pub fn find_direction(from: Tile, to: Tile) -> Option<Direction> {
    Direction::ALL
        .into_iter()
        .find(|&dir| adjacent_tile(from, dir) == Some(to))
}

/// Whether two tiles share an edge.
pub fn are_adjacent(a: Tile, b: Tile) -> bool {
    find_direction(a, b).is_some()
}

/// The neighbours of `tile` in [`Direction::ALL`] order. Fewer than six at
/// the edge of the coordinate range.
pub fn neighbors(tile: Tile) -> Vec<Tile> {
    Direction::ALL
        .into_iter()
        .filter_map(|dir| adjacent_tile(tile, dir))
        .collect()
}
