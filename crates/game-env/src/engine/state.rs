use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ops;

// Internal type aliases for the packed representation
pub(crate) type BoardRaw = u64;
pub(crate) type Line = u64;
pub(crate) type Score = u64;

/// A direction to slide/merge tiles.
///
/// Declaration order matches the action indices used at the policy
/// boundary: 0 = up, 1 = left, 2 = right, 3 = down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Up,
    Left,
    Right,
    Down,
}

impl Move {
    /// All directions in action-index order.
    pub const ALL: [Move; 4] = [Move::Up, Move::Left, Move::Right, Move::Down];

    /// Decode an action index (0 = up, 1 = left, 2 = right, 3 = down).
    pub fn from_index(idx: u8) -> Option<Self> {
        match idx {
            0 => Some(Move::Up),
            1 => Some(Move::Left),
            2 => Some(Move::Right),
            3 => Some(Move::Down),
            _ => None,
        }
    }

    /// The action index of this direction.
    pub fn index(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "up",
            Move::Left => "left",
            Move::Right => "right",
            Move::Down => "down",
        };
        write!(f, "{name}")
    }
}

/// Packed 4x4 2048 board as 16 4-bit nibbles in a `u64`.
///
/// Nibble k (row-major, most significant first) holds the base-2 exponent
/// of the cell value; 0 means empty. Tile values therefore range up to
/// 2^15 = 32768. Public methods provide ergonomic, safe operations while
/// preserving an escape hatch to the raw packed representation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Board(pub(crate) BoardRaw);

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self {
        Board(raw)
    }

    /// Borrow the raw packed `u64` for this `Board`.
    #[inline]
    pub fn raw(&self) -> BoardRaw {
        self.0
    }

    /// Build a board from row-major tile exponents (0 = empty).
    pub fn from_exponents(exps: [u8; 16]) -> Self {
        let mut raw = 0;
        for (idx, &exp) in exps.iter().enumerate() {
            debug_assert!(exp <= 0xf, "exponent must fit a nibble");
            raw |= u64::from(exp) << (60 - 4 * idx);
        }
        Board(raw)
    }

    /// Build a board from tile values (0 = empty, otherwise a power of two
    /// up to 32768).
    pub fn from_rows(rows: [[u32; 4]; 4]) -> Self {
        let mut raw = 0;
        for (i, row) in rows.iter().enumerate() {
            for (j, &val) in row.iter().enumerate() {
                let exp = match val {
                    0 => 0,
                    v => {
                        debug_assert!(
                            v.is_power_of_two() && v <= 1 << 15,
                            "tile must be a power of two <= 32768, got {v}"
                        );
                        u64::from(v.trailing_zeros())
                    }
                };
                raw |= exp << (60 - 4 * (i * 4 + j));
            }
        }
        Board(raw)
    }

    /// Expand the board into row-major tile values.
    pub fn to_rows(self) -> [[u32; 4]; 4] {
        let mut rows = [[0u32; 4]; 4];
        for (idx, exp) in self.tiles().enumerate() {
            rows[idx / 4][idx % 4] = if exp == 0 { 0 } else { 1 << exp };
        }
        rows
    }

    /// Return the board resulting from sliding/merging tiles in `dir`
    /// (no random insert).
    #[inline]
    pub fn shift(self, dir: Move) -> Self {
        ops::shift(self, dir)
    }

    /// Like [`Board::shift`], additionally returning the points produced by
    /// the merges of this move.
    #[inline]
    pub fn shift_scored(self, dir: Move) -> (Self, u64) {
        ops::shift_scored(self, dir)
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a uniformly chosen
    /// empty cell, using the provided RNG.
    ///
    /// Returns the new board and the spawned tile value; if the board has
    /// no empty cell it is returned unchanged with a spawned value of 0.
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> (Self, u32) {
        let empty = ops::count_empty(self);
        if empty == 0 {
            return (self, 0);
        }
        let mut index = rng.gen_range(0..empty);
        let exp = ops::random_tile_exponent(rng);
        let mut tmp = self.0;
        let mut tile = exp;
        loop {
            while (tmp & 0xf) != 0 {
                tmp >>= 4;
                tile <<= 4;
            }
            if index == 0 {
                break;
            }
            index -= 1;
            tmp >>= 4;
            tile <<= 4;
        }
        (Board(self.0 | tile), 1 << exp)
    }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(self) -> u64 {
        ops::count_empty(self)
    }

    /// The highest tile value present (0 for an empty board).
    #[inline]
    pub fn highest_tile(self) -> u32 {
        ops::highest_tile_val(self)
    }

    /// The actual value at a row-major cell index (0 if empty).
    #[inline]
    pub fn tile_value(self, idx: usize) -> u32 {
        ops::get_tile_val(self, idx)
    }

    /// True if no slide in any direction can change the board.
    #[inline]
    pub fn is_terminal(self) -> bool {
        ops::is_terminal(self)
    }

    /// Iterate over tile exponents (nibbles) in row-major order.
    /// Yields 0 for empty, 1 for 2, 2 for 4, etc.
    #[inline]
    pub fn tiles(self) -> TilesIter {
        TilesIter { raw: self.0, idx: 0 }
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, exp) in self.tiles().enumerate() {
            if idx % 4 == 0 && idx != 0 {
                writeln!(f)?;
                writeln!(f, "{}", "-".repeat(31))?;
            }
            if idx % 4 != 0 {
                write!(f, "|")?;
            }
            write!(f, "{}", ops::format_val(exp))?;
        }
        writeln!(f)
    }
}

impl From<BoardRaw> for Board {
    fn from(v: BoardRaw) -> Self {
        Board::from_raw(v)
    }
}

impl From<Board> for BoardRaw {
    fn from(b: Board) -> Self {
        b.0
    }
}

/// Iterator over board tiles (exponents) in row-major order.
#[derive(Debug)]
pub struct TilesIter {
    raw: BoardRaw,
    idx: usize,
}

impl Iterator for TilesIter {
    type Item = u8;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= 16 {
            return None;
        }
        let n = ((self.raw >> (60 - (4 * self.idx))) & 0xf) as u8;
        self.idx += 1;
        Some(n)
    }
}

impl IntoIterator for Board {
    type Item = u8;
    type IntoIter = TilesIter;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.tiles()
    }
}
