use rand::Rng;

use super::state::{Board, BoardRaw, Line, Move, Score};
use super::tables::{get_line_entry, stores};

/// Slide/merge tiles in the given direction. No randomness.
pub fn shift(board: Board, direction: Move) -> Board {
    shift_scored(board, direction).0
}

/// Slide/merge tiles in the given direction, returning the resulting board
/// and the points produced by this move's merges (the sum of the merged
/// tile values).
pub fn shift_scored(board: Board, direction: Move) -> (Board, Score) {
    match direction {
        Move::Left | Move::Right => shift_rows(board, direction),
        Move::Up | Move::Down => shift_cols(board, direction),
    }
}

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
pub fn get_tile_val(board: Board, idx: usize) -> u32 {
    let exp = (board.0 >> (60 - (4 * idx))) & 0xf;
    if exp == 0 {
        0
    } else {
        1 << exp
    }
}

/// The highest tile exponent on the board (0 for an empty board).
pub fn highest_exponent(board: Board) -> u8 {
    board.tiles().max().unwrap_or(0)
}

/// The highest tile value on the board (0 for an empty board).
pub fn highest_tile_val(board: Board) -> u32 {
    match highest_exponent(board) {
        0 => 0,
        exp => 1 << exp,
    }
}

/// True iff the position is terminal: no empty cell remains and no two
/// horizontally- or vertically-adjacent cells hold equal values.
pub fn is_terminal(board: Board) -> bool {
    if count_empty(board) > 0 {
        return false;
    }
    !has_adjacent_pair(board.0) && !has_adjacent_pair(transpose(board.0))
}

fn has_adjacent_pair(raw: BoardRaw) -> bool {
    for line_idx in 0..4 {
        let line = extract_line(raw, line_idx);
        for i in 0..3 {
            let a = (line >> ((3 - i) * 4)) & 0xf;
            let b = (line >> ((2 - i) * 4)) & 0xf;
            if a != 0 && a == b {
                return true;
            }
        }
    }
    false
}

// https://stackoverflow.com/questions/38225571/count-number-of-zero-nibbles-in-an-unsigned-64-bit-integer
/// Count the number of zero tiles.
pub fn count_empty(board: Board) -> u64 {
    16 - count_non_empty(board)
}

fn count_non_empty(board: Board) -> u64 {
    let mut board_copy = board.0;
    board_copy |= board_copy >> 1;
    board_copy |= board_copy >> 2;
    board_copy &= 0x1111111111111111;
    u64::from(board_copy.count_ones())
}

/// Exponent of a freshly spawned tile: 1 (tile 2) with probability 0.9,
/// 2 (tile 4) with probability 0.1.
pub(crate) fn random_tile_exponent<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    if rng.gen_range(0..10) < 9 {
        1
    } else {
        2
    }
}

fn shift_rows(board: Board, move_dir: Move) -> (Board, Score) {
    let s = stores();
    let (table, merges) = match move_dir {
        Move::Left => (&s.shift_left, &s.merge_left),
        Move::Right => (&s.shift_right, &s.merge_right),
        _ => unreachable!("shift_rows only handles horizontal moves"),
    };
    let mut res = 0;
    let mut score = 0;
    for row_idx in 0..4 {
        let row_val = extract_line(board.0, row_idx) as u16;
        res |= get_line_entry(table, row_val) << (48 - (16 * row_idx));
        score += get_line_entry(merges, row_val);
    }
    (Board(res), score)
}

fn shift_cols(board: Board, move_dir: Move) -> (Board, Score) {
    let transposed = transpose(board.0);
    let s = stores();
    // A vertical pass over a column is the horizontal pass over the
    // transposed line, so the merge tables are shared.
    let (table, merges) = match move_dir {
        Move::Up => (&s.shift_up, &s.merge_left),
        Move::Down => (&s.shift_down, &s.merge_right),
        _ => unreachable!("shift_cols only handles vertical moves"),
    };
    let mut res = 0;
    let mut score = 0;
    for col_idx in 0..4 {
        let col_val = extract_line(transposed, col_idx) as u16;
        res |= get_line_entry(table, col_val) << (12 - (4 * col_idx));
        score += get_line_entry(merges, col_val);
    }
    (Board(res), score)
}

/// Reference single-line slide used to build the lookup tables.
///
/// The canonical pass is leftward: compact non-zero tiles toward index 0,
/// merge equal adjacent pairs left to right (each cell merges at most once,
/// merges never cascade within a move), then compact again to close gaps.
/// Rightward/downward moves run the same pass on the reversed line.
pub(crate) fn slide_line(line: Line, direction: Move) -> (Line, Score) {
    let mut tiles = line_exponents(line);
    let reversed = matches!(direction, Move::Right | Move::Down);
    if reversed {
        tiles.reverse();
    }
    let score = slide_exponents_left(&mut tiles);
    if reversed {
        tiles.reverse();
    }
    let packed = match direction {
        Move::Left | Move::Right => pack_row(tiles),
        Move::Up | Move::Down => pack_col(tiles),
    };
    (packed, score)
}

fn line_exponents(line: Line) -> [u64; 4] {
    std::array::from_fn(|i| (line >> ((3 - i) * 4)) & 0xf)
}

fn slide_exponents_left(tiles: &mut [u64; 4]) -> Score {
    compact_left(tiles);
    let mut score = 0;
    for i in 0..3 {
        if tiles[i] != 0 && tiles[i] == tiles[i + 1] {
            // nibble exponents saturate at 15 (tile 32768)
            tiles[i] = (tiles[i] + 1).min(0xf);
            tiles[i + 1] = 0;
            score += 1 << tiles[i];
        }
    }
    compact_left(tiles);
    score
}

fn compact_left(tiles: &mut [u64; 4]) {
    let mut out = [0u64; 4];
    let mut count = 0;
    for &tile in tiles.iter() {
        if tile != 0 {
            out[count] = tile;
            count += 1;
        }
    }
    *tiles = out;
}

fn pack_row(tiles: [u64; 4]) -> Line {
    tiles[0] << 12 | tiles[1] << 8 | tiles[2] << 4 | tiles[3]
}

fn pack_col(tiles: [u64; 4]) -> Line {
    tiles[0] << 48 | tiles[1] << 32 | tiles[2] << 16 | tiles[3]
}

pub(crate) fn format_val(exp: u8) -> String {
    match exp {
        0 => String::from("       "),
        e => format!("{:^7}", 1u32 << e),
    }
}
