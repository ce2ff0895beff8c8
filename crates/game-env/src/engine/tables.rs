use std::sync::OnceLock;

use super::ops;
use super::state::{Move, Score};

/// Precomputed lookup tables for all possible 4-tile lines (16-bit packed).
///
/// Shifting/merging a row or column depends only on its 4 nibbles, and
/// there are 2^16 possible 16-bit values, so the result of every
/// directional pass and the points its merges produce are precomputed.
/// This keeps moves branch-light at runtime.
///
/// Layout:
/// - `shift_left/right[i]`: replacement 16-bit line in row format.
/// - `shift_up/down[i]`: replacement line pre-scattered into column nibble
///   positions, so vertical moves need a single transpose.
/// - `merge_left/right[i]`: points produced by the pass over the line;
///   vertical moves reuse them on the transposed line.
pub(crate) struct Stores {
    pub(crate) shift_left: Box<[u64]>,
    pub(crate) shift_right: Box<[u64]>,
    pub(crate) shift_up: Box<[u64]>,
    pub(crate) shift_down: Box<[u64]>,
    pub(crate) merge_left: Box<[Score]>,
    pub(crate) merge_right: Box<[Score]>,
}

const LINE_TABLE_SIZE: usize = 0x1_0000; // 65,536 possible 16-bit lines

static STORES: OnceLock<Stores> = OnceLock::new();

/// Ensure lookup tables are initialized.
pub fn init() {
    let _ = STORES.get_or_init(create_stores);
}

#[inline(always)]
pub(crate) fn stores() -> &'static Stores {
    STORES.get_or_init(create_stores)
}

fn create_stores() -> Stores {
    // Allocate on the heap to keep stack frames small during init.
    let mut shift_left = vec![0u64; LINE_TABLE_SIZE];
    let mut shift_right = vec![0u64; LINE_TABLE_SIZE];
    let mut shift_up = vec![0u64; LINE_TABLE_SIZE];
    let mut shift_down = vec![0u64; LINE_TABLE_SIZE];
    let mut merge_left = vec![0u64; LINE_TABLE_SIZE];
    let mut merge_right = vec![0u64; LINE_TABLE_SIZE];

    for val in 0..LINE_TABLE_SIZE {
        let line = val as u64;
        let (left, left_score) = ops::slide_line(line, Move::Left);
        let (right, right_score) = ops::slide_line(line, Move::Right);
        shift_left[val] = left;
        shift_right[val] = right;
        shift_up[val] = ops::slide_line(line, Move::Up).0;
        shift_down[val] = ops::slide_line(line, Move::Down).0;
        merge_left[val] = left_score;
        merge_right[val] = right_score;
    }

    Stores {
        shift_left: shift_left.into_boxed_slice(),
        shift_right: shift_right.into_boxed_slice(),
        shift_up: shift_up.into_boxed_slice(),
        shift_down: shift_down.into_boxed_slice(),
        merge_left: merge_left.into_boxed_slice(),
        merge_right: merge_right.into_boxed_slice(),
    }
}

#[inline(always)]
pub(crate) fn get_line_entry(table: &[u64], idx: u16) -> u64 {
    debug_assert!((idx as usize) < LINE_TABLE_SIZE);
    unsafe { *table.get_unchecked(idx as usize) }
}
