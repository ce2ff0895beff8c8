//! Board mechanics: compact 2048 board, slide/merge ops with per-move
//! merge scoring, and precomputed lookup tables.
//!
//! - `Board` is the packed 4x4 state with useful methods.
//! - Free functions mirror the methods when convenient (e.g., `shift`).
//! - Internals (tables and hot ops) live in submodules to keep things tidy.

mod ops;
pub mod state;
mod tables;

pub use state::{Board, Move};

pub use ops::{
    count_empty, get_tile_val, highest_exponent, highest_tile_val, is_terminal, shift,
    shift_scored,
};

/// Force initialization of the precomputed line tables.
///
/// Tables are built lazily on first use; calling this early moves the
/// one-time cost out of latency-sensitive paths. Safe to call repeatedly.
pub fn init() {
    tables::init();
}
