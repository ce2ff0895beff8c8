//! One-hot board encoding, the sole representation handed to policies.
//!
//! Each of the 16 cells is a 16-channel one-hot vector: channel 0 for an
//! empty cell, channel k for a tile of value 2^k. The packed board stores
//! exactly those exponents, so encoding is a direct scatter and decoding
//! an argmax per cell.

use crate::engine::Board;

/// Channels per cell; exponents run 0 (empty) through 15 (tile 32768).
pub const CHANNELS: usize = 16;

/// Floats per encoded board.
pub const TENSOR_LEN: usize = 4 * 4 * CHANNELS;

/// One-hot tensor of shape 4x4x16, indexed `[row][col][channel]`.
pub type StateTensor = [[[f32; CHANNELS]; 4]; 4];

/// Encode a board into its one-hot tensor.
pub fn encode(board: Board) -> StateTensor {
    let mut out = [[[0.0; CHANNELS]; 4]; 4];
    for (idx, exp) in board.tiles().enumerate() {
        out[idx / 4][idx % 4][exp as usize] = 1.0;
    }
    out
}

/// Recover the board from a one-hot tensor by taking the strongest channel
/// per cell. Inverse of [`encode`] for every valid tensor.
pub fn decode(state: &StateTensor) -> Board {
    let mut exps = [0u8; 16];
    for (i, row) in state.iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            let mut best = 0;
            for (channel, &v) in cell.iter().enumerate() {
                if v > cell[best] {
                    best = channel;
                }
            }
            exps[i * 4 + j] = best as u8;
        }
    }
    Board::from_exponents(exps)
}

/// Encode many boards into a caller-provided flat buffer.
///
/// - `out` must hold exactly `boards.len() * 256` floats and is filled with
///   one row-major 4x4x16 tensor per board.
/// - If `parallel` is true, boards are distributed across Rayon workers;
///   useful when batching states for an inference backend.
pub fn encode_batch_into(out: &mut [f32], boards: &[Board], parallel: bool) {
    assert_eq!(
        out.len(),
        boards.len() * TENSOR_LEN,
        "out buffer must be N*{TENSOR_LEN} floats"
    );
    if parallel {
        use rayon::prelude::*;
        out.par_chunks_mut(TENSOR_LEN)
            .zip(boards.par_iter().copied())
            .for_each(|(dst, board)| encode_into(dst, board));
    } else {
        for (dst, &board) in out.chunks_mut(TENSOR_LEN).zip(boards.iter()) {
            encode_into(dst, board);
        }
    }
}

fn encode_into(dst: &mut [f32], board: Board) {
    dst.fill(0.0);
    for (idx, exp) in board.tiles().enumerate() {
        dst[idx * CHANNELS + exp as usize] = 1.0;
    }
}
