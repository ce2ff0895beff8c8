//! Simulation environment for the game 2048.
//!
//! The crate is split in two layers:
//!
//! - [`engine`] holds the board mechanics: a packed 4x4 board, fast
//!   slide/merge ops backed by precomputed per-line tables, spawn logic and
//!   the terminal-position check.
//! - [`env`] wraps the mechanics into the stateful [`Game2048`] environment
//!   with `reset`/`step` semantics, shaped rewards and run statistics, the
//!   interface a move-selection policy is driven against.
//!
//! [`encoding`] converts boards to and from the 4x4x16 one-hot tensor
//! consumed by policies.

pub mod encoding;
pub mod engine;
pub mod env;

pub use encoding::StateTensor;
pub use engine::{Board, Move};
pub use env::{Game2048, GameError, Step, StepInfo};
