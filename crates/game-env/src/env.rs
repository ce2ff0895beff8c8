use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;

use crate::encoding::{self, StateTensor};
use crate::engine::{self, Board, Move};

/// Reaching this tile classifies a finished run as a win.
pub const WIN_TILE: u32 = 2048;

/// The only failure the environment can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameError {
    /// An out-of-range action index reached [`Game2048::step_raw`].
    /// The environment state is left untouched.
    #[error("invalid action {0}: expected 0 (up), 1 (left), 2 (right) or 3 (down)")]
    InvalidAction(u8),
}

/// Run statistics reported alongside every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepInfo {
    /// Total points from merges over the run.
    pub score: u64,
    /// Number of moves that changed the board.
    pub moves: u64,
    /// Highest tile value ever placed on the board by a spawn.
    pub highest_tile: u32,
}

/// Outcome of a single [`Game2048::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Step {
    /// The board after the move and the follow-up spawn.
    pub board: Board,
    /// Shaped reward for the move; -1 for a move that changed nothing.
    pub reward: f32,
    /// True once no further move can change the board.
    pub done: bool,
    pub info: StepInfo,
}

/// The stateful 2048 environment: one 4x4 board, its run counters, and an
/// injectable random source for tile spawns.
///
/// A fresh environment (or a [`reset`](Game2048::reset)) starts with two
/// spawned tiles. The board is mutated exclusively through
/// [`step`](Game2048::step); every valid move slides/merges tiles, spawns
/// one new tile, and re-evaluates termination.
///
/// ```
/// use game_env::{Game2048, Move};
///
/// let mut game = Game2048::from_seed(42);
/// let step = game.step(Move::Left);
/// assert!(step.info.moves <= 1);
/// ```
pub struct Game2048<R: Rng = StdRng> {
    board: Board,
    score: u64,
    moves: u64,
    highest_tile: u32,
    done: bool,
    rng: R,
}

impl Game2048<StdRng> {
    /// New environment seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// New environment with a deterministic spawn sequence.
    pub fn from_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for Game2048<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Game2048<R> {
    /// New environment drawing spawn randomness from `rng`.
    pub fn with_rng(rng: R) -> Self {
        let mut game = Self {
            board: Board::EMPTY,
            score: 0,
            moves: 0,
            highest_tile: 0,
            done: false,
            rng,
        };
        game.reset();
        game
    }

    /// Clear the board and counters and spawn the two starting tiles.
    /// Returns the starting board.
    pub fn reset(&mut self) -> Board {
        self.board = Board::EMPTY;
        self.score = 0;
        self.moves = 0;
        self.highest_tile = 0;
        self.done = false;
        self.spawn_tile();
        self.spawn_tile();
        self.board
    }

    /// Apply one move.
    ///
    /// A move that leaves the board identical is a no-op: nothing advances
    /// and the reward is -1. Identity of the pre- and post-slide boards is
    /// the sole authority for that decision. A valid move increments the
    /// move counter, spawns one tile, accumulates the merge points into the
    /// score, and re-evaluates termination; its reward combines the merge
    /// points, a bonus for raising the maximum tile, and the change in
    /// empty cells (both measured after the spawn).
    pub fn step(&mut self, action: Move) -> Step {
        let before = self.board;
        let old_max_exp = engine::highest_exponent(before);
        let old_empty = engine::count_empty(before);

        let (candidate, merge_score) = engine::shift_scored(before, action);
        if candidate == before {
            return Step {
                board: before,
                reward: -1.0,
                done: self.done,
                info: self.info(),
            };
        }

        self.board = candidate;
        self.moves += 1;
        self.spawn_tile();
        self.score += merge_score;
        self.done = engine::is_terminal(self.board);

        let new_max_exp = engine::highest_exponent(self.board);
        let new_empty = engine::count_empty(self.board);
        let mut reward = merge_score as f32 / 10.0;
        if new_max_exp > old_max_exp {
            reward += f32::from(new_max_exp) * 2.0;
        }
        reward += 0.5 * (new_empty as f32 - old_empty as f32);

        Step {
            board: self.board,
            reward,
            done: self.done,
            info: self.info(),
        }
    }

    /// Apply one move given as a raw action index (0 = up, 1 = left,
    /// 2 = right, 3 = down), the form actions take at wire boundaries.
    pub fn step_raw(&mut self, action: u8) -> Result<Step, GameError> {
        let mv = Move::from_index(action).ok_or(GameError::InvalidAction(action))?;
        Ok(self.step(mv))
    }

    /// One-hot 4x4x16 encoding of the current board, the representation
    /// handed to policies.
    pub fn state_encoding(&self) -> StateTensor {
        encoding::encode(self.board)
    }

    pub fn board(&self) -> Board {
        self.board
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn moves(&self) -> u64 {
        self.moves
    }

    /// Highest tile value ever placed by a spawn (not the board maximum;
    /// see [`Board::highest_tile`] for that).
    pub fn highest_tile(&self) -> u32 {
        self.highest_tile
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn info(&self) -> StepInfo {
        StepInfo {
            score: self.score,
            moves: self.moves,
            highest_tile: self.highest_tile,
        }
    }

    fn spawn_tile(&mut self) {
        let (board, value) = self.board.with_random_tile(&mut self.rng);
        self.board = board;
        self.highest_tile = self.highest_tile.max(value);
    }
}

impl<R: Rng> std::fmt::Debug for Game2048<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game2048")
            .field("board", &self.board)
            .field("score", &self.score)
            .field("moves", &self.moves)
            .field("highest_tile", &self.highest_tile)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_legal_move(board: Board) -> Option<Move> {
        Move::ALL.into_iter().find(|&mv| board.shift(mv) != board)
    }

    #[test]
    fn reset_spawns_two_tiles_and_clears_counters() {
        let mut game = Game2048::from_seed(3);
        game.step(Move::Left);
        game.step(Move::Down);
        let board = game.reset();
        assert_eq!(board.count_empty(), 14);
        assert_eq!(game.score(), 0);
        assert_eq!(game.moves(), 0);
        assert!(!game.is_done());
        assert!(matches!(game.highest_tile(), 2 | 4));
        for value in board.to_rows().into_iter().flatten() {
            assert!(matches!(value, 0 | 2 | 4));
        }
    }

    #[test]
    fn left_move_merges_a_pair() {
        let mut game = Game2048::from_seed(11);
        game.board = Board::from_rows([[2, 2, 4, 0], [0; 4], [0; 4], [0; 4]]);
        let step = game.step(Move::Left);

        let rows = step.board.to_rows();
        assert_eq!(rows[0][0], 4);
        assert_eq!(rows[0][1], 4);
        assert_eq!(step.info.score, 4);
        assert_eq!(step.info.moves, 1);
        // Two tiles remain from the slide plus exactly one spawn.
        assert_eq!(step.board.count_empty(), 13);
        assert!(!step.done);
    }

    #[test]
    fn blocked_move_is_a_no_op_with_negative_reward() {
        let mut game = Game2048::from_seed(5);
        game.board = Board::from_rows([[2, 4, 8, 16], [0; 4], [0; 4], [0; 4]]);
        let before = game.info();

        let step = game.step(Move::Up);

        assert_eq!(step.board, game.board());
        assert_eq!(step.board.to_rows()[0], [2, 4, 8, 16]);
        assert_eq!(step.reward, -1.0);
        assert!(!step.done);
        assert_eq!(step.info, before);
        assert_eq!(game.moves(), 0);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn invalid_raw_action_leaves_the_state_untouched() {
        let mut game = Game2048::from_seed(8);
        let board = game.board();
        let info = game.info();

        assert_eq!(game.step_raw(4), Err(GameError::InvalidAction(4)));
        assert_eq!(game.step_raw(255), Err(GameError::InvalidAction(255)));
        assert_eq!(game.board(), board);
        assert_eq!(game.info(), info);

        // Valid indices map onto the typed moves.
        let step = game.step_raw(1).expect("1 is the left action");
        assert_eq!(step.info, game.info());
    }

    #[test]
    fn valid_moves_spawn_exactly_one_tile_in_an_empty_cell() {
        let mut game = Game2048::from_seed(9);
        for _ in 0..300 {
            if game.is_done() {
                break;
            }
            let before = game.board();
            let Some(mv) = first_legal_move(before) else {
                break;
            };
            let (candidate, merge_score) = before.shift_scored(mv);
            let score_before = game.score();

            let step = game.step(mv);

            assert_eq!(game.score() - score_before, merge_score);
            let cand = candidate.to_rows();
            let after = step.board.to_rows();
            let mut spawned = Vec::new();
            for i in 0..4 {
                for j in 0..4 {
                    if cand[i][j] != after[i][j] {
                        assert_eq!(cand[i][j], 0, "spawn must land on an empty cell");
                        spawned.push(after[i][j]);
                    }
                }
            }
            if candidate.count_empty() > 0 {
                assert_eq!(spawned.len(), 1);
                assert!(matches!(spawned[0], 2 | 4));
            } else {
                assert!(spawned.is_empty());
            }
        }
    }

    #[test]
    fn counters_never_decrease() {
        let mut game = Game2048::from_seed(17);
        let (mut score, mut moves, mut highest) = (0, 0, 0);
        for _ in 0..500 {
            if game.is_done() {
                break;
            }
            let Some(mv) = first_legal_move(game.board()) else {
                break;
            };
            let step = game.step(mv);
            assert!(step.info.score >= score);
            assert!(step.info.moves >= moves);
            assert!(step.info.highest_tile >= highest);
            score = step.info.score;
            moves = step.info.moves;
            highest = step.info.highest_tile;
        }
    }

    #[test]
    fn highest_tile_tracks_spawned_tiles() {
        let mut game = Game2048::from_seed(13);
        for _ in 0..200 {
            if game.is_done() {
                break;
            }
            let Some(mv) = first_legal_move(game.board()) else {
                break;
            };
            game.step(mv);
            // Spawns only produce 2s and 4s, and only spawns feed the stat.
            assert!(matches!(game.highest_tile(), 2 | 4));
        }
    }

    #[test]
    fn playout_reaches_a_terminal_position() {
        let mut game = Game2048::from_seed(42);
        let mut guard = 0;
        while !game.is_done() {
            let mv = first_legal_move(game.board())
                .expect("a non-terminal position always has a legal move");
            game.step(mv);
            guard += 1;
            assert!(guard < 100_000, "playout did not terminate");
        }

        // Terminal means full with no mergeable neighbors.
        let rows = game.board().to_rows();
        for i in 0..4 {
            for j in 0..4 {
                assert_ne!(rows[i][j], 0);
                if j < 3 {
                    assert_ne!(rows[i][j], rows[i][j + 1]);
                }
                if i < 3 {
                    assert_ne!(rows[i][j], rows[i + 1][j]);
                }
            }
        }
        // Every further move is now a rewardless no-op.
        for mv in Move::ALL {
            let step = game.step(mv);
            assert_eq!(step.reward, -1.0);
            assert!(step.done);
        }
    }

    #[test]
    fn identical_seeds_play_identical_games() {
        let mut a = Game2048::from_seed(77);
        let mut b = Game2048::from_seed(77);
        assert_eq!(a.board(), b.board());
        for _ in 0..200 {
            if a.is_done() {
                break;
            }
            let mv = first_legal_move(a.board()).expect("legal move");
            let step_a = a.step(mv);
            let step_b = b.step(mv);
            assert_eq!(step_a, step_b);
        }
    }

    #[test]
    fn reward_shapes_merges_and_empty_cells() {
        let mut game = Game2048::from_seed(23);
        // A merge that cannot raise the maximum tile: 2+2 under an 8.
        game.board = Board::from_rows([[8, 2, 2, 0], [0; 4], [0; 4], [0; 4]]);
        let step = game.step(Move::Left);
        // Merge points 4; three tiles became two, then one spawned: empty
        // count is back where it started, so the empty term is zero.
        assert_eq!(step.reward, 4.0 / 10.0);

        // A merge that raises the maximum earns the exponent bonus.
        let mut game = Game2048::from_seed(23);
        game.board = Board::from_rows([[8, 8, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let step = game.step(Move::Left);
        // 16.0/10 for the merge, log2(16)*2 for the new maximum, net empty
        // change zero (two tiles merged, one spawned).
        assert_eq!(step.reward, 16.0 / 10.0 + 4.0 * 2.0);
    }
}
