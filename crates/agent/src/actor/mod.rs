use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use game_env::env::WIN_TILE;
use game_env::{Game2048, Move};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::SamplingStrategy;
use crate::policy::Policy;

pub mod strategies;

// Decorrelates the sampling stream from the spawn stream of the same seed.
const SAMPLING_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-game actor that drives a single environment to completion by
/// querying the policy and applying selected moves.
pub struct GameActor {
    game_id: u32,
    seed: u64,
    env: Game2048,
    policy: Box<dyn Policy>,
    sampling: SamplingStrategy,
    step_budget: Option<StepBudget>,
}

/// Shared cap on the total number of moves across all actors.
#[derive(Clone, Debug)]
pub struct StepBudget {
    max: u64,
    used: Arc<AtomicU64>,
}

impl StepBudget {
    pub fn new(max: u64) -> Self {
        Self {
            max,
            used: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Try to consume exactly 1 step of budget. Returns false if exhausted.
    pub fn try_take(&self) -> bool {
        self.used
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |used| {
                (used < self.max).then_some(used + 1)
            })
            .is_ok()
    }

    /// Number of steps consumed so far.
    pub fn used(&self) -> u64 {
        self.used.load(Ordering::Relaxed)
    }
}

/// Summary of one finished (or budget-cut) game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GameResult {
    pub game_id: u32,
    pub seed: u64,
    pub moves: u64,
    pub score: u64,
    /// Highest tile on the final board.
    pub max_tile: u32,
    /// True when the final board carries the goal tile.
    pub win: bool,
    pub total_reward: f32,
}

impl GameActor {
    pub fn new(
        game_id: u32,
        seed: u64,
        policy: Box<dyn Policy>,
        sampling: SamplingStrategy,
        step_budget: Option<StepBudget>,
    ) -> Self {
        Self {
            game_id,
            seed,
            env: Game2048::from_seed(seed),
            policy,
            sampling,
            step_budget,
        }
    }

    /// Run the actor loop to completion and return the result.
    pub fn run(mut self) -> GameResult {
        let mut rng = StdRng::seed_from_u64(self.seed ^ SAMPLING_SEED_SALT);
        let mut total_reward = 0.0;

        while !self.env.is_done() {
            if let Some(budget) = &self.step_budget {
                if !budget.try_take() {
                    debug!("game {}: step budget exhausted", self.game_id);
                    break;
                }
            }
            let state = self.env.state_encoding();
            let q = self.policy.evaluate(&state);
            let legal = legal_mask(&self.env);
            let Some(mv) = strategies::select_move(&q, &legal, &self.sampling, &mut rng) else {
                break;
            };
            let step = self.env.step(mv);
            total_reward += step.reward;
        }

        let max_tile = self.env.board().highest_tile();
        let result = GameResult {
            game_id: self.game_id,
            seed: self.seed,
            moves: self.env.moves(),
            score: self.env.score(),
            max_tile,
            win: max_tile >= WIN_TILE,
            total_reward,
        };
        debug!(
            "game {} finished: moves={} score={} max_tile={} win={}",
            result.game_id, result.moves, result.score, result.max_tile, result.win
        );
        result
    }
}

/// Which directions would change the board, in action-index order.
pub fn legal_mask(env: &Game2048) -> [bool; 4] {
    let board = env.board();
    let mut mask = [false; 4];
    for (i, mv) in Move::ALL.into_iter().enumerate() {
        mask[i] = board.shift(mv) != board;
    }
    mask
}
