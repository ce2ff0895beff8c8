use std::sync::{Arc, Mutex};

use agent::actor::{self, strategies};
use agent::config::SamplingStrategy;
use agent::policy::Policy;
use game_env::env::WIN_TILE;
use game_env::{Game2048, GameError, Move, Step};
use rand::rngs::StdRng;
use rand::SeedableRng;

// Decorrelates tie-break sampling from the spawn stream of the same seed.
const SAMPLING_SEED_SALT: u64 = 0x51ce_5e55_1031_c0de;

/// One browser-facing game: an environment plus the policy that plays it.
pub struct GameSession {
    env: Game2048,
    policy: Box<dyn Policy>,
    sampling: SamplingStrategy,
    rng: StdRng,
}

impl GameSession {
    pub fn new(seed: u64, policy: Box<dyn Policy>) -> Self {
        Self {
            env: Game2048::from_seed(seed),
            policy,
            sampling: SamplingStrategy::argmax(),
            rng: StdRng::seed_from_u64(seed ^ SAMPLING_SEED_SALT),
        }
    }

    pub fn env(&self) -> &Game2048 {
        &self.env
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Discard the current run and start a new one.
    pub fn reset(&mut self) {
        self.env.reset();
    }

    /// Apply one manual move given as a raw action index.
    pub fn step_raw(&mut self, action: u8) -> Result<Step, GameError> {
        self.env.step_raw(action)
    }

    /// One policy-driven tick: encode the state, ask the policy, apply the
    /// selected move. `None` once the game is over.
    pub fn tick(&mut self) -> Option<(Move, Step)> {
        if self.env.is_done() {
            return None;
        }
        let state = self.env.state_encoding();
        let q = self.policy.evaluate(&state);
        let legal = actor::legal_mask(&self.env);
        let mv = strategies::select_move(&q, &legal, &self.sampling, &mut self.rng)?;
        Some((mv, self.env.step(mv)))
    }

    /// Win/lose classification of a finished run; `None` while playing.
    pub fn outcome(&self) -> Option<&'static str> {
        if !self.env.is_done() {
            return None;
        }
        if self.env.board().highest_tile() >= WIN_TILE {
            Some("win")
        } else {
            Some("lose")
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<GameSession>>,
}

impl AppState {
    pub fn new(session: GameSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }
}
