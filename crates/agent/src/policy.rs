use game_env::encoding;
use game_env::{Move, StateTensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::PolicyKind;

/// Per-direction value estimates, indexed in action order
/// (up, left, right, down).
pub type QValues = [f32; 4];

/// The move-selection boundary: a policy sees nothing but the one-hot
/// state tensor and rates each direction. Anything can stand behind it,
/// from a loaded network to the heuristics below; the environment never
/// depends on which.
pub trait Policy: Send {
    fn name(&self) -> &'static str;

    /// Rate the four directions for the given state. Estimates for
    /// directions that turn out to be illegal are ignored by selection.
    fn evaluate(&mut self, state: &StateTensor) -> QValues;
}

/// Uniform random value estimates from a seeded source. The weakest
/// possible baseline, useful to sanity-check everything above it.
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn evaluate(&mut self, _state: &StateTensor) -> QValues {
        std::array::from_fn(|_| self.rng.gen())
    }
}

/// One-step lookahead: decode the tensor back into a board, simulate each
/// direction, and rate it by the points its merges produce and the cells
/// it frees. Illegal directions rate negative infinity.
pub struct LookaheadPolicy;

impl Policy for LookaheadPolicy {
    fn name(&self) -> &'static str {
        "lookahead"
    }

    fn evaluate(&mut self, state: &StateTensor) -> QValues {
        let board = encoding::decode(state);
        let empty_before = board.count_empty();
        Move::ALL.map(|mv| {
            let (after, merge_score) = board.shift_scored(mv);
            if after == board {
                return f32::NEG_INFINITY;
            }
            let freed = after.count_empty() as f32 - empty_before as f32;
            merge_score as f32 / 10.0 + 0.5 * freed
        })
    }
}

/// Instantiate the configured policy. `seed` only matters for stochastic
/// policies and should differ per game for independent runs.
pub fn build_policy(kind: PolicyKind, seed: u64) -> Box<dyn Policy> {
    match kind {
        PolicyKind::Random => Box::new(RandomPolicy::from_seed(seed)),
        PolicyKind::Lookahead => Box::new(LookaheadPolicy),
    }
}
