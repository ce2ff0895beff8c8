use game_env::Move;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::Rng;

use crate::config::{SamplingStrategy, SamplingStrategyKind};
use crate::policy::QValues;

/// Pick a direction from the value estimates, restricted to the legal
/// mask. Returns `None` only when no direction is legal.
pub fn select_move(
    q: &QValues,
    legal: &[bool; 4],
    sampling: &SamplingStrategy,
    rng: &mut StdRng,
) -> Option<Move> {
    if !legal.iter().any(|&l| l) {
        return None;
    }
    match sampling.kind {
        SamplingStrategyKind::Argmax => select_argmax(q, legal),
        SamplingStrategyKind::Softmax => {
            let t = sampling.temperature_or_default() as f32;
            select_softmax(q, legal, t, rng)
        }
        SamplingStrategyKind::EpsilonGreedy => {
            let epsilon = sampling.epsilon_or_default();
            if rng.gen_bool(epsilon) {
                select_uniform(legal, rng)
            } else {
                select_argmax(q, legal)
            }
        }
    }
}

fn select_argmax(q: &QValues, legal: &[bool; 4]) -> Option<Move> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &value) in q.iter().enumerate() {
        if !legal[i] {
            continue;
        }
        match best {
            Some((_, best_v)) if value <= best_v => {}
            _ => best = Some((i, value)),
        }
    }
    best.and_then(|(i, _)| Move::from_index(i as u8))
}

fn select_softmax(q: &QValues, legal: &[bool; 4], temperature: f32, rng: &mut StdRng) -> Option<Move> {
    let t = if temperature.is_finite() && temperature > 0.0 {
        temperature
    } else {
        1.0
    };
    // Subtract the best legal value before exponentiating to keep the
    // weights in range.
    let mut max_q = f32::NEG_INFINITY;
    for (i, &value) in q.iter().enumerate() {
        if legal[i] && value.is_finite() && value > max_q {
            max_q = value;
        }
    }
    if !max_q.is_finite() {
        return select_uniform(legal, rng);
    }
    let mut weights = [0.0f64; 4];
    for (i, &value) in q.iter().enumerate() {
        if legal[i] && value.is_finite() {
            weights[i] = f64::from(((value - max_q) / t).exp());
        }
    }
    if weights.iter().all(|&w| w == 0.0) {
        return select_argmax(q, legal);
    }
    let dist = match WeightedIndex::new(weights) {
        Ok(d) => d,
        Err(_) => return select_argmax(q, legal),
    };
    Move::from_index(dist.sample(rng) as u8)
}

fn select_uniform(legal: &[bool; 4], rng: &mut StdRng) -> Option<Move> {
    let candidates: Vec<usize> = (0..4).filter(|&i| legal[i]).collect();
    if candidates.is_empty() {
        return None;
    }
    let pick = candidates[rng.gen_range(0..candidates.len())];
    Move::from_index(pick as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(1)
    }

    #[test]
    fn argmax_honors_the_legal_mask() {
        let q = [10.0, 1.0, 2.0, 3.0];
        let legal = [false, true, true, true];
        let picked = select_move(&q, &legal, &SamplingStrategy::argmax(), &mut rng());
        assert_eq!(picked, Some(Move::Down));
    }

    #[test]
    fn nothing_legal_selects_nothing() {
        let q = [1.0, 2.0, 3.0, 4.0];
        let legal = [false; 4];
        for kind in [
            SamplingStrategyKind::Argmax,
            SamplingStrategyKind::Softmax,
            SamplingStrategyKind::EpsilonGreedy,
        ] {
            let sampling = SamplingStrategy {
                kind,
                temperature: None,
                epsilon: None,
            };
            assert_eq!(select_move(&q, &legal, &sampling, &mut rng()), None);
        }
    }

    #[test]
    fn epsilon_zero_behaves_like_argmax() {
        let sampling = SamplingStrategy {
            kind: SamplingStrategyKind::EpsilonGreedy,
            temperature: None,
            epsilon: Some(0.0),
        };
        let q = [0.5, 4.5, -1.0, 0.0];
        let legal = [true; 4];
        let mut r = rng();
        for _ in 0..50 {
            assert_eq!(select_move(&q, &legal, &sampling, &mut r), Some(Move::Left));
        }
    }

    #[test]
    fn softmax_only_returns_legal_moves() {
        let sampling = SamplingStrategy {
            kind: SamplingStrategyKind::Softmax,
            temperature: Some(2.0),
            epsilon: None,
        };
        let q = [100.0, 0.5, 0.4, f32::NEG_INFINITY];
        let legal = [false, true, true, true];
        let mut r = rng();
        for _ in 0..100 {
            let picked = select_move(&q, &legal, &sampling, &mut r).expect("legal moves exist");
            assert!(matches!(picked, Move::Left | Move::Right | Move::Down));
        }
    }

    #[test]
    fn softmax_with_all_infinite_estimates_still_picks_something() {
        let sampling = SamplingStrategy {
            kind: SamplingStrategyKind::Softmax,
            temperature: None,
            epsilon: None,
        };
        let q = [f32::NEG_INFINITY; 4];
        let legal = [true, false, true, false];
        let picked = select_move(&q, &legal, &sampling, &mut rng()).expect("fallback pick");
        assert!(matches!(picked, Move::Up | Move::Right));
    }
}
