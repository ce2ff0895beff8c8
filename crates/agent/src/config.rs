use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// How a move is drawn from the per-direction value estimates.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub enum SamplingStrategyKind {
    /// Always the best-valued legal direction.
    Argmax,
    /// Softmax over legal directions, temperature-scaled.
    Softmax,
    /// Argmax, but explore a uniform random legal direction with
    /// probability epsilon.
    EpsilonGreedy,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct SamplingStrategy {
    #[serde(rename = "strategy")]
    pub kind: SamplingStrategyKind,

    // Optional parameters belonging to specific variants; variants that do
    // not need them tolerate their absence in the TOML.
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub epsilon: Option<f64>,
}

impl SamplingStrategy {
    /// Plain greedy selection, the default for interactive play.
    pub fn argmax() -> Self {
        Self {
            kind: SamplingStrategyKind::Argmax,
            temperature: None,
            epsilon: None,
        }
    }

    /// Resolve temperature to a sane default (1.0) if not provided.
    pub fn temperature_or_default(&self) -> f64 {
        match self.temperature {
            Some(t) if t.is_finite() && t > 0.0 => t,
            _ => 1.0,
        }
    }

    /// Resolve epsilon to a sane default (0.05) if not provided; clamp to
    /// [0, 1].
    pub fn epsilon_or_default(&self) -> f64 {
        match self.epsilon {
            Some(e) if e.is_finite() && e >= 0.0 => e.min(1.0),
            _ => 0.05,
        }
    }
}

/// Which value model drives move selection.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Uniform random value estimates.
    Random,
    /// One-step lookahead over merge points and freed cells.
    Lookahead,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Config {
    /// Number of independent games to play.
    pub num_games: u32,
    /// Seed of the first game; game k plays with `base_seed + k`.
    #[serde(default)]
    pub base_seed: u64,
    /// Optional cap on the total number of moves across all games.
    #[serde(default)]
    pub max_total_steps: Option<u64>,

    #[serde(default = "defaults::policy")]
    pub policy: PolicyKind,
    pub sampling: SamplingStrategy,

    #[serde(default)]
    pub report: Report,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Default)]
pub struct Report {
    /// Write per-game results as JSON to this path.
    #[serde(default)]
    pub results_file: Option<PathBuf>,
    /// Record runs into `<session_dir>/metadata.db`.
    #[serde(default)]
    pub session_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }
}

mod defaults {
    pub fn policy() -> super::PolicyKind {
        super::PolicyKind::Lookahead
    }
}
