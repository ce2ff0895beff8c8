use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rayon::prelude::*;

use agent::actor::{GameActor, GameResult, StepBudget};
use agent::config::Config;
use agent::policy;
use agent::recorder::SessionRecorder;

#[derive(Parser, Debug)]
#[command(about = "Headless self-play runner for the 2048 environment")]
struct Args {
    /// Path to the TOML run configuration.
    #[arg(long, value_name = "FILE")]
    config: PathBuf,
    /// Override the number of games from the config.
    #[arg(long)]
    games: Option<u32>,
    /// Override the base seed from the config.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut cfg = Config::from_toml(&args.config)?;
    if let Some(games) = args.games {
        cfg.num_games = games;
    }
    if let Some(seed) = args.seed {
        cfg.base_seed = seed;
    }
    info!(
        "playing {} games with the {:?} policy (base seed {})",
        cfg.num_games, cfg.policy, cfg.base_seed
    );

    // Warm the line tables once instead of inside every worker.
    game_env::engine::init();

    let budget = cfg.max_total_steps.map(StepBudget::new);
    let bar = ProgressBar::new(u64::from(cfg.num_games));
    bar.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} games ({eta})",
    )?);

    let mut results: Vec<GameResult> = (0..cfg.num_games)
        .into_par_iter()
        .map(|game_id| {
            let seed = cfg.base_seed.wrapping_add(u64::from(game_id));
            let actor = GameActor::new(
                game_id,
                seed,
                policy::build_policy(cfg.policy, seed),
                cfg.sampling,
                budget.clone(),
            );
            let result = actor.run();
            bar.inc(1);
            result
        })
        .collect();
    bar.finish_and_clear();
    results.sort_by_key(|r| r.game_id);

    summarize(&results);
    if let Some(budget) = &budget {
        info!("consumed {} of the step budget", budget.used());
    }

    if let Some(path) = &cfg.report.results_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create results file {}", path.display()))?;
        serde_json::to_writer_pretty(file, &results)
            .with_context(|| format!("failed to write results to {}", path.display()))?;
        info!("wrote {} results to {}", results.len(), path.display());
    }

    if let Some(dir) = &cfg.report.session_dir {
        let mut recorder = SessionRecorder::new(dir)?;
        recorder.set_meta("policy", &format!("{:?}", cfg.policy))?;
        recorder.set_meta("num_games", &cfg.num_games.to_string())?;
        recorder.set_meta("base_seed", &cfg.base_seed.to_string())?;
        for result in &results {
            recorder.upsert_run(result)?;
        }
        info!("recorded session in {}", dir.display());
    }

    Ok(())
}

fn summarize(results: &[GameResult]) {
    if results.is_empty() {
        info!("no games played");
        return;
    }
    let wins = results.iter().filter(|r| r.win).count();
    let total_score: u64 = results.iter().map(|r| r.score).sum();
    let total_moves: u64 = results.iter().map(|r| r.moves).sum();
    let best_tile = results.iter().map(|r| r.max_tile).max().unwrap_or(0);
    info!(
        "{} games: {} wins ({:.1}%), mean score {:.1}, mean moves {:.1}, best tile {}",
        results.len(),
        wins,
        100.0 * wins as f64 / results.len() as f64,
        total_score as f64 / results.len() as f64,
        total_moves as f64 / results.len() as f64,
        best_tile
    );
}
