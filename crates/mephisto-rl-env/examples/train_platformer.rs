//! Example: Q-learning agent training on the platformer
//!
//! Usage: `cargo run --example train_platformer [config.json]`

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use mephisto_rl_env::{
    PlatformerEnv, TileMap, TimeLimit, TrainingConfig, TrainingLoop, DEFAULT_LEVEL,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => TrainingConfig::from_json_file(&path)
            .with_context(|| format!("failed to read training config {path}"))?,
        None => TrainingConfig::default(),
    };

    let map = match &config.level {
        Some(path) => TileMap::from_file(path, config.env.tile_size)
            .await
            .with_context(|| format!("failed to load level {}", path.display()))?,
        None => TileMap::parse(DEFAULT_LEVEL, config.env.tile_size)?,
    };

    let env = PlatformerEnv::new(map, config.env.clone(), config.agent.rewards)?;
    let env = TimeLimit::new(env, config.max_steps);
    let mut training = TrainingLoop::new(env, config.agent.clone())
        .await
        .context("failed to set up training")?;

    let history = training.run(config.episodes).await?;

    // Print statistics
    println!("\nEpisodes: {}", history.len());
    println!("Goals reached: {}", history.goals());
    if let Some(mean) = history.mean() {
        println!("Mean score: {mean:.2}");
    }
    if let Some(std_dev) = history.std_dev() {
        println!("Score std dev: {std_dev:.2}");
    }
    if let Some(best) = history.best() {
        println!("Best score: {best:.2}");
    }

    #[cfg(feature = "visualization")]
    mephisto_rl_env::report::plot_scores(history, std::path::Path::new("scores.png"))?;

    Ok(())
}
