//! Tick-by-tick training of a [`QAgent`] in an [`Environment`]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use mephisto_rl_agent::{EpisodeSummary, QAgent, ScoreHistory};
use mephisto_rl_core::{AgentConfig, Environment, MapBounds, RLError, Result, Terminal};

use crate::platformer::EnvConfig;

/// Everything a training run reads at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Agent settings
    pub agent: AgentConfig,
    /// Player physics
    pub env: EnvConfig,
    /// Episodes to run
    pub episodes: usize,
    /// Tick budget per episode
    pub max_steps: usize,
    /// ASCII level file; the built-in level when absent
    pub level: Option<PathBuf>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            env: EnvConfig::default(),
            episodes: 100,
            max_steps: 2_000,
            level: None,
        }
    }
}

impl TrainingConfig {
    /// Read and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.agent.validate()?;
        config.env.validate()?;
        Ok(config)
    }
}

/// Drives an agent and an environment in lockstep.
///
/// Each tick: the agent selects an action for its current state, the
/// environment executes it, and the agent learns from the reward and the
/// next observation. A terminal step ends the episode and restarts the
/// agent from the environment's start observation.
pub struct TrainingLoop<E> {
    env: E,
    agent: QAgent,
    table_path: Option<PathBuf>,
}

impl<E: Environment> TrainingLoop<E> {
    /// Reset the environment and build an agent at its start.
    ///
    /// Map bounds left at zero are taken from the environment. If the
    /// configuration names a table file that exists, it is loaded; a file
    /// learned under a different mode or action set is ignored.
    pub async fn new(mut env: E, mut config: AgentConfig) -> Result<Self> {
        if config.bounds == MapBounds::default() {
            config.bounds = env.bounds();
        }
        let table_path = config.table_path.clone();

        let start = env.reset().await?;
        let mut agent = QAgent::new(config, &start, env.collisions())?;

        if let Some(path) = &table_path {
            if tokio::fs::try_exists(path).await? {
                match agent.load(path).await {
                    Ok(()) => {}
                    Err(RLError::Persistence(reason)) => {
                        warn!(path = %path.display(), %reason, "ignoring incompatible value table");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(Self {
            env,
            agent,
            table_path,
        })
    }

    /// Run ticks until the environment ends the episode.
    ///
    /// Never returns if the environment never ends an episode; wrap it in a
    /// [`crate::TimeLimit`] to bound episode length.
    pub async fn run_episode(&mut self) -> Result<EpisodeSummary> {
        loop {
            let action = self.agent.select_action()?;
            let step = self.env.step(action).await?;
            self.agent
                .update(action, step.reward, &step.observation, self.env.collisions())?;

            if let Some(reason) = step.terminal {
                let start = self.env.start_observation();
                return self.agent.reset(&start, self.env.collisions(), reason);
            }
        }
    }

    /// Abandon the current episode and start over
    pub async fn restart(&mut self) -> Result<EpisodeSummary> {
        let start = self.env.reset().await?;
        self.agent
            .reset(&start, self.env.collisions(), Terminal::Restart)
    }

    /// Run `episodes` episodes, then save the table if a path is configured
    pub async fn run(&mut self, episodes: usize) -> Result<&ScoreHistory> {
        for episode in 0..episodes {
            let summary = self.run_episode().await?;
            debug!(
                episode,
                score = summary.score,
                steps = summary.steps,
                reason = ?summary.reason,
                "episode summary"
            );
        }

        let history = self.agent.history();
        info!(
            episodes = history.len(),
            mean = history.mean().unwrap_or_default(),
            best = history.best().unwrap_or_default(),
            goals = history.goals(),
            "training finished"
        );

        self.save().await?;
        Ok(self.agent.history())
    }

    /// Save the table to the configured path, if any
    pub async fn save(&self) -> Result<()> {
        match &self.table_path {
            Some(path) => self.agent.save(path).await,
            None => Ok(()),
        }
    }

    /// The agent
    pub fn agent(&self) -> &QAgent {
        &self.agent
    }

    /// The environment
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Split into environment and agent
    pub fn into_parts(self) -> (E, QAgent) {
        (self.env, self.agent)
    }
}
