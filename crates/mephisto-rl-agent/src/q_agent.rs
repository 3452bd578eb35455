//! Tabular Q-learning agent

use std::path::Path;
use tracing::info;

use mephisto_rl_core::{
    Action, ActionSet, ActionValueTable, Agent, AgentConfig, AgentMetrics, CollisionQuery,
    DiscretizationMode, Policy, RawObservation, Result, Reward, State, Terminal, Transition,
};

use crate::encoder::StateEncoder;
use crate::episode::{Episode, EpisodeSummary, ScoreHistory};
use crate::learner::QLearner;
use crate::persistence::TableSnapshot;
use crate::policy::GreedyPolicy;
use crate::random::RandomPolicy;
use crate::table::build_table;

/// Agent that discretizes observations, acts greedily on a value table and
/// learns with one-step Q-learning. In random mode it acts uniformly and
/// leaves the table alone.
///
/// Eager modes allocate one row per reachable cell at construction, so memory
/// grows with `(x_bound / step + 1) * (y_bound / step + 1) * actions`. Large
/// maps in pixel mode are expensive; nothing caps this.
pub struct QAgent {
    config: AgentConfig,
    encoder: StateEncoder,
    table: Box<dyn ActionValueTable>,
    policy: Box<dyn Policy>,
    learner: QLearner,
    episode: Episode,
    history: ScoreHistory,
    total_steps: usize,
}

impl QAgent {
    /// Build an agent positioned at `start`
    pub fn new(
        config: AgentConfig,
        start: &RawObservation,
        world: &dyn CollisionQuery,
    ) -> Result<Self> {
        config.validate()?;

        let encoder = StateEncoder::new(config.mode);
        let mut table = build_table(&config)?;
        let policy: Box<dyn Policy> = match config.mode {
            DiscretizationMode::Random => Box::new(RandomPolicy::new(config.seed)),
            _ => Box::new(GreedyPolicy::new()),
        };
        let learner = QLearner::from_config(&config);

        let start_state = encoder.encode(start, world);
        if config.mode != DiscretizationMode::Random {
            table.ensure(&start_state)?;
        }

        info!(
            mode = %config.mode,
            policy = policy.name(),
            actions = config.actions.len(),
            table_states = table.len(),
            start = %start_state,
            "created q-learning agent"
        );

        Ok(Self {
            config,
            encoder,
            table,
            policy,
            learner,
            episode: Episode::new(start_state),
            history: ScoreHistory::new(),
            total_steps: 0,
        })
    }

    /// Whether updates touch the value table
    #[must_use]
    pub fn learns(&self) -> bool {
        self.config.mode != DiscretizationMode::Random
    }

    /// Discretize an observation with the configured mode
    #[must_use]
    pub fn encode(&self, observation: &RawObservation, world: &dyn CollisionQuery) -> State {
        self.encoder.encode(observation, world)
    }

    /// Choose the action for the current state
    pub fn select_action(&mut self) -> Result<Action> {
        let state = self.episode.state();
        self.policy
            .select(&state, self.table.as_ref(), &self.config.actions)
    }

    /// Learn from taking `action` in the current state, then advance to the
    /// state `next` encodes to. Returns the applied change to `Q(s, a)`, which
    /// is always zero in random mode.
    pub fn update(
        &mut self,
        action: Action,
        reward: Reward,
        next: &RawObservation,
        world: &dyn CollisionQuery,
    ) -> Result<f64> {
        let next_state = self.encoder.encode(next, world);
        let delta = if self.learns() {
            let transition = Transition::new(self.episode.state(), action, reward, next_state);
            self.learner
                .update(self.table.as_mut(), &self.config.actions, &transition)?
        } else {
            0.0
        };

        self.episode.record(reward, next_state);
        self.total_steps += 1;
        #[allow(clippy::cast_precision_loss)]
        let states = self.table.len() as f64;
        metrics::gauge!("mephisto_table_states", states);
        Ok(delta)
    }

    /// End the current episode and start over from `start`.
    ///
    /// The value table is left as it is.
    pub fn reset(
        &mut self,
        start: &RawObservation,
        world: &dyn CollisionQuery,
        reason: Terminal,
    ) -> Result<EpisodeSummary> {
        let start_state = self.encoder.encode(start, world);
        if self.learns() {
            self.table.ensure(&start_state)?;
        }

        let summary = self.episode.restart(start_state, reason);
        info!(
            episode = %summary.id,
            score = summary.score,
            steps = summary.steps,
            reason = %summary.reason,
            "episode finished"
        );
        metrics::increment_counter!("mephisto_episodes_total");
        self.history.push(summary.clone());
        Ok(summary)
    }

    /// Current discretized state
    #[must_use]
    pub fn state(&self) -> State {
        self.episode.state()
    }

    /// Score accumulated in the current episode
    #[must_use]
    pub fn score(&self) -> f64 {
        self.episode.score()
    }

    /// Current episode
    #[must_use]
    pub fn episode(&self) -> &Episode {
        &self.episode
    }

    /// Finished episodes
    #[must_use]
    pub fn history(&self) -> &ScoreHistory {
        &self.history
    }

    /// The value table
    #[must_use]
    pub fn table(&self) -> &dyn ActionValueTable {
        self.table.as_ref()
    }

    /// Configuration the agent was built with
    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Configured actions
    #[must_use]
    pub fn actions(&self) -> &ActionSet {
        &self.config.actions
    }

    /// Copy of the value table
    #[must_use]
    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot::capture(self.table.as_ref(), self.config.mode, &self.config.actions)
    }

    /// Replace the value table with a snapshot's contents.
    ///
    /// Call between episodes only.
    pub fn restore(&mut self, snapshot: &TableSnapshot) -> Result<()> {
        let mut table = snapshot.restore(&self.config)?;
        if self.learns() {
            table.ensure(&self.episode.state())?;
        }
        self.table = table;
        Ok(())
    }

    /// Save the value table to `path`
    pub async fn save(&self, path: &Path) -> Result<()> {
        self.snapshot().save(path).await
    }

    /// Load the value table from `path`
    pub async fn load(&mut self, path: &Path) -> Result<()> {
        let snapshot = TableSnapshot::load(path).await?;
        self.restore(&snapshot)
    }
}

impl Agent for QAgent {
    fn act(&mut self) -> Result<Action> {
        self.select_action()
    }

    fn observe(
        &mut self,
        action: Action,
        reward: Reward,
        next: &RawObservation,
        world: &dyn CollisionQuery,
    ) -> Result<()> {
        self.update(action, reward, next, world).map(|_| ())
    }

    fn reset(
        &mut self,
        start: &RawObservation,
        world: &dyn CollisionQuery,
        reason: Terminal,
    ) -> Result<()> {
        QAgent::reset(self, start, world, reason).map(|_| ())
    }

    fn metrics(&self) -> AgentMetrics {
        AgentMetrics {
            total_steps: self.total_steps,
            total_episodes: self.history.len(),
            table_states: self.table.len(),
            avg_episode_score: self.history.mean().unwrap_or(0.0),
        }
    }
}
