//! Environment wrappers

use async_trait::async_trait;

use mephisto_rl_core::{
    Action, CollisionQuery, Environment, MapBounds, RawObservation, Step, Terminal,
};

/// Time limit wrapper.
///
/// Ends the episode with [`Terminal::TimeLimit`] once `max_steps` ticks pass
/// without the inner environment ending it. The inner environment is reset,
/// so the returned observation is the start observation like any other
/// terminal step.
pub struct TimeLimit<E> {
    /// Inner environment
    pub env: E,
    /// Maximum steps
    pub max_steps: usize,
    /// Current step count
    pub steps: usize,
}

impl<E> TimeLimit<E> {
    /// Create a new time limit wrapper
    pub fn new(env: E, max_steps: usize) -> Self {
        Self {
            env,
            max_steps,
            steps: 0,
        }
    }

    /// Unwrap the inner environment
    pub fn into_inner(self) -> E {
        self.env
    }
}

#[async_trait]
impl<E> Environment for TimeLimit<E>
where
    E: Environment,
{
    fn observation(&self) -> RawObservation {
        self.env.observation()
    }

    fn start_observation(&self) -> RawObservation {
        self.env.start_observation()
    }

    fn bounds(&self) -> MapBounds {
        self.env.bounds()
    }

    fn collisions(&self) -> &dyn CollisionQuery {
        self.env.collisions()
    }

    async fn reset(&mut self) -> mephisto_rl_core::Result<RawObservation> {
        self.steps = 0;
        self.env.reset().await
    }

    async fn step(&mut self, action: Action) -> mephisto_rl_core::Result<Step> {
        self.steps += 1;
        let mut step = self.env.step(action).await?;

        if step.is_terminal() {
            self.steps = 0;
        } else if self.steps >= self.max_steps {
            step.observation = self.env.reset().await?;
            step.terminal = Some(Terminal::TimeLimit);
            self.steps = 0;
        }

        Ok(step)
    }
}
