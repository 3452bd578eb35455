//! One-step Q-learning update

use tracing::debug;

use mephisto_rl_core::{ActionSet, ActionValueTable, AgentConfig, Result, Transition};

/// Off-policy temporal-difference control without eligibility traces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QLearner {
    learning_rate: f64,
    discount_factor: f64,
}

impl QLearner {
    /// Create a learner; the coefficients are assumed validated
    #[must_use]
    pub fn new(learning_rate: f64, discount_factor: f64) -> Self {
        Self {
            learning_rate,
            discount_factor,
        }
    }

    /// Learner with the configured coefficients
    #[must_use]
    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.learning_rate, config.discount_factor)
    }

    /// Learning rate α
    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Discount factor γ
    #[must_use]
    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    /// Apply `Q(s,a) += α (r + γ max_a' Q(s',a') - Q(s,a))` for the action
    /// actually taken, and return the applied delta.
    pub fn update(
        &self,
        table: &mut dyn ActionValueTable,
        actions: &ActionSet,
        transition: &Transition,
    ) -> Result<f64> {
        let action = actions.require_index(transition.action)?;
        table.ensure(&transition.next_state)?;
        table.ensure(&transition.state)?;

        let max_next = table.max_value(&transition.next_state)?;
        let old = table.value(&transition.state, action)?;
        let delta = self.learning_rate
            * (transition.reward.value() + self.discount_factor * max_next - old);
        table.row_mut(&transition.state)?[action] += delta;

        debug!(
            state = %transition.state,
            action = %transition.action,
            reward = transition.reward.value(),
            delta,
            "td update"
        );
        metrics::increment_counter!("mephisto_td_updates_total");
        Ok(delta)
    }
}
