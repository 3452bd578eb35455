//! Greedy action selection against the value table

use mephisto_rl_core::{Action, ActionSet, ActionValueTable, Policy, RLError, Result, State};

/// Always picks the highest-valued action, never explores.
///
/// Ties go to the action listed first in the [`ActionSet`], so repeated calls
/// on an unchanged table always return the same action. When several states
/// tie this can lock the agent into a cycle; that is accepted behaviour.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyPolicy;

impl GreedyPolicy {
    /// Create a greedy policy
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Policy for GreedyPolicy {
    fn select(
        &mut self,
        state: &State,
        table: &dyn ActionValueTable,
        actions: &ActionSet,
    ) -> Result<Action> {
        let best = table.best_action(state)?;
        actions.get(best).ok_or_else(|| {
            RLError::InvalidAction(format!(
                "table row has {} actions, action set has {}",
                table.num_actions(),
                actions.len()
            ))
        })
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}
