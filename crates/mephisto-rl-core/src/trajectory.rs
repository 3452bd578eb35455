//! Completed transitions handed to the learner

use serde::{Deserialize, Serialize};

use crate::{Action, Reward, State};

/// Single transition: `state --action--> next_state` earning `reward`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// State the action was taken in
    pub state: State,
    /// Action actually taken
    pub action: Action,
    /// Reward summed over the tick
    pub reward: Reward,
    /// State observed after the tick
    pub next_state: State,
}

impl Transition {
    /// Create a new transition
    #[must_use]
    pub fn new(state: State, action: Action, reward: Reward, next_state: State) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
        }
    }
}
