//! The host environment contract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Action, CollisionQuery, MapBounds, RawObservation, Reward, RewardEvent, Terminal};

/// Result of a single environment tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Observation after the tick. After a terminal event this is already
    /// the fresh start observation.
    pub observation: RawObservation,
    /// Sum of every reward triggered during the tick
    pub reward: Reward,
    /// Events that produced the reward
    pub events: Vec<RewardEvent>,
    /// Set when the tick ended the episode
    pub terminal: Option<Terminal>,
}

impl Step {
    /// Whether the episode ended on this tick
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }
}

/// Simulation the agent is trained in
#[async_trait]
pub trait Environment: Send + Sync {
    /// Current observation of the player
    fn observation(&self) -> RawObservation;

    /// Observation of the player standing at the start position
    fn start_observation(&self) -> RawObservation;

    /// Map extents in pixels
    fn bounds(&self) -> MapBounds;

    /// Collision queries against the current layout
    fn collisions(&self) -> &dyn CollisionQuery;

    /// Put the player back at the start
    async fn reset(&mut self) -> crate::Result<RawObservation>;

    /// Execute one action for one tick
    async fn step(&mut self, action: Action) -> crate::Result<Step>;
}
