//! Reward signals and the per-tick reward schedule

use serde::{Deserialize, Serialize};

/// Reward signal from the environment
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Reward(pub f64);

impl Reward {
    /// Create a new reward
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the reward value
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Reward {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<Reward> for f64 {
    fn from(reward: Reward) -> Self {
        reward.0
    }
}

impl std::ops::Add for Reward {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self(self.0 + other.0)
    }
}

impl std::ops::AddAssign for Reward {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl std::iter::Sum for Reward {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, r| acc + r)
    }
}

/// Something that happened during a tick and carries a reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardEvent {
    /// One tick elapsed
    Step,
    /// The player died or left the map
    Death,
    /// The player reached the goal
    Goal,
}

/// Reward values for each event kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardSchedule {
    /// Per-tick penalty
    pub step: f64,
    /// Death penalty
    pub death: f64,
    /// Goal bonus
    pub goal: f64,
}

impl Default for RewardSchedule {
    fn default() -> Self {
        Self {
            step: -1.0,
            death: -1000.0,
            goal: 1000.0,
        }
    }
}

impl RewardSchedule {
    /// Reward for a single event
    #[must_use]
    pub fn reward(&self, event: RewardEvent) -> Reward {
        Reward(match event {
            RewardEvent::Step => self.step,
            RewardEvent::Death => self.death,
            RewardEvent::Goal => self.goal,
        })
    }

    /// Sum of every event triggered during one tick.
    ///
    /// Simultaneous events add up; none takes priority over another.
    #[must_use]
    pub fn total(&self, events: &[RewardEvent]) -> Reward {
        events.iter().map(|event| self.reward(*event)).sum()
    }
}
