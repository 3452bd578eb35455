//! Agent configuration and the agent trait the training loop drives

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::{
    Action, ActionSet, CollisionQuery, RLError, RawObservation, Reward, RewardSchedule, Terminal,
};

fn default_tile_size() -> i64 {
    64
}

fn default_probe_distance() -> f64 {
    64.0
}

/// Strategy used to reduce observations to a finite state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DiscretizationMode {
    /// Uniform-random baseline; tracks pixel positions but never learns
    Random,
    /// Exact integer pixel positions
    Pixel,
    /// Positions snapped to a square tile grid
    Tiled {
        /// Tile edge length in pixels
        #[serde(default = "default_tile_size")]
        tile_size: i64,
    },
    /// Seven-probe radar readings, table grown lazily
    Radar {
        /// Distance from the player centre to each probe, per axis
        #[serde(default = "default_probe_distance")]
        probe_distance: f64,
    },
}

impl DiscretizationMode {
    /// Whether the value table is enumerated up front
    #[must_use]
    pub fn is_eager(&self) -> bool {
        matches!(self, Self::Pixel | Self::Tiled { .. })
    }

    /// Short lowercase name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Pixel => "pixel",
            Self::Tiled { .. } => "tiled",
            Self::Radar { .. } => "radar",
        }
    }
}

impl Default for DiscretizationMode {
    fn default() -> Self {
        Self::Tiled {
            tile_size: default_tile_size(),
        }
    }
}

impl fmt::Display for DiscretizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive upper corner of the map in pixels; the lower corner is the origin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapBounds {
    /// Largest horizontal pixel
    pub x: i64,
    /// Largest vertical pixel
    pub y: i64,
}

impl MapBounds {
    /// Create new bounds
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Whether a pixel lies inside the map
    #[must_use]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        (0..=self.x).contains(&x) && (0..=self.y).contains(&y)
    }
}

impl fmt::Display for MapBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0..={}]x[0..={}]", self.x, self.y)
    }
}

/// Configuration for the Q-learning agent, immutable for its lifetime
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Discretization mode
    pub mode: DiscretizationMode,
    /// Learning rate α
    pub learning_rate: f64,
    /// Discount factor γ
    pub discount_factor: f64,
    /// Map bounds, required by the eager modes
    pub bounds: MapBounds,
    /// Ordered action set
    pub actions: ActionSet,
    /// Reward values the host applies per event
    pub rewards: RewardSchedule,
    /// Seed for the agent's random number generator
    pub seed: Option<u64>,
    /// Where the value table is loaded from and saved to
    pub table_path: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            mode: DiscretizationMode::default(),
            learning_rate: 0.5,
            discount_factor: 0.5,
            bounds: MapBounds::default(),
            actions: ActionSet::default(),
            rewards: RewardSchedule::default(),
            seed: None,
            table_path: None,
        }
    }
}

impl AgentConfig {
    /// Reject degenerate configurations
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |msg: String| Err(RLError::InvalidConfiguration(msg));

        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return invalid(format!(
                "learning rate must be in (0, 1], got {}",
                self.learning_rate
            ));
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return invalid(format!(
                "discount factor must be in [0, 1], got {}",
                self.discount_factor
            ));
        }
        if self.actions.is_empty() {
            return invalid("action set must not be empty".to_string());
        }
        if self.mode.is_eager() && (self.bounds.x < 0 || self.bounds.y < 0) {
            return invalid(format!("map bounds must be non-negative, got {}", self.bounds));
        }
        match self.mode {
            DiscretizationMode::Tiled { tile_size } if tile_size <= 0 => {
                invalid(format!("tile size must be positive, got {tile_size}"))
            }
            DiscretizationMode::Radar { probe_distance }
                if !(probe_distance.is_finite() && probe_distance > 0.0) =>
            {
                invalid(format!("probe distance must be positive, got {probe_distance}"))
            }
            _ => Ok(()),
        }
    }

    /// Read and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::debug!(
            path = %path.as_ref().display(),
            mode = %config.mode,
            "loaded agent configuration"
        );
        Ok(config)
    }
}

/// Agent metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentMetrics {
    /// Total steps taken
    pub total_steps: usize,
    /// Total episodes finished
    pub total_episodes: usize,
    /// Number of states with a row in the value table
    pub table_states: usize,
    /// Average terminal score over finished episodes
    pub avg_episode_score: f64,
}

/// A tick-driven agent: select, then learn from the outcome.
///
/// The host calls `act` and `observe` exactly once per simulation tick, in
/// that order, and `reset` whenever an episode ends.
pub trait Agent {
    /// Select the action for the current state
    fn act(&mut self) -> crate::Result<Action>;

    /// Learn from the outcome of `action`
    fn observe(
        &mut self,
        action: Action,
        reward: Reward,
        next: &RawObservation,
        world: &dyn CollisionQuery,
    ) -> crate::Result<()>;

    /// Start a new episode from the host's start observation
    fn reset(
        &mut self,
        start: &RawObservation,
        world: &dyn CollisionQuery,
        reason: Terminal,
    ) -> crate::Result<()>;

    /// Get agent metrics
    fn metrics(&self) -> AgentMetrics {
        AgentMetrics::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(alpha: f64, gamma: f64) -> AgentConfig {
        AgentConfig {
            learning_rate: alpha,
            discount_factor: gamma,
            bounds: MapBounds::new(128, 128),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_is_valid() {
        assert!(config(0.5, 0.5).validate().is_ok());
        assert!(config(1.0, 0.0).validate().is_ok());
        assert!(config(1.0, 1.0).validate().is_ok());
    }

    #[test]
    fn test_degenerate_rates_rejected() {
        let rates = [
            (0.0, 0.5),
            (-0.1, 0.5),
            (1.5, 0.5),
            (0.5, -0.01),
            (0.5, 1.01),
            (f64::NAN, 0.5),
        ];
        for (alpha, gamma) in rates {
            let err = config(alpha, gamma).validate().unwrap_err();
            assert!(matches!(err, RLError::InvalidConfiguration(_)), "{alpha} {gamma}");
        }
    }

    #[test]
    fn test_bad_mode_parameters_rejected() {
        let mut cfg = config(0.5, 0.5);
        cfg.mode = DiscretizationMode::Tiled { tile_size: 0 };
        assert!(cfg.validate().is_err());
        cfg.mode = DiscretizationMode::Radar { probe_distance: -1.0 };
        assert!(cfg.validate().is_err());
        cfg.mode = DiscretizationMode::Pixel;
        cfg.bounds = MapBounds::new(-1, 10);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_json_config() {
        let json = r#"{
            "mode": { "kind": "radar" },
            "learning_rate": 0.1,
            "discount_factor": 0.9,
            "actions": ["LEFT", "RIGHT", "JUMP"]
        }"#;
        let cfg: AgentConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.mode, DiscretizationMode::Radar { probe_distance: 64.0 });
        assert_eq!(cfg.actions.len(), 3);
        assert_eq!(cfg.rewards, RewardSchedule::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = MapBounds::new(10, 5);
        assert!(bounds.contains(0, 0));
        assert!(bounds.contains(10, 5));
        assert!(!bounds.contains(11, 5));
        assert!(!bounds.contains(3, -1));
    }
}
