//! Platformer environment and training loop for the Mephistophelia agent
//!
//! This crate provides the simulation side of training:
//! - ASCII tile maps with collision queries
//! - A headless kinematic platformer with jump, dash and warps
//! - Episode wrappers
//! - The async loop driving a `QAgent` tick by tick

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod platformer;
#[cfg(feature = "visualization")]
pub mod report;
pub mod runner;
pub mod tilemap;
pub mod wrappers;

// Re-export environments
pub use platformer::{EnvConfig, PlatformerEnv};
pub use runner::{TrainingConfig, TrainingLoop};
pub use tilemap::{Aabb, TileMap, DEFAULT_LEVEL};
pub use wrappers::TimeLimit;

// Re-export core types
pub use mephisto_rl_core::{Action, Environment, RawObservation, Reward, Step, Terminal};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{PlatformerEnv, TileMap, TimeLimit, TrainingConfig, TrainingLoop};
    pub use mephisto_rl_agent::prelude::*;
}
