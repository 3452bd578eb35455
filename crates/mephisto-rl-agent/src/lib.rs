//! Tabular Q-learning agent for the Mephistophelia platformer
//!
//! This crate provides the learning side of the agent:
//! - State encoding (pixel, tiled, radar)
//! - Dense and lazily grown action-value tables
//! - One-step Q-learning updates with greedy or uniform-random action selection
//! - Episode bookkeeping and table snapshots

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod encoder;
pub mod episode;
pub mod learner;
pub mod persistence;
pub mod policy;
pub mod q_agent;
pub mod random;
pub mod table;

// Re-export the agent
pub use q_agent::QAgent;

// Re-export building blocks
pub use encoder::{encode_pixel, encode_radar, encode_tiled, StateEncoder};
pub use episode::{Episode, EpisodeSummary, ScoreHistory};
pub use learner::QLearner;
pub use persistence::{TableSnapshot, SNAPSHOT_VERSION};
pub use policy::GreedyPolicy;
pub use random::RandomPolicy;
pub use table::{build_table, DenseTable, Grid, LazyTable};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{EpisodeSummary, QAgent, ScoreHistory, TableSnapshot};
    pub use mephisto_rl_core::prelude::*;
}
