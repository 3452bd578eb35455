//! Core reinforcement learning types and traits for the Mephistophelia agent
//!
//! This crate provides the shared vocabulary between the tabular agent and
//! the platformer it is trained in: actions, discretized states, raw
//! observations, rewards, configuration and the host environment contract.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod agent;
pub mod environment;
pub mod error;
pub mod observation;
pub mod policy;
pub mod reward;
pub mod state;
pub mod trajectory;
pub mod value;

// Re-export core traits and types
pub use action::{Action, ActionSet, ControlInput};
pub use agent::{Agent, AgentConfig, AgentMetrics, DiscretizationMode, MapBounds};
pub use environment::{Environment, Step};
pub use error::{RLError, Result};
pub use observation::{CollisionQuery, ContactKind, NoCollisions, Point, RawObservation};
pub use policy::Policy;
pub use reward::{Reward, RewardEvent, RewardSchedule};
pub use state::{Probe, ProbeReading, RadarState, State, Terminal, PROBE_COUNT};
pub use trajectory::Transition;
pub use value::ActionValueTable;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Action, ActionSet, ActionValueTable, Agent, AgentConfig, CollisionQuery,
        DiscretizationMode, Environment, MapBounds, Policy, RawObservation, Result,
        Reward, State, Step, Terminal,
    };
}
