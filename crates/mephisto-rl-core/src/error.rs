//! Error types for the RL core library

use thiserror::Error;

/// Core error type for RL operations
#[derive(Error, Debug)]
pub enum RLError {
    /// A state was looked up that the eager table never enumerated.
    ///
    /// This means an observation fell outside the declared map bounds and is
    /// a misconfiguration on the host side, not something to recover from.
    #[error("State out of bounds: {state} not within {bounds}")]
    StateOutOfBounds {
        /// Key of the offending state
        state: String,
        /// Bounds the table was built for
        bounds: String,
    },

    /// Degenerate agent configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Invalid action
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Invalid state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Environment-related errors
    #[error("Environment error: {0}")]
    Environment(String),

    /// Value table snapshot does not fit the agent it is loaded into
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for RL operations
pub type Result<T> = std::result::Result<T, RLError>;
