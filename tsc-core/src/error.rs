//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum MarlError {
    /// Inconsistent configuration detected before training starts.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The dimensionality of a learner does not match its agent.
    #[error("Dimension mismatch for agent {agent}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Agent whose learner was rejected.
        agent: String,
        /// Dimension given by the environment.
        expected: usize,
        /// Dimension of the learner.
        actual: usize,
    },

    /// Sampling was requested before the experience store was filled enough.
    #[error(
        "Insufficient data: {len} transitions stored, minimal fill {minimal_fill}, batch size {batch_size}"
    )]
    InsufficientData {
        /// Number of stored transitions.
        len: usize,
        /// Minimal fill of the store.
        minimal_fill: usize,
        /// Requested batch size.
        batch_size: usize,
    },

    /// An agent identifier was not found.
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    /// The environment failed during an episode.
    #[error("Environment error: {0}")]
    Environment(String),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}
