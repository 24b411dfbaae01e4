//! Identifiers and joint containers shared by environments and learners.
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Identifier of a controllable entity, e.g., an intersection.
///
/// The identifier is stable across episodes and runs for a fixed environment
/// configuration. Joint containers are keyed by [`AgentId`] in a [`BTreeMap`],
/// so iterating over agents always follows the same order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(String);

impl AgentId {
    /// Constructs an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AgentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Observation of a single agent.
pub type Obs = Array1<f32>;

/// Discrete action of a single agent.
pub type Act = usize;

/// Observations of all agents at a timestep.
pub type JointObs = BTreeMap<AgentId, Obs>;

/// Actions of all agents, submitted to the environment at once.
pub type JointAct = BTreeMap<AgentId, Act>;

/// Rewards of all agents at a timestep.
pub type JointReward = BTreeMap<AgentId, f32>;

/// Per-agent flags such as termination or truncation.
pub type JointFlag = BTreeMap<AgentId, bool>;

/// Observation and action dimensions of an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Length of the observation vector.
    pub obs_dim: usize,

    /// Number of discrete actions.
    pub n_actions: usize,
}

impl AgentSpec {
    /// Constructs a spec.
    pub fn new(obs_dim: usize, n_actions: usize) -> Self {
        Self { obs_dim, n_actions }
    }

    /// Returns a spec whose observation is extended with `extra` features.
    pub fn augmented(&self, extra: usize) -> Self {
        Self {
            obs_dim: self.obs_dim + extra,
            n_actions: self.n_actions,
        }
    }
}
