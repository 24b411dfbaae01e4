//! Environment.
use super::{AgentId, AgentSpec, Info, JointAct, JointObs, Step};
use crate::record::Record;
use anyhow::Result;
use std::collections::BTreeMap;

/// Represents a multi-agent environment stepped with a joint action.
///
/// All agents share the same timestep: [`Env::step`] consumes one action per
/// agent and returns one observation, reward and pair of done flags per agent.
/// Failures of the underlying simulator are returned as errors and abort the
/// training run; partial episodes are not recovered.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Information in the [`Step`] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Returns the observation and action dimensions of every agent.
    fn agent_specs(&self) -> BTreeMap<AgentId, AgentSpec>;

    /// Returns the identifiers of the agents in a stable order.
    fn agent_ids(&self) -> Vec<AgentId> {
        self.agent_specs().into_keys().collect()
    }

    /// Starts a new episode and returns the initial observations.
    fn reset(&mut self) -> Result<JointObs>;

    /// Performes an environment step with the joint action.
    fn step(&mut self, act: &JointAct) -> Result<(Step<Self>, Record)>
    where
        Self: Sized;
}
