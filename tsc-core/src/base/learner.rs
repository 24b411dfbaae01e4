//! Learner.
use super::{Act, AgentId, AgentTransition, Obs};
use crate::{record::Record, ExperienceStore};
use anyhow::Result;
use std::path::Path;

/// When a learner updates its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateSchedule {
    /// Update after environment steps with batches sampled from the shared
    /// [`ExperienceStore`].
    EveryStep,

    /// Update once at the end of each episode from a private rollout.
    EndOfEpisode,
}

/// Represents the trainable policy of a single agent.
///
/// A learner owns its function approximators, optimizer state and counters.
/// It never reads or writes the state of another agent's learner, so the
/// order in which learners act or update within a step has no effect.
pub trait Learner {
    /// The agent controlled by this learner.
    fn id(&self) -> &AgentId;

    /// Length of the observation the learner accepts.
    fn obs_dim(&self) -> usize;

    /// Number of discrete actions.
    fn n_actions(&self) -> usize;

    /// Returns when the trainer should call [`Learner::update`].
    fn update_schedule(&self) -> UpdateSchedule;

    /// Samples an action given the agent's observation.
    ///
    /// In training mode, the action follows the exploration policy.
    fn act(&mut self, obs: &Obs) -> Act;

    /// Receives this agent's slice of a joint transition.
    ///
    /// Rollout-based learners append it to their trajectory.
    fn observe(&mut self, tr: &AgentTransition);

    /// Performs an update of the parameters.
    ///
    /// Replay-based learners sample from `store`. Returns `None` when
    /// there was nothing to learn from.
    fn update(&mut self, store: &mut ExperienceStore) -> Result<Option<Record>>;

    /// Set the learner to training mode.
    fn train(&mut self);

    /// Set the learner to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Save the parameters of the learner in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the learner from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
