//! Learned latent representation of the joint observation.
use super::JointObs;
use crate::record::Record;
use anyhow::Result;
use ndarray::Array1;
use std::path::Path;

/// A representation shared by all agents, computed from the joint observation.
///
/// When the trainer is given a representation, the latent vector is appended
/// to every agent's observation before it reaches the learner.
pub trait Representation {
    /// Length of the latent vector.
    fn latent_dim(&self) -> usize;

    /// Encodes the joint observation.
    fn encode(&self, obs: &JointObs) -> Array1<f32>;

    /// Keeps a joint observation for the next update.
    fn observe(&mut self, obs: &JointObs);

    /// Updates the representation with the kept observations, then drops them.
    fn update(&mut self) -> Result<Option<Record>>;

    /// Saves the parameters in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Loads the parameters from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
