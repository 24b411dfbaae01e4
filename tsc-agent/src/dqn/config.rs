//! Configuration of DQN learner.
use super::explorer::{DqnExplorer, EpsilonGreedy};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Constructs [`Dqn`](super::Dqn).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig {
    pub(super) obs_dim: usize,
    pub(super) n_actions: usize,
    pub(super) lr: f32,
    pub(super) discount_factor: f32,
    pub(super) target_update_interval: usize,
    pub(super) batch_size: usize,
    pub(super) explorer: DqnExplorer,
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            obs_dim: 0,
            n_actions: 0,
            lr: 1e-3,
            discount_factor: 0.98,
            target_update_interval: 5,
            batch_size: 20,
            explorer: DqnExplorer::EpsilonGreedy(EpsilonGreedy::new()),
        }
    }
}

impl DqnConfig {
    /// Sets the observation dimension.
    pub fn obs_dim(mut self, v: usize) -> Self {
        self.obs_dim = v;
        self
    }

    /// Sets the number of actions.
    pub fn n_actions(mut self, v: usize) -> Self {
        self.n_actions = v;
        self
    }

    /// Learning rate.
    pub fn lr(mut self, v: f32) -> Self {
        self.lr = v;
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f32) -> Self {
        self.discount_factor = v;
        self
    }

    /// Number of update calls between copies of the Q-model to the target.
    pub fn target_update_interval(mut self, v: usize) -> Self {
        self.target_update_interval = v;
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Explorer.
    pub fn explorer(mut self, v: DqnExplorer) -> Self {
        self.explorer = v;
        self
    }

    /// Loads [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of DQN learner from {:?}", path_);
        Ok(b)
    }

    /// Saves [`DqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of DQN learner into {:?}", path_);
        Ok(())
    }
}
