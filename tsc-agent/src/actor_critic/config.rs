//! Configuration of actor-critic learner.
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Constructs [`ActorCritic`](super::ActorCritic).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ActorCriticConfig {
    pub(super) obs_dim: usize,
    pub(super) n_actions: usize,
    pub(super) actor_lr: f32,
    pub(super) critic_lr: f32,
    pub(super) discount_factor: f32,
    pub(super) lambda: f32,
    pub(super) epochs: usize,
    pub(super) clip_eps: f32,
}

impl Default for ActorCriticConfig {
    fn default() -> Self {
        Self {
            obs_dim: 0,
            n_actions: 0,
            actor_lr: 1e-4,
            critic_lr: 1e-3,
            discount_factor: 0.99,
            lambda: 0.95,
            epochs: 10,
            clip_eps: 0.2,
        }
    }
}

impl ActorCriticConfig {
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

    /// Learning rate of the policy.
    pub fn actor_lr(mut self, v: f32) -> Self {
        self.actor_lr = v;
        self
    }

    /// Learning rate of the value function.
    pub fn critic_lr(mut self, v: f32) -> Self {
        self.critic_lr = v;
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f32) -> Self {
        self.discount_factor = v;
        self
    }

    /// Trace decay of generalized advantage estimation.
    pub fn lambda(mut self, v: f32) -> Self {
        self.lambda = v;
        self
    }

    /// Number of passes over the rollout per update.
    pub fn epochs(mut self, v: usize) -> Self {
        self.epochs = v;
        self
    }

    /// Clipping range of the probability ratio.
    pub fn clip_eps(mut self, v: f32) -> Self {
        self.clip_eps = v;
        self
    }

    /// Loads [`ActorCriticConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of actor-critic learner from {:?}", path_);
        Ok(b)
    }

    /// Saves [`ActorCriticConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of actor-critic learner into {:?}", path_);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_actor_critic_config() -> Result<()> {
        let config = ActorCriticConfig::default()
            .obs_dim(21)
            .n_actions(2)
            .epochs(3)
            .clip_eps(0.1);
        let dir = TempDir::new("actor_critic_config")?;
        let path = dir.path().join("actor_critic.yaml");
        config.save(&path)?;
        assert_eq!(ActorCriticConfig::load(&path)?, config);
        Ok(())
    }
}
