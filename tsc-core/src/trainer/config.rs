//! Configuration of [`Trainer`](super::Trainer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// Number of episodes of the run.
    pub n_episodes: usize,

    /// Ends an episode after this many steps even if the environment does not.
    pub max_steps_per_episode: Option<usize>,

    /// Interval of optimization steps in environment steps, for learners
    /// updated at every step.
    pub opt_interval: usize,

    /// Seed of the run, written with episode records.
    pub seed: u64,

    /// Where to save the parameters of the learners.
    pub model_dir: Option<String>,

    /// 0: never save parameters, 1: save the best and final parameters.
    pub checkpoint_level: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            n_episodes: 1,
            max_steps_per_episode: None,
            opt_interval: 1,
            seed: 42,
            model_dir: None,
            checkpoint_level: 0,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of episodes.
    pub fn n_episodes(mut self, v: usize) -> Self {
        self.n_episodes = v;
        self
    }

    /// Sets the maximum number of steps per episode.
    pub fn max_steps_per_episode(mut self, v: usize) -> Self {
        self.max_steps_per_episode = Some(v);
        self
    }

    /// Sets the interval of optimization in environment steps.
    pub fn opt_interval(mut self, v: usize) -> Self {
        self.opt_interval = v;
        self
    }

    /// Sets the seed of the run.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the directory where parameters are saved.
    pub fn model_dir(mut self, v: impl Into<String>) -> Self {
        self.model_dir = Some(v.into());
        self
    }

    /// Sets the checkpoint level.
    pub fn checkpoint_level(mut self, v: usize) -> Self {
        self.checkpoint_level = v;
        self
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_trainer_config() -> Result<()> {
        let config = TrainerConfig::default()
            .n_episodes(80)
            .max_steps_per_episode(720)
            .opt_interval(2)
            .seed(46)
            .model_dir("ckpt/block_normal/IDQN")
            .checkpoint_level(1);

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer_config.yaml");
        config.save(&path)?;
        let config_ = TrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
