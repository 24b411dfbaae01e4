//! Configuration of [`ExperienceStore`](super::ExperienceStore).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`ExperienceStore`](super::ExperienceStore).
///
/// The values are fixed once the store is built.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ExperienceStoreConfig {
    /// Maximum number of transitions. When the store is full, new transitions
    /// replace the oldest ones.
    pub capacity: usize,

    /// Number of stored transitions required before sampling is permitted.
    pub minimal_fill: usize,

    /// Random seed used for sampling transitions.
    pub seed: u64,
}

impl Default for ExperienceStoreConfig {
    fn default() -> Self {
        Self {
            capacity: 10000,
            minimal_fill: 1000,
            seed: 42,
        }
    }
}

impl ExperienceStoreConfig {
    /// Sets the capacity of the store.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the minimal fill.
    pub fn minimal_fill(mut self, minimal_fill: usize) -> Self {
        self.minimal_fill = minimal_fill;
        self
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
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
    fn test_serde_experience_store_config() -> Result<()> {
        let config = ExperienceStoreConfig::default()
            .capacity(5)
            .minimal_fill(3)
            .seed(7);

        let dir = TempDir::new("experience_store_config")?;
        let path = dir.path().join("experience_store_config.yaml");
        config.save(&path)?;
        let config_ = ExperienceStoreConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
