//! Configuration of [`SignalGridEnv`](super::SignalGridEnv).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::File,
    io::{BufReader, Write},
    path::Path,
    str::FromStr,
};
use tsc_core::error::MarlError;

/// Traffic demand.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Moderate demand.
    Normal,

    /// Heavy demand.
    Hard,
}

impl Level {
    /// Probability that a vehicle enters the grid per boundary approach per second.
    pub fn arrival_rate(&self) -> f32 {
        match self {
            Self::Normal => 0.08,
            Self::Hard => 0.15,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Level {
    type Err = MarlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "hard" => Ok(Self::Hard),
            _ => Err(MarlError::Configuration(format!(
                "unknown level {:?}, expected normal or hard",
                s
            ))),
        }
    }
}

/// Configuration of [`SignalGridEnv`](super::SignalGridEnv).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct SignalGridConfig {
    /// Number of rows of intersections.
    pub rows: usize,

    /// Number of columns of intersections.
    pub cols: usize,

    /// Simulated seconds per episode.
    pub num_seconds: usize,

    /// Simulated seconds per decision.
    pub delta_time: usize,

    /// Seconds a phase is kept before it can be switched.
    pub min_green: usize,

    /// Queue length at which the density feature saturates.
    pub max_queue: usize,

    /// Mean waiting seconds at which the waiting feature saturates.
    pub wait_norm: f32,

    /// Traffic demand.
    pub level: Level,
}

impl Default for SignalGridConfig {
    fn default() -> Self {
        Self {
            rows: 3,
            cols: 3,
            num_seconds: 3600,
            delta_time: 5,
            min_green: 5,
            max_queue: 20,
            wait_norm: 60.0,
            level: Level::Normal,
        }
    }
}

impl SignalGridConfig {
    /// Sets the size of the grid.
    pub fn grid(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    /// Sets the simulated seconds per episode.
    pub fn num_seconds(mut self, v: usize) -> Self {
        self.num_seconds = v;
        self
    }

    /// Sets the simulated seconds per decision.
    pub fn delta_time(mut self, v: usize) -> Self {
        self.delta_time = v;
        self
    }

    /// Sets the minimum green time.
    pub fn min_green(mut self, v: usize) -> Self {
        self.min_green = v;
        self
    }

    /// Sets the queue length at which the density feature saturates.
    pub fn max_queue(mut self, v: usize) -> Self {
        self.max_queue = v;
        self
    }

    /// Sets the traffic demand.
    pub fn level(mut self, v: Level) -> Self {
        self.level = v;
        self
    }

    /// Number of decisions per episode.
    pub fn steps_per_episode(&self) -> usize {
        (self.num_seconds + self.delta_time.max(1) - 1) / self.delta_time.max(1)
    }

    /// Constructs [`SignalGridConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`SignalGridConfig`].
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
    fn test_level_from_str() {
        assert_eq!("normal".parse::<Level>(), Ok(Level::Normal));
        assert_eq!("hard".parse::<Level>(), Ok(Level::Hard));
        assert!("easy".parse::<Level>().is_err());
        assert_eq!(Level::Hard.to_string(), "hard");
    }

    #[test]
    fn test_steps_per_episode() {
        let config = SignalGridConfig::default().num_seconds(3600).delta_time(5);
        assert_eq!(config.steps_per_episode(), 720);
        let config = config.num_seconds(12);
        assert_eq!(config.steps_per_episode(), 3);
    }

    #[test]
    fn test_serde_signal_grid_config() -> Result<()> {
        let config = SignalGridConfig::default()
            .grid(2, 4)
            .level(Level::Hard)
            .num_seconds(600);
        let dir = TempDir::new("signal_grid_config")?;
        let path = dir.path().join("env.yaml");
        config.save(&path)?;
        assert_eq!(SignalGridConfig::load(&path)?, config);
        Ok(())
    }
}
