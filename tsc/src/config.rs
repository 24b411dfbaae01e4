//! Command line configuration of a training run.
use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    ops::RangeInclusive,
    path::PathBuf,
};
use tsc_core::{error::MarlError, TrainerConfig};
use tsc_env::{BlockStreetConfig, Level, SignalGridConfig};

/// Traffic scenario.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    /// All approaches serve vehicles.
    Regular,

    /// Random approaches are blocked in every episode.
    Block,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular => write!(f, "regular"),
            Self::Block => write!(f, "block"),
        }
    }
}

/// Options shared by the training binaries.
#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// Name of the model, used in output paths
    #[arg(long)]
    pub model_name: Option<String>,

    /// Traffic scenario
    #[arg(short, long, value_enum, default_value_t = Task::Block)]
    pub task: Task,

    /// Traffic demand: normal or hard
    #[arg(short, long, default_value_t = Level::Normal)]
    pub level: Level,

    /// Number of blocked approaches, ignored for the regular task
    #[arg(short, long, default_value_t = 8)]
    pub block_num: usize,

    /// Append a learned latent of the joint observation to each agent's
    /// input (true or false). Defaults to the model's own setting
    #[arg(short, long)]
    pub representation: Option<bool>,

    /// Checkpoint level, 0 disables checkpoints and result files
    #[arg(short, long, default_value_t = 0)]
    pub writer: usize,

    /// Simulated seconds per episode
    #[arg(long, default_value_t = 3600)]
    pub seconds: usize,

    /// Number of episodes per seed
    #[arg(short, long, default_value_t = 80)]
    pub episodes: usize,

    /// Seed, or first and last seed of an inclusive range
    #[arg(short, long, num_args = 1..=2, value_names = ["START", "END"], default_values_t = [42, 46])]
    pub seed: Vec<u64>,

    /// Rows of intersections
    #[arg(long, default_value_t = 3)]
    pub rows: usize,

    /// Columns of intersections
    #[arg(long, default_value_t = 3)]
    pub cols: usize,

    /// Directory under which `ckpt/` and `result/` are written
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model_name: None,
            task: Task::Block,
            level: Level::Normal,
            block_num: 8,
            representation: None,
            writer: 0,
            seconds: 3600,
            episodes: 80,
            seed: vec![42, 46],
            rows: 3,
            cols: 3,
            out_dir: PathBuf::from("."),
        }
    }
}

impl RunConfig {
    /// Name of the task, `{task}_{level}`.
    pub fn task_name(&self) -> String {
        format!("{}_{}", self.task, self.level)
    }

    /// Model name, falling back to `default` when none was given.
    pub fn model_name_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model_name.as_deref().unwrap_or(default)
    }

    /// Returns `true` if the latent representation is used.
    pub fn uses_representation(&self) -> bool {
        self.representation.unwrap_or(false)
    }

    /// Sets the representation toggle if it was not given.
    pub fn representation_or(mut self, default: bool) -> Self {
        self.representation.get_or_insert(default);
        self
    }

    /// Seeds of the runs.
    pub fn seeds(&self) -> Result<RangeInclusive<u64>> {
        let (start, end) = match self.seed.as_slice() {
            [seed] => (*seed, *seed),
            [start, end] => (*start, *end),
            seeds => {
                return Err(MarlError::Configuration(format!(
                    "expected one or two seeds, got {:?}",
                    seeds
                ))
                .into())
            }
        };
        if start > end {
            return Err(MarlError::Configuration(format!(
                "seed range {}..={} is empty",
                start, end
            ))
            .into());
        }
        Ok(start..=end)
    }

    /// Number of blocked approaches of the task.
    pub fn effective_block_num(&self) -> usize {
        match self.task {
            Task::Regular => 0,
            Task::Block => self.block_num,
        }
    }

    /// Configuration of the environment.
    pub fn env_config(&self) -> BlockStreetConfig {
        let grid = SignalGridConfig::default()
            .grid(self.rows, self.cols)
            .num_seconds(self.seconds)
            .level(self.level);
        BlockStreetConfig::default()
            .grid(grid)
            .block_num(self.effective_block_num())
    }

    /// Configuration of the training loop for one seed.
    pub fn trainer_config(&self, model: &str, seed: u64) -> TrainerConfig {
        TrainerConfig::default()
            .n_episodes(self.episodes)
            .seed(seed)
            .model_dir(self.model_dir(model, seed).to_string_lossy())
            .checkpoint_level(self.writer)
    }

    /// Checkpoint directory of a seed, `ckpt/{task}/{model}/seed_{seed}`.
    pub fn model_dir(&self, model: &str, seed: u64) -> PathBuf {
        self.out_dir
            .join("ckpt")
            .join(self.task_name())
            .join(model)
            .join(format!("seed_{}", seed))
    }

    /// File of the episode returns, `result/{task}/{model}.csv`.
    pub fn result_path(&self, model: &str) -> PathBuf {
        self.out_dir
            .join("result")
            .join(self.task_name())
            .join(format!("{}.csv", model))
    }

    /// Line logged when a run starts.
    pub fn banner(&self, model: &str) -> String {
        format!(
            "[ Start >>> task: {} - {} | model: {} | repre: {} ]",
            self.task_name(),
            self.effective_block_num(),
            model,
            self.uses_representation()
        )
    }

    /// Returns `true` if results are written to disk.
    pub fn writes(&self) -> bool {
        self.writer > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        run: RunConfig,
    }

    #[test]
    fn test_defaults_match_cli() {
        let cli = Cli::parse_from(["run"]);
        assert_eq!(cli.run, RunConfig::default());
    }

    #[test]
    fn test_parse_args() {
        let cli = Cli::parse_from([
            "run",
            "-t",
            "regular",
            "-l",
            "hard",
            "-b",
            "4",
            "-w",
            "1",
            "-s",
            "1",
            "3",
        ]);
        let config = cli.run;
        assert_eq!(config.task_name(), "regular_hard");
        assert_eq!(config.effective_block_num(), 0);
        assert_eq!(config.env_config().block_num, 0);
        assert_eq!(config.seeds().ok(), Some(1..=3));
        assert!(config.writes());
        assert_eq!(config.representation, None);
    }

    #[test]
    fn test_single_seed() {
        let cli = Cli::parse_from(["run", "--seed", "7", "-r", "true"]);
        assert_eq!(cli.run.seeds().ok(), Some(7..=7));
        assert_eq!(cli.run.representation, Some(true));
    }

    #[test]
    fn test_representation_default_applies_when_unset() {
        let config = RunConfig::default();
        assert!(!config.uses_representation());
        assert!(config.clone().representation_or(true).uses_representation());

        let off = RunConfig {
            representation: Some(false),
            ..RunConfig::default()
        };
        assert!(!off.representation_or(true).uses_representation());
    }

    #[test]
    fn test_invalid_level_rejected() {
        assert!(Cli::try_parse_from(["run", "--level", "easy"]).is_err());
    }

    #[test]
    fn test_empty_seed_range_rejected() {
        let config = RunConfig {
            seed: vec![5, 4],
            ..RunConfig::default()
        };
        assert!(config.seeds().is_err());
    }

    #[test]
    fn test_paths() {
        let config = RunConfig::default();
        assert_eq!(
            config.model_dir("IDQN", 42),
            PathBuf::from("./ckpt/block_normal/IDQN/seed_42")
        );
        assert_eq!(
            config.result_path("Ours"),
            PathBuf::from("./result/block_normal/Ours.csv")
        );
        assert_eq!(
            config.banner("Ours"),
            "[ Start >>> task: block_normal - 8 | model: Ours | repre: false ]"
        );
    }
}
