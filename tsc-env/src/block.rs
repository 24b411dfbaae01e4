//! Random street blocking.
use super::{
    base::{Blockage, SignalGridEnv, N_APPROACHES},
    config::SignalGridConfig,
};
use anyhow::Result;
use log::debug;
use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use tsc_core::{
    error::MarlError,
    record::{Record, RecordValue},
    util::derive_seed,
    AgentId, AgentSpec, Env, JointAct, JointObs, Step,
};

/// Configuration of [`BlockStreet`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct BlockStreetConfig {
    /// Configuration of the wrapped environment.
    pub grid: SignalGridConfig,

    /// Number of approaches blocked in each episode.
    pub block_num: usize,
}

impl Default for BlockStreetConfig {
    fn default() -> Self {
        Self {
            grid: SignalGridConfig::default(),
            block_num: 8,
        }
    }
}

impl BlockStreetConfig {
    /// Sets the configuration of the wrapped environment.
    pub fn grid(mut self, v: SignalGridConfig) -> Self {
        self.grid = v;
        self
    }

    /// Sets the number of blocked approaches.
    pub fn block_num(mut self, v: usize) -> Self {
        self.block_num = v;
        self
    }

    /// Constructs [`BlockStreetConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`BlockStreetConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Blocks random approaches of a [`SignalGridEnv`] in every episode.
///
/// At each reset, `block_num` distinct approaches are drawn. They serve no
/// vehicles from a random second in the first half of the episode until
/// half an episode later, or the end of the episode.
pub struct BlockStreet {
    env: SignalGridEnv,
    block_num: usize,
    rng: StdRng,
}

impl BlockStreet {
    /// Returns the wrapped environment.
    pub fn inner(&self) -> &SignalGridEnv {
        &self.env
    }

    fn draw_blockages(&mut self) -> Vec<Blockage> {
        let num_seconds = self.env.config().num_seconds;
        let from = self.rng.gen_range(0..(num_seconds / 2).max(1));
        let to = (from + num_seconds / 2).min(num_seconds);
        let n = self.env.n_junctions() * N_APPROACHES;

        index::sample(&mut self.rng, n, self.block_num)
            .into_iter()
            .map(|ix| Blockage {
                junction: ix / N_APPROACHES,
                approach: ix % N_APPROACHES,
                from,
                to,
            })
            .collect()
    }
}

impl Env for BlockStreet {
    type Config = BlockStreetConfig;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let env = SignalGridEnv::build(&config.grid, seed)?;
        let n = env.n_junctions() * N_APPROACHES;
        if config.block_num > n {
            return Err(MarlError::Configuration(format!(
                "cannot block {} of {} approaches",
                config.block_num, n
            ))
            .into());
        }

        Ok(Self {
            env,
            block_num: config.block_num,
            rng: StdRng::seed_from_u64(derive_seed(seed as u64, 1)),
        })
    }

    fn agent_specs(&self) -> BTreeMap<AgentId, AgentSpec> {
        self.env.agent_specs()
    }

    fn reset(&mut self) -> Result<JointObs> {
        let obs = self.env.reset()?;
        let blockages = self.draw_blockages();
        debug!("Blocked approaches: {:?}", blockages);
        self.env.set_blockages(blockages);
        Ok(obs)
    }

    fn step(&mut self, act: &JointAct) -> Result<(Step<Self>, Record)> {
        let (step, mut record) = self.env.step(act)?;
        let t = self.env.time();
        let n_blocked = self
            .env
            .blockages()
            .iter()
            .filter(|b| b.from <= t && t < b.to)
            .count();
        record.insert("n_blocked", RecordValue::Scalar(n_blocked as f32));

        let step = Step::new(
            step.obs,
            step.act,
            step.reward,
            step.is_terminated,
            step.is_truncated,
            (),
        );
        Ok((step, record))
    }
}
