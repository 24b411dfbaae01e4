//! Environment and learner used for tests.
use crate::{
    error::MarlError,
    record::{Record, RecordValue},
    Act, AgentId, AgentSpec, AgentTransition, Env, ExperienceStore, JointAct, JointObs, Learner,
    Obs, Step, UpdateSchedule,
};
use anyhow::Result;
use ndarray::Array1;
use std::{collections::BTreeMap, fs, path::Path};

/// Configuration of [`DummyEnv`].
#[derive(Clone, Debug)]
pub struct DummyEnvConfig {
    /// Observation dimension of each agent, `a0`, `a1`, ...
    pub obs_dims: Vec<usize>,

    /// Number of actions of every agent.
    pub n_actions: usize,

    /// Steps until all agents are truncated.
    pub episode_len: usize,

    /// Makes [`Env::step`] fail at this step of every episode.
    pub fail_at_step: Option<usize>,
}

impl DummyEnvConfig {
    /// `n_agents` agents sharing the observation dimension `obs_dim`.
    pub fn new(n_agents: usize, obs_dim: usize, episode_len: usize) -> Self {
        Self {
            obs_dims: vec![obs_dim; n_agents],
            n_actions: 2,
            episode_len,
            fail_at_step: None,
        }
    }

    /// Sets the observation dimension of each agent.
    pub fn obs_dims(mut self, obs_dims: Vec<usize>) -> Self {
        self.obs_dims = obs_dims;
        self
    }

    /// Makes the environment fail at the given step.
    pub fn fail_at_step(mut self, step: usize) -> Self {
        self.fail_at_step = Some(step);
        self
    }
}

/// A deterministic environment.
///
/// Observations are filled with `t + i / 10` for agent `i` at step `t`;
/// the reward of an agent is `1.0` plus its previous action.
pub struct DummyEnv {
    config: DummyEnvConfig,
    t: usize,
    seed: i64,
}

impl DummyEnv {
    fn ids(&self) -> Vec<AgentId> {
        (0..self.config.obs_dims.len())
            .map(|i| AgentId::new(format!("a{}", i)))
            .collect()
    }

    fn obs(&self) -> JointObs {
        self.ids()
            .into_iter()
            .zip(self.config.obs_dims.iter())
            .enumerate()
            .map(|(i, (id, &d))| (id, Array1::from_elem(d, self.t as f32 + i as f32 / 10.0)))
            .collect()
    }

    /// Returns the seed given at build.
    pub fn seed(&self) -> i64 {
        self.seed
    }
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            t: 0,
            seed,
        })
    }

    fn agent_specs(&self) -> BTreeMap<AgentId, AgentSpec> {
        self.ids()
            .into_iter()
            .zip(self.config.obs_dims.iter())
            .map(|(id, &d)| (id, AgentSpec::new(d, self.config.n_actions)))
            .collect()
    }

    fn reset(&mut self) -> Result<JointObs> {
        self.t = 0;
        Ok(self.obs())
    }

    fn step(&mut self, act: &JointAct) -> Result<(Step<Self>, Record)> {
        self.t += 1;
        if self.config.fail_at_step == Some(self.t) {
            return Err(MarlError::Environment(format!("failed at step {}", self.t)).into());
        }

        let ids = self.ids();
        let reward = ids
            .iter()
            .map(|id| (id.clone(), 1.0 + *act.get(id).unwrap_or(&0) as f32))
            .collect();
        let truncated = self.t >= self.config.episode_len;
        let is_terminated = ids.iter().map(|id| (id.clone(), false)).collect();
        let is_truncated = ids.iter().map(|id| (id.clone(), truncated)).collect();
        let step = Step::new(self.obs(), act.clone(), reward, is_terminated, is_truncated, ());

        Ok((step, Record::empty()))
    }
}

/// Configuration of [`DummyLearner`].
#[derive(Clone, Debug)]
pub struct DummyLearnerConfig {
    /// Observation dimension.
    pub obs_dim: usize,

    /// Number of actions.
    pub n_actions: usize,

    /// Update schedule.
    pub schedule: UpdateSchedule,

    /// Batch size sampled from the store by [`UpdateSchedule::EveryStep`] learners.
    pub batch_size: usize,
}

impl DummyLearnerConfig {
    /// Constructs a configuration with batch size 1.
    pub fn new(obs_dim: usize, n_actions: usize, schedule: UpdateSchedule) -> Self {
        Self {
            obs_dim,
            n_actions,
            schedule,
            batch_size: 1,
        }
    }
}

/// A learner recording the calls it receives.
///
/// It acts with `0, 1, 2, ...` modulo the number of actions.
pub struct DummyLearner {
    id: AgentId,
    config: DummyLearnerConfig,
    n_acts: usize,
    train: bool,

    /// Transitions observed since the last update.
    pub rollout: Vec<AgentTransition>,

    /// Number of transitions observed over the learner's lifetime.
    pub n_observed: usize,

    /// Value of `n_observed` at each update call.
    pub updates: Vec<usize>,

    /// Rewards of the agent in sampled batches.
    pub sampled_rewards: Vec<f32>,
}

impl DummyLearner {
    /// Builds the learner.
    pub fn build(id: AgentId, config: DummyLearnerConfig) -> Self {
        Self {
            id,
            config,
            n_acts: 0,
            train: true,
            rollout: vec![],
            n_observed: 0,
            updates: vec![],
            sampled_rewards: vec![],
        }
    }
}

impl Learner for DummyLearner {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn obs_dim(&self) -> usize {
        self.config.obs_dim
    }

    fn n_actions(&self) -> usize {
        self.config.n_actions
    }

    fn update_schedule(&self) -> UpdateSchedule {
        self.config.schedule
    }

    fn act(&mut self, _obs: &Obs) -> Act {
        let a = self.n_acts % self.config.n_actions;
        self.n_acts += 1;
        a
    }

    fn observe(&mut self, tr: &AgentTransition) {
        self.n_observed += 1;
        if self.config.schedule == UpdateSchedule::EndOfEpisode {
            self.rollout.push(tr.clone());
        }
    }

    fn update(&mut self, store: &mut ExperienceStore) -> Result<Option<Record>> {
        self.updates.push(self.n_observed);
        match self.config.schedule {
            UpdateSchedule::EveryStep => {
                let batch = store.batch(self.config.batch_size)?.agent_slice(&self.id)?;
                self.sampled_rewards.extend(batch.reward.iter());
            }
            UpdateSchedule::EndOfEpisode => {
                if self.rollout.is_empty() {
                    return Ok(None);
                }
                self.rollout.clear();
            }
        }
        Ok(Some(Record::from_slice(&[(
            "n_updates",
            RecordValue::Scalar(self.updates.len() as f32),
        )])))
    }

    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::write(path.join("updates.txt"), format!("{}", self.updates.len()))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        let _ = fs::read_to_string(path.join("updates.txt"))?;
        Ok(())
    }
}
