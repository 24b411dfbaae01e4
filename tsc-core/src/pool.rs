//! Per-agent learner pool.
use crate::{
    error::MarlError,
    record::Record,
    util::derive_seed,
    AgentId, AgentSpec, ExperienceStore, JointAct, JointObs, Learner, Transition, UpdateSchedule,
};
use anyhow::Result;
use log::{debug, info};
use std::{collections::BTreeMap, fs, path::Path};

/// A mapping from agents to their independent learners.
///
/// Each learner is built by a factory with its own seed and owns its state.
/// The pool only dispatches calls; it never mixes data of different agents.
pub struct LearnerPool<L: Learner> {
    learners: BTreeMap<AgentId, L>,
    schedule: UpdateSchedule,
}

impl<L: Learner> LearnerPool<L> {
    /// Builds one learner per agent.
    ///
    /// * `specs` - observation and action dimensions of each agent.
    /// * `uniform` - requires all agents to share the same dimensions, as
    ///   needed when all learners use one architecture.
    /// * `seed` - run seed, from which a seed per learner is derived.
    /// * `factory` - constructs the learner of an agent.
    ///
    /// Fails before any learner is trained if the dimensions are not uniform
    /// while required, if a learner does not match its agent's spec, or if
    /// learners disagree on their update schedule.
    pub fn build<F>(
        specs: &BTreeMap<AgentId, AgentSpec>,
        uniform: bool,
        seed: u64,
        mut factory: F,
    ) -> Result<Self>
    where
        F: FnMut(&AgentId, &AgentSpec, u64) -> Result<L>,
    {
        if specs.is_empty() {
            return Err(MarlError::Configuration("no agents in the environment".to_string()).into());
        }

        if uniform {
            check_uniform(specs)?;
        }

        let mut learners = BTreeMap::new();
        for (ix, (id, spec)) in specs.iter().enumerate() {
            let learner = factory(id, spec, derive_seed(seed, 1 + ix as u64))?;
            check_dims(id, spec, &learner)?;
            learners.insert(id.clone(), learner);
        }

        let mut schedules = learners.values().map(|l| l.update_schedule());
        let schedule = schedules.next().unwrap_or(UpdateSchedule::EveryStep);
        if schedules.any(|s| s != schedule) {
            return Err(MarlError::Configuration(
                "learners in a pool must share the same update schedule".to_string(),
            )
            .into());
        }

        info!(
            "Built {} learners with {:?} updates",
            learners.len(),
            schedule
        );

        Ok(Self { learners, schedule })
    }

    /// Returns the update schedule shared by all learners.
    pub fn update_schedule(&self) -> UpdateSchedule {
        self.schedule
    }

    /// Returns the number of learners.
    pub fn len(&self) -> usize {
        self.learners.len()
    }

    /// Returns `true` if the pool has no learners.
    pub fn is_empty(&self) -> bool {
        self.learners.is_empty()
    }

    /// Returns the agents in the pool.
    pub fn agent_ids(&self) -> impl Iterator<Item = &AgentId> {
        self.learners.keys()
    }

    /// Returns the learner of an agent.
    pub fn get(&self, id: &AgentId) -> Option<&L> {
        self.learners.get(id)
    }

    /// Returns the learner of an agent.
    pub fn get_mut(&mut self, id: &AgentId) -> Option<&mut L> {
        self.learners.get_mut(id)
    }

    /// Iterates over the learners.
    pub fn iter(&self) -> impl Iterator<Item = (&AgentId, &L)> {
        self.learners.iter()
    }

    /// Collects an action from every learner given its own observation.
    pub fn act_all(&mut self, obs: &JointObs) -> Result<JointAct> {
        self.learners
            .iter_mut()
            .map(|(id, learner)| -> Result<(AgentId, usize)> {
                let o = obs
                    .get(id)
                    .ok_or_else(|| MarlError::UnknownAgent(id.to_string()))?;
                Ok((id.clone(), learner.act(o)))
            })
            .collect()
    }

    /// Passes each learner its slice of a joint transition.
    pub fn observe_all(&mut self, tr: &Transition) -> Result<()> {
        for (id, learner) in self.learners.iter_mut() {
            learner.observe(&tr.agent(id)?);
        }
        Ok(())
    }

    /// Runs one update of every learner.
    ///
    /// Returned metrics are prefixed with the agent identifier.
    pub fn update_all(&mut self, store: &mut ExperienceStore) -> Result<Record> {
        let mut record = Record::empty();
        for (id, learner) in self.learners.iter_mut() {
            if let Some(r) = learner.update(store)? {
                record.merge_inplace(r.with_prefix(id.as_str()));
            }
        }
        Ok(record)
    }

    /// Sets all learners to training mode.
    pub fn train(&mut self) {
        self.learners.values_mut().for_each(|l| l.train());
    }

    /// Sets all learners to evaluation mode.
    pub fn eval(&mut self) {
        self.learners.values_mut().for_each(|l| l.eval());
    }

    /// Saves the parameters of every learner under `dir/{agent}`.
    pub fn save_params(&self, dir: &Path) -> Result<()> {
        for (id, learner) in self.learners.iter() {
            let path = dir.join(id.as_str());
            fs::create_dir_all(&path)?;
            learner.save_params(&path)?;
        }
        debug!("Saved parameters of {} learners in {:?}", self.len(), dir);
        Ok(())
    }

    /// Loads the parameters of every learner from `dir/{agent}`.
    pub fn load_params(&mut self, dir: &Path) -> Result<()> {
        for (id, learner) in self.learners.iter_mut() {
            learner.load_params(&dir.join(id.as_str()))?;
        }
        Ok(())
    }
}

fn check_uniform(specs: &BTreeMap<AgentId, AgentSpec>) -> Result<()> {
    let mut iter = specs.iter();
    if let Some((id0, spec0)) = iter.next() {
        for (id, spec) in iter {
            if spec != spec0 {
                return Err(MarlError::Configuration(format!(
                    "agents {} and {} have different dimensions ({:?} vs {:?}) \
                     while a uniform architecture is required",
                    id0, id, spec0, spec
                ))
                .into());
            }
        }
    }
    Ok(())
}

fn check_dims<L: Learner>(id: &AgentId, spec: &AgentSpec, learner: &L) -> Result<()> {
    if learner.obs_dim() != spec.obs_dim {
        return Err(MarlError::DimensionMismatch {
            agent: id.to_string(),
            expected: spec.obs_dim,
            actual: learner.obs_dim(),
        }
        .into());
    }
    if learner.n_actions() != spec.n_actions {
        return Err(MarlError::DimensionMismatch {
            agent: id.to_string(),
            expected: spec.n_actions,
            actual: learner.n_actions(),
        }
        .into());
    }
    Ok(())
}
