//! Batches sampled from [`ExperienceStore`](super::ExperienceStore).
use crate::{Act, AgentId, Transition};
use anyhow::Result;
use ndarray::{stack, Array2, ArrayView1, Axis};

/// Joint transitions sampled from the store.
#[derive(Clone, Debug)]
pub struct JointBatch {
    /// Sampled transitions.
    pub transitions: Vec<Transition>,

    /// Slot indices of the sampled transitions in the store.
    pub ix_sample: Vec<usize>,
}

impl JointBatch {
    /// Returns the number of transitions.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Returns `true` if the batch has no transitions.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Extracts the columns of a single agent.
    ///
    /// Fails with [`MarlError::UnknownAgent`](crate::error::MarlError::UnknownAgent)
    /// if a transition does not cover the agent.
    pub fn agent_slice(&self, id: &AgentId) -> Result<AgentBatch> {
        let slices = self
            .transitions
            .iter()
            .map(|tr| tr.agent(id))
            .collect::<Result<Vec<_>>>()?;

        let obs: Vec<ArrayView1<f32>> = slices.iter().map(|s| s.obs.view()).collect();
        let next_obs: Vec<ArrayView1<f32>> = slices.iter().map(|s| s.next_obs.view()).collect();

        Ok(AgentBatch {
            obs: stack(Axis(0), &obs)?,
            act: slices.iter().map(|s| s.act).collect(),
            reward: slices.iter().map(|s| s.reward).collect(),
            next_obs: stack(Axis(0), &next_obs)?,
            is_done: slices.iter().map(|s| s.done as i8).collect(),
        })
    }
}

/// One agent's columns of a [`JointBatch`].
#[derive(Clone, Debug, PartialEq)]
pub struct AgentBatch {
    /// Observations `o_t`, one row per sample.
    pub obs: Array2<f32>,

    /// Actions `a_t`.
    pub act: Vec<Act>,

    /// Rewards `r_t`.
    pub reward: Vec<f32>,

    /// Observations `o_t+1`, one row per sample.
    pub next_obs: Array2<f32>,

    /// Done flags.
    pub is_done: Vec<i8>,
}

impl AgentBatch {
    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch has no samples.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }
}
