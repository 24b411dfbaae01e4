//! Joint transitions.
use super::{Act, AgentId, JointAct, JointObs, JointReward, Obs};
use crate::error::MarlError;
use anyhow::Result;

/// A single timestep's record covering all agents,
/// `(o_t, a_t, r_t, o_t+1, done)`.
///
/// All maps share exactly the same set of agents. A transition is not mutated
/// after it is pushed into an [`ExperienceStore`](crate::ExperienceStore).
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    obs: JointObs,
    act: JointAct,
    reward: JointReward,
    next_obs: JointObs,
    done: bool,
}

impl Transition {
    /// Constructs a transition, checking that all maps cover the same agents.
    pub fn new(
        obs: JointObs,
        act: JointAct,
        reward: JointReward,
        next_obs: JointObs,
        done: bool,
    ) -> Result<Self> {
        let same_keys = obs.len() == act.len()
            && obs.len() == reward.len()
            && obs.len() == next_obs.len()
            && obs
                .keys()
                .zip(act.keys())
                .zip(reward.keys().zip(next_obs.keys()))
                .all(|((a, b), (c, d))| a == b && a == c && a == d);
        if !same_keys {
            return Err(MarlError::Configuration(
                "transition maps do not share the same agents".to_string(),
            )
            .into());
        }

        Ok(Self {
            obs,
            act,
            reward,
            next_obs,
            done,
        })
    }

    /// Returns the agents covered by this transition.
    pub fn agent_ids(&self) -> impl Iterator<Item = &AgentId> {
        self.obs.keys()
    }

    /// Observations `o_t`.
    pub fn obs(&self) -> &JointObs {
        &self.obs
    }

    /// Actions `a_t`.
    pub fn act(&self) -> &JointAct {
        &self.act
    }

    /// Rewards `r_t`.
    pub fn reward(&self) -> &JointReward {
        &self.reward
    }

    /// Observations `o_t+1`.
    pub fn next_obs(&self) -> &JointObs {
        &self.next_obs
    }

    /// If the episode ended with this transition.
    pub fn done(&self) -> bool {
        self.done
    }

    /// Extracts the slice of a single agent.
    pub fn agent(&self, id: &AgentId) -> Result<AgentTransition> {
        let unknown = || MarlError::UnknownAgent(id.to_string());
        Ok(AgentTransition {
            obs: self.obs.get(id).ok_or_else(unknown)?.clone(),
            act: *self.act.get(id).ok_or_else(unknown)?,
            reward: *self.reward.get(id).ok_or_else(unknown)?,
            next_obs: self.next_obs.get(id).ok_or_else(unknown)?.clone(),
            done: self.done,
        })
    }
}

/// One agent's slice of a [`Transition`].
#[derive(Clone, Debug, PartialEq)]
pub struct AgentTransition {
    /// Observation `o_t`.
    pub obs: Obs,

    /// Action `a_t`.
    pub act: Act,

    /// Reward `r_t`.
    pub reward: f32,

    /// Observation `o_t+1`.
    pub next_obs: Obs,

    /// If the episode ended with this transition.
    pub done: bool,
}
