//! Environment step.
use super::{Env, JointAct, JointFlag, JointObs, JointReward};

/// Additional information to observations and actions.
pub trait Info {}

impl Info for () {}

/// Represents the outcome of a joint step `(a_t, o_t+1, r_t)` with some
/// additional information.
///
/// An environment emits a [`Step`] object at every interaction step.
/// The trainer combines it with the previous observations to build a
/// [`Transition`](crate::Transition).
pub struct Step<E: Env> {
    /// Joint action.
    pub act: JointAct,

    /// Observations after the step.
    pub obs: JointObs,

    /// Rewards.
    pub reward: JointReward,

    /// Flags denoting if the episode is terminated for each agent.
    pub is_terminated: JointFlag,

    /// Flags denoting if the episode is truncated for each agent.
    pub is_truncated: JointFlag,

    /// Information defined by the environment.
    pub info: E::Info,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(
        obs: JointObs,
        act: JointAct,
        reward: JointReward,
        is_terminated: JointFlag,
        is_truncated: JointFlag,
        info: E::Info,
    ) -> Self {
        Step {
            act,
            obs,
            reward,
            is_terminated,
            is_truncated,
            info,
        }
    }

    /// Returns `true` if every agent is terminated or truncated.
    pub fn is_done(&self) -> bool {
        self.obs.keys().all(|id| {
            self.is_terminated.get(id).copied().unwrap_or(false)
                || self.is_truncated.get(id).copied().unwrap_or(false)
        })
    }
}
