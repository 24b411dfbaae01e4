//! Exploration strategies of DQN.
use crate::util::{argmax, sample_categorical, softmax};
use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Explorers for DQN.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum DqnExplorer {
    /// Softmax action selection.
    Softmax(Softmax),

    /// Epsilon-greedy action selection.
    EpsilonGreedy(EpsilonGreedy),
}

impl DqnExplorer {
    /// Takes an action based on action values.
    pub fn action(&mut self, q: &Array1<f32>, rng: &mut impl Rng) -> usize {
        match self {
            Self::Softmax(softmax) => softmax.action(q, rng),
            Self::EpsilonGreedy(egreedy) => egreedy.action(q, rng),
        }
    }

    /// Current probability of a random action, `None` for softmax.
    pub fn eps(&self) -> Option<f32> {
        match self {
            Self::Softmax(_) => None,
            Self::EpsilonGreedy(egreedy) => Some(egreedy.eps()),
        }
    }
}

/// Softmax explorer for DQN.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Softmax {}

#[allow(clippy::new_without_default)]
impl Softmax {
    /// Constructs softmax explorer.
    pub fn new() -> Self {
        Self {}
    }

    /// Samples an action with probabilities given by the softmax of `q`.
    pub fn action(&mut self, q: &Array1<f32>, rng: &mut impl Rng) -> usize {
        sample_categorical(&softmax(q), rng)
    }
}

/// Epsilon-greedy explorer for DQN.
///
/// Epsilon decays linearly from `eps_start` to `eps_final` over `final_step`
/// actions, then stays at `eps_final`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Number of actions taken so far.
    pub n_opts: usize,

    /// Epsilon at the first action.
    pub eps_start: f32,

    /// Epsilon after `final_step` actions.
    pub eps_final: f32,

    /// Number of actions over which epsilon decays.
    pub final_step: usize,
}

#[allow(clippy::new_without_default)]
impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer.
    pub fn new() -> Self {
        Self {
            n_opts: 0,
            eps_start: 1.0,
            eps_final: 0.02,
            final_step: 100_000,
        }
    }

    /// Current epsilon.
    pub fn eps(&self) -> f32 {
        let d = (self.eps_start - self.eps_final) / (self.final_step.max(1) as f32);
        (self.eps_start - d * self.n_opts as f32).max(self.eps_final)
    }

    /// Takes an action based on action values.
    pub fn action(&mut self, q: &Array1<f32>, rng: &mut impl Rng) -> usize {
        let is_random = rng.gen::<f32>() < self.eps();
        self.n_opts += 1;

        if is_random {
            rng.gen_range(0..q.len())
        } else {
            argmax(q.view())
        }
    }

    /// Set the epsilon value at the final step.
    pub fn eps_final(mut self, v: f32) -> Self {
        self.eps_final = v;
        self
    }

    /// Set the epsilon value at the start.
    pub fn eps_start(mut self, v: f32) -> Self {
        self.eps_start = v;
        self
    }

    /// Set the number of actions over which epsilon decays.
    pub fn final_step(mut self, v: usize) -> Self {
        self.final_step = v;
        self
    }
}
