//! Joint sampling of environment steps.
use crate::{
    record::Record,
    util::augment_obs,
    Env, JointObs, Learner, LearnerPool, Representation, Transition,
};
use anyhow::Result;
use log::trace;

/// Steps an environment with the joint action of a [`LearnerPool`].
///
/// The sampler keeps the observation of the previous step, which becomes
/// `o_t` of the next transition. If a [`Representation`] is given, the
/// latent vector is appended to the observations that reach the learners and
/// the raw observations are handed to the representation.
pub struct Sampler<E: Env> {
    /// The environment being sampled from.
    env: E,

    /// Observation given to the learners at the previous step.
    prev_obs: Option<JointObs>,
}

fn learner_input(obs: &JointObs, repr: Option<&(dyn Representation + '_)>) -> JointObs {
    match repr {
        Some(repr) => augment_obs(obs, &repr.encode(obs)),
        None => obs.clone(),
    }
}

impl<E: Env> Sampler<E> {
    /// Creates a sampler.
    pub fn new(env: E) -> Self {
        Self {
            env,
            prev_obs: None,
        }
    }

    /// Makes the next call of [`Sampler::sample`] start a new episode.
    pub fn end_episode(&mut self) {
        self.prev_obs = None;
    }

    /// Performs one joint step and returns the resulting transition.
    ///
    /// The environment is reset first if no episode is running.
    pub fn sample<'r, L: Learner>(
        &mut self,
        pool: &mut LearnerPool<L>,
        mut repr: Option<&mut (dyn Representation + 'r)>,
    ) -> Result<(Transition, Record)> {
        let obs = match self.prev_obs.take() {
            Some(obs) => obs,
            None => {
                let obs = self.env.reset()?;
                if let Some(r) = repr.as_deref_mut() {
                    r.observe(&obs);
                }
                learner_input(&obs, repr.as_deref())
            }
        };

        let act = pool.act_all(&obs)?;
        let (step, record) = self.env.step(&act)?;
        let done = step.is_done();
        trace!("act = {:?}, reward = {:?}", act, step.reward);

        if let Some(r) = repr.as_deref_mut() {
            r.observe(&step.obs);
        }
        let next_obs = learner_input(&step.obs, repr.as_deref());

        if !done {
            self.prev_obs = Some(next_obs.clone());
        }

        let tr = Transition::new(obs, step.act, step.reward, next_obs, done)?;

        Ok((tr, record))
    }
}
