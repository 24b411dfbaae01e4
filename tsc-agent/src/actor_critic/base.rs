//! Actor-critic learner with a linear softmax policy and a linear value function.
use super::config::ActorCriticConfig;
use crate::{
    model::Linear,
    util::{argmax, sample_categorical, softmax, softmax_rows, stack_rows},
};
use anyhow::Result;
use itertools::multiunzip;
use log::trace;
use ndarray::{Array1, Array2};
use rand::{rngs::SmallRng, SeedableRng};
use std::{fs, path::Path};
use tsc_core::{
    record::{Record, RecordValue},
    Act, AgentId, AgentTransition, ExperienceStore, Learner, Obs, UpdateSchedule,
};

/// Generalized advantage estimation.
///
/// Accumulates TD errors backwards with decay `gamma * lambda`; the
/// accumulation restarts after a transition flagged as done.
pub fn gae(deltas: &[f32], dones: &[bool], gamma: f32, lambda: f32) -> Vec<f32> {
    let mut adv = vec![0f32; deltas.len()];
    let mut acc = 0f32;
    for i in (0..deltas.len()).rev() {
        let not_done = if dones[i] { 0.0 } else { 1.0 };
        acc = deltas[i] + gamma * lambda * not_done * acc;
        adv[i] = acc;
    }
    adv
}

/// Actor-critic learner of a single agent.
///
/// Transitions are kept in a private rollout by [`Learner::observe`]. An update
/// computes TD targets and advantages over the rollout, takes `epochs`
/// full-batch steps on the clipped probability-ratio objective and on the
/// squared error of the value function, then discards the rollout.
pub struct ActorCritic {
    id: AgentId,
    config: ActorCriticConfig,
    actor: Linear,
    critic: Linear,
    rollout: Vec<AgentTransition>,
    train: bool,
    n_updates: usize,
    rng: SmallRng,
}

impl ActorCritic {
    /// Constructs actor-critic learner.
    pub fn build(id: AgentId, config: ActorCriticConfig, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let actor = Linear::new(config.obs_dim, config.n_actions, &mut rng);
        let critic = Linear::new(config.obs_dim, 1, &mut rng);

        Self {
            id,
            config,
            actor,
            critic,
            rollout: vec![],
            train: true,
            n_updates: 0,
            rng,
        }
    }

    /// Action probabilities of the policy.
    pub fn action_probs(&self, obs: &Obs) -> Array1<f32> {
        softmax(&self.actor.forward(obs))
    }

    /// State value.
    pub fn value(&self, obs: &Obs) -> f32 {
        self.critic.forward(obs)[0]
    }

    /// Number of transitions waiting for the next update.
    pub fn rollout_len(&self) -> usize {
        self.rollout.len()
    }

    /// Number of updates done.
    pub fn n_updates(&self) -> usize {
        self.n_updates
    }

    fn opt_(&mut self) -> Result<Record> {
        let gamma = self.config.discount_factor;
        let obs = stack_rows(self.rollout.iter().map(|tr| &tr.obs))?;
        let next_obs = stack_rows(self.rollout.iter().map(|tr| &tr.next_obs))?;
        let (act, reward, done): (Vec<Act>, Vec<f32>, Vec<bool>) = multiunzip(
            self.rollout
                .iter()
                .map(|tr| (tr.act, tr.reward, tr.done)),
        );
        let n = act.len();

        let v = self.critic.forward_batch(&obs).column(0).to_owned();
        let v_next = self.critic.forward_batch(&next_obs).column(0).to_owned();
        let td_target: Vec<f32> = (0..n)
            .map(|i| reward[i] + gamma * v_next[i] * if done[i] { 0.0 } else { 1.0 })
            .collect();
        let deltas: Vec<f32> = (0..n).map(|i| td_target[i] - v[i]).collect();
        let adv = gae(&deltas, &done, gamma, self.config.lambda);

        let old_logp: Vec<f32> = {
            let probs = softmax_rows(&self.actor.forward_batch(&obs));
            (0..n).map(|i| probs[[i, act[i]]].max(1e-8).ln()).collect()
        };

        let (lo, hi) = (1.0 - self.config.clip_eps, 1.0 + self.config.clip_eps);
        let mut loss_actor = 0f32;
        let mut loss_critic = 0f32;

        for _ in 0..self.config.epochs {
            // Policy
            let probs = softmax_rows(&self.actor.forward_batch(&obs));
            let mut grad = Array2::<f32>::zeros((n, self.config.n_actions));
            loss_actor = 0.0;
            for i in 0..n {
                let logp = probs[[i, act[i]]].max(1e-8).ln();
                let ratio = (logp - old_logp[i]).exp();
                let surr1 = ratio * adv[i];
                let surr2 = ratio.clamp(lo, hi) * adv[i];
                loss_actor -= surr1.min(surr2) / n as f32;
                if surr1 <= surr2 {
                    let coeff = -adv[i] * ratio / n as f32;
                    for k in 0..self.config.n_actions {
                        let onehot = if k == act[i] { 1.0 } else { 0.0 };
                        grad[[i, k]] = coeff * (onehot - probs[[i, k]]);
                    }
                }
            }
            self.actor.sgd_step(&obs, &grad, self.config.actor_lr);

            // Value function
            let v = self.critic.forward_batch(&obs);
            let mut grad = Array2::<f32>::zeros((n, 1));
            loss_critic = 0.0;
            for i in 0..n {
                let err = v[[i, 0]] - td_target[i];
                loss_critic += err * err / n as f32;
                grad[[i, 0]] = 2.0 * err / n as f32;
            }
            self.critic.sgd_step(&obs, &grad, self.config.critic_lr);
        }

        self.rollout.clear();
        self.n_updates += 1;
        trace!("{}: update {} on {} transitions", self.id, self.n_updates, n);

        Ok(Record::from_slice(&[
            ("loss_actor", RecordValue::Scalar(loss_actor)),
            ("loss_critic", RecordValue::Scalar(loss_critic)),
        ]))
    }
}

impl Learner for ActorCritic {
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
        UpdateSchedule::EndOfEpisode
    }

    fn act(&mut self, obs: &Obs) -> Act {
        let probs = self.action_probs(obs);
        if self.train {
            sample_categorical(&probs, &mut self.rng)
        } else {
            argmax(probs.view())
        }
    }

    fn observe(&mut self, tr: &AgentTransition) {
        self.rollout.push(tr.clone());
    }

    /// The store is not used.
    fn update(&mut self, _store: &mut ExperienceStore) -> Result<Option<Record>> {
        if self.rollout.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.opt_()?))
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
        fs::create_dir_all(path)?;
        self.actor.save(path.join("actor.bincode"))?;
        self.critic.save(path.join("critic.bincode"))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.actor = Linear::load(path.join("actor.bincode"))?;
        self.critic = Linear::load(path.join("critic.bincode"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;
    use tempdir::TempDir;
    use tsc_core::ExperienceStoreConfig;

    fn learner(config: ActorCriticConfig, seed: u64) -> ActorCritic {
        ActorCritic::build(AgentId::from("J0_0"), config.obs_dim(2).n_actions(2), seed)
    }

    fn transition(act: Act, reward: f32, done: bool) -> AgentTransition {
        AgentTransition {
            obs: arr1(&[1.0, 0.0]),
            act,
            reward,
            next_obs: arr1(&[1.0, 0.0]),
            done,
        }
    }

    fn empty_store() -> ExperienceStore {
        ExperienceStore::build(&ExperienceStoreConfig::default())
    }

    #[test]
    fn test_gae() {
        let adv = gae(&[1.0, 1.0, 1.0], &[false, false, false], 0.5, 1.0);
        assert_eq!(adv, vec![1.75, 1.5, 1.0]);

        let adv = gae(&[1.0, 1.0, 1.0], &[false, true, false], 0.5, 1.0);
        assert_eq!(adv, vec![1.5, 1.0, 1.0]);

        let adv = gae(&[2.0, 0.0], &[false, false], 1.0, 0.0);
        assert_eq!(adv, vec![2.0, 0.0]);
    }

    #[test]
    fn test_empty_rollout_no_update() -> Result<()> {
        let mut ac = learner(ActorCriticConfig::default(), 0);
        let probs = ac.action_probs(&arr1(&[1.0, 0.0]));
        assert!(ac.update(&mut empty_store())?.is_none());
        assert_eq!(ac.n_updates(), 0);
        assert_eq!(ac.action_probs(&arr1(&[1.0, 0.0])), probs);
        Ok(())
    }

    #[test]
    fn test_update_consumes_rollout() -> Result<()> {
        let mut ac = learner(ActorCriticConfig::default(), 0);
        for t in 0..10 {
            ac.observe(&transition(t % 2, 1.0, t == 9));
        }
        assert_eq!(ac.rollout_len(), 10);
        let record = ac.update(&mut empty_store())?.unwrap_or_default();
        assert!(record.get_scalar("loss_actor").is_ok());
        assert!(record.get_scalar("loss_critic").is_ok());
        assert_eq!(ac.rollout_len(), 0);
        assert_eq!(ac.n_updates(), 1);
        Ok(())
    }

    #[test]
    fn test_value_fits_terminal_reward() -> Result<()> {
        let config = ActorCriticConfig::default().critic_lr(0.1).epochs(10);
        let mut ac = learner(config, 1);
        for _ in 0..100 {
            for _ in 0..5 {
                ac.observe(&transition(0, 1.0, true));
            }
            ac.update(&mut empty_store())?;
        }
        assert!((ac.value(&arr1(&[1.0, 0.0])) - 1.0).abs() < 1e-2);
        Ok(())
    }

    #[test]
    fn test_policy_prefers_rewarded_action() -> Result<()> {
        let config = ActorCriticConfig::default().actor_lr(0.1).critic_lr(0.1);
        let mut ac = learner(config, 2);
        let obs = arr1(&[1.0, 0.0]);
        let before = ac.action_probs(&obs)[0];
        for _ in 0..100 {
            for _ in 0..20 {
                let a = ac.act(&obs);
                let r = if a == 0 { 1.0 } else { 0.0 };
                ac.observe(&transition(a, r, true));
            }
            ac.update(&mut empty_store())?;
        }
        let after = ac.action_probs(&obs)[0];
        assert!(after > before);
        assert!(after > 0.8);
        Ok(())
    }

    #[test]
    fn test_same_seed_same_params() -> Result<()> {
        let run = || -> Result<Array1<f32>> {
            let mut ac = learner(ActorCriticConfig::default(), 5);
            let obs = arr1(&[1.0, 0.0]);
            for _ in 0..3 {
                for t in 0..10 {
                    let a = ac.act(&obs);
                    ac.observe(&transition(a, a as f32, t == 9));
                }
                ac.update(&mut empty_store())?;
            }
            Ok(ac.action_probs(&obs))
        };
        assert_eq!(run()?, run()?);
        Ok(())
    }

    #[test]
    fn test_save_load() -> Result<()> {
        let mut ac = learner(ActorCriticConfig::default(), 0);
        for t in 0..4 {
            ac.observe(&transition(t % 2, 1.0, false));
        }
        ac.update(&mut empty_store())?;

        let dir = TempDir::new("actor_critic")?;
        ac.save_params(dir.path())?;
        let mut restored = learner(ActorCriticConfig::default(), 9);
        restored.load_params(dir.path())?;

        let obs = arr1(&[0.3, -0.2]);
        assert_eq!(restored.action_probs(&obs), ac.action_probs(&obs));
        assert_eq!(restored.value(&obs), ac.value(&obs));
        Ok(())
    }
}
