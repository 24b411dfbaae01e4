//! DQN learner with linear Q-models.
use super::{config::DqnConfig, explorer::DqnExplorer};
use crate::{model::Linear, util::argmax};
use anyhow::Result;
use log::trace;
use ndarray::{Array2, Axis};
use rand::{rngs::SmallRng, SeedableRng};
use std::{fs, path::Path};
use tsc_core::{
    record::{Record, RecordValue},
    Act, AgentId, AgentTransition, ExperienceStore, Learner, Obs, UpdateSchedule,
};

/// DQN learner of a single agent.
///
/// Each update samples a joint batch from the shared store and only reads
/// the columns of its own agent.
pub struct Dqn {
    id: AgentId,
    obs_dim: usize,
    n_actions: usize,
    lr: f32,
    discount_factor: f32,
    target_update_interval: usize,
    target_update_counter: usize,
    batch_size: usize,
    qnet: Linear,
    qnet_tgt: Linear,
    explorer: DqnExplorer,
    train: bool,
    n_opts: usize,
    rng: SmallRng,
}

impl Dqn {
    /// Constructs DQN learner.
    pub fn build(id: AgentId, config: DqnConfig, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let qnet = Linear::new(config.obs_dim, config.n_actions, &mut rng);
        let qnet_tgt = qnet.clone();

        Self {
            id,
            obs_dim: config.obs_dim,
            n_actions: config.n_actions,
            lr: config.lr,
            discount_factor: config.discount_factor,
            target_update_interval: config.target_update_interval.max(1),
            target_update_counter: 0,
            batch_size: config.batch_size,
            qnet,
            qnet_tgt,
            explorer: config.explorer,
            train: true,
            n_opts: 0,
            rng,
        }
    }

    /// Returns the Q-model.
    pub fn qnet(&self) -> &Linear {
        &self.qnet
    }

    /// Returns the target Q-model.
    pub fn qnet_tgt(&self) -> &Linear {
        &self.qnet_tgt
    }

    /// Returns the number of updates.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    fn update_critic(&mut self, store: &mut ExperienceStore) -> Result<f32> {
        let batch = store.batch(self.batch_size)?.agent_slice(&self.id)?;
        let n = batch.len();

        let tgt = {
            let q = self.qnet_tgt.forward_batch(&batch.next_obs);
            let q_max = q.map_axis(Axis(1), |row| row[argmax(row)]);
            let mut tgt = q_max;
            for i in 0..n {
                let not_done = (1 - batch.is_done[i]) as f32;
                tgt[i] = batch.reward[i] + not_done * self.discount_factor * tgt[i];
            }
            tgt
        };

        let pred = self.qnet.forward_batch(&batch.obs);
        let mut grad = Array2::<f32>::zeros((n, self.n_actions));
        let mut loss = 0f32;
        for (i, &a) in batch.act.iter().enumerate() {
            let err = pred[[i, a]] - tgt[i];
            loss += err * err;
            grad[[i, a]] = 2.0 * err / n as f32;
        }
        loss /= n as f32;

        self.qnet.sgd_step(&batch.obs, &grad, self.lr);

        Ok(loss)
    }

    fn opt_(&mut self, store: &mut ExperienceStore) -> Result<Record> {
        let loss_critic = self.update_critic(store)?;

        self.target_update_counter += 1;
        if self.target_update_counter == self.target_update_interval {
            self.target_update_counter = 0;
            self.qnet_tgt.copy_from(&self.qnet);
            trace!("{}: synced the target Q-model", self.id);
        }

        self.n_opts += 1;

        let mut record = Record::from_slice(&[("loss_critic", RecordValue::Scalar(loss_critic))]);
        if let Some(eps) = self.explorer.eps() {
            record.insert("epsilon", RecordValue::Scalar(eps));
        }
        Ok(record)
    }
}

impl Learner for Dqn {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn obs_dim(&self) -> usize {
        self.obs_dim
    }

    fn n_actions(&self) -> usize {
        self.n_actions
    }

    fn update_schedule(&self) -> UpdateSchedule {
        UpdateSchedule::EveryStep
    }

    /// In evaluation mode, takes the greedy action.
    fn act(&mut self, obs: &Obs) -> Act {
        let q = self.qnet.forward(obs);
        if self.train {
            self.explorer.action(&q, &mut self.rng)
        } else {
            argmax(q.view())
        }
    }

    fn observe(&mut self, _tr: &AgentTransition) {}

    fn update(&mut self, store: &mut ExperienceStore) -> Result<Option<Record>> {
        Ok(Some(self.opt_(store)?))
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
        self.qnet.save(path.join("qnet.bincode"))?;
        self.qnet_tgt.save(path.join("qnet_tgt.bincode"))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.qnet = Linear::load(path.join("qnet.bincode"))?;
        self.qnet_tgt = Linear::load(path.join("qnet_tgt.bincode"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dqn::EpsilonGreedy;
    use ndarray::Array1;
    use std::collections::BTreeMap;
    use tempdir::TempDir;
    use tsc_core::{ExperienceStoreConfig, JointObs, Transition};

    fn config(obs_dim: usize) -> DqnConfig {
        DqnConfig::default()
            .obs_dim(obs_dim)
            .n_actions(2)
            .lr(0.01)
            .batch_size(4)
            .target_update_interval(5)
    }

    /// Transitions where agent `a` observes 3 features and `b` observes 5.
    fn store_with_transitions(n: usize) -> Result<ExperienceStore> {
        store_with_b(n, -1.0, -1.0)
    }

    /// Same `a` columns for any `b_scale` and `b_reward`.
    fn store_with_b(n: usize, b_scale: f32, b_reward: f32) -> Result<ExperienceStore> {
        let mut store = ExperienceStore::build(
            &ExperienceStoreConfig::default()
                .capacity(100)
                .minimal_fill(4)
                .seed(3),
        );
        for t in 0..n {
            let obs = |dim: usize, v: f32| Array1::from_elem(dim, v);
            let o: JointObs = BTreeMap::from([
                (AgentId::from("a"), obs(3, t as f32 / 10.0)),
                (AgentId::from("b"), obs(5, b_scale * t as f32 / 10.0)),
            ]);
            let o2: JointObs = BTreeMap::from([
                (AgentId::from("a"), obs(3, (t + 1) as f32 / 10.0)),
                (AgentId::from("b"), obs(5, b_scale * (t + 1) as f32 / 10.0)),
            ]);
            let act = BTreeMap::from([(AgentId::from("a"), t % 2), (AgentId::from("b"), 1)]);
            let reward =
                BTreeMap::from([(AgentId::from("a"), 1.0), (AgentId::from("b"), b_reward)]);
            store.push(Transition::new(o, act, reward, o2, false)?);
        }
        Ok(store)
    }

    #[test]
    fn test_target_sync_cadence() -> Result<()> {
        let mut store = store_with_transitions(10)?;
        let mut dqn = Dqn::build(AgentId::from("a"), config(3), 0);

        for k in 1..=12 {
            dqn.update(&mut store)?;
            // Copied exactly at the 5th and 10th update.
            let synced = dqn.qnet() == dqn.qnet_tgt();
            assert_eq!(synced, k % 5 == 0, "update {}", k);
        }
        assert_eq!(dqn.n_opts(), 12);
        Ok(())
    }

    #[test]
    fn test_update_reads_own_columns() -> Result<()> {
        let mut store = store_with_transitions(10)?;
        let mut a = Dqn::build(AgentId::from("a"), config(3), 1);
        let mut b = Dqn::build(AgentId::from("b"), config(5), 2);
        let b_before = b.qnet().clone();

        let record = a.update(&mut store)?.unwrap_or_default();
        assert!(record.get_scalar("loss_critic").is_ok());
        assert!(record.get_scalar("epsilon").is_ok());
        assert_eq!(b.qnet(), &b_before);

        b.update(&mut store)?;
        assert_ne!(b.qnet(), &b_before);
        Ok(())
    }

    #[test]
    fn test_other_agent_columns_do_not_affect_update() -> Result<()> {
        let train = |b_scale: f32, b_reward: f32| -> Result<Linear> {
            let mut store = store_with_b(10, b_scale, b_reward)?;
            let mut a = Dqn::build(AgentId::from("a"), config(3), 1);
            for _ in 0..6 {
                a.update(&mut store)?;
            }
            Ok(a.qnet().clone())
        };

        let base = train(-1.0, -1.0)?;
        assert_eq!(train(3.0, 50.0)?, base);
        assert_eq!(train(0.0, -7.5)?, base);
        Ok(())
    }

    #[test]
    fn test_update_before_fill_fails() -> Result<()> {
        let mut store = store_with_transitions(2)?;
        let mut dqn = Dqn::build(AgentId::from("a"), config(3), 0);
        assert!(dqn.update(&mut store).is_err());
        Ok(())
    }

    #[test]
    fn test_same_seed_same_params() -> Result<()> {
        let run = || -> Result<Linear> {
            let mut store = store_with_transitions(10)?;
            let mut dqn = Dqn::build(AgentId::from("a"), config(3), 7);
            for _ in 0..8 {
                dqn.act(&Array1::zeros(3));
                dqn.update(&mut store)?;
            }
            Ok(dqn.qnet().clone())
        };
        assert_eq!(run()?, run()?);
        Ok(())
    }

    #[test]
    fn test_eval_is_greedy() {
        let explorer = DqnExplorer::EpsilonGreedy(EpsilonGreedy::new().eps_start(1.0).eps_final(1.0));
        let mut dqn = Dqn::build(AgentId::from("a"), config(3).explorer(explorer), 0);
        dqn.eval();
        let obs = Array1::from_elem(3, 0.5);
        let q = dqn.qnet().forward(&obs);
        for _ in 0..10 {
            assert_eq!(dqn.act(&obs), argmax(q.view()));
        }
    }

    #[test]
    fn test_save_load() -> Result<()> {
        let mut store = store_with_transitions(10)?;
        let mut dqn = Dqn::build(AgentId::from("a"), config(3), 0);
        for _ in 0..3 {
            dqn.update(&mut store)?;
        }
        let dir = TempDir::new("dqn")?;
        dqn.save_params(dir.path())?;
        assert!(dir.path().join("qnet.bincode").exists());
        assert!(dir.path().join("qnet_tgt.bincode").exists());

        let mut restored = Dqn::build(AgentId::from("a"), config(3), 99);
        restored.load_params(dir.path())?;
        assert_eq!(restored.qnet(), dqn.qnet());
        assert_eq!(restored.qnet_tgt(), dqn.qnet_tgt());
        Ok(())
    }
}
