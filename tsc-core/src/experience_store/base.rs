//! Ring buffer of joint transitions.
use super::{ExperienceStoreConfig, JointBatch};
use crate::{error::MarlError, Transition};
use anyhow::Result;
use rand::{rngs::StdRng, seq::index, SeedableRng};

/// A fixed-capacity ring buffer of joint transitions.
///
/// * [`ExperienceStore::push`] never fails; once the store is full, the
///   oldest transition is overwritten.
/// * [`ExperienceStore::batch`] draws distinct slots uniformly at random with
///   the store's own generator, seeded from the configuration.
pub struct ExperienceStore {
    /// Maximum number of transitions that can be stored.
    capacity: usize,

    /// Number of transitions required before sampling.
    minimal_fill: usize,

    /// Current insertion index.
    i: usize,

    /// Current number of stored transitions.
    size: usize,

    /// Storage of transitions.
    slots: Vec<Option<Transition>>,

    /// Random number generator for sampling.
    rng: StdRng,
}

impl ExperienceStore {
    /// Builds an empty store.
    pub fn build(config: &ExperienceStoreConfig) -> Self {
        let capacity = config.capacity.max(1);
        Self {
            capacity,
            minimal_fill: config.minimal_fill,
            i: 0,
            size: 0,
            slots: vec![None; capacity],
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Pushes a transition, evicting the oldest one if the store is full.
    pub fn push(&mut self, tr: Transition) {
        self.slots[self.i] = Some(tr);
        self.i = (self.i + 1) % self.capacity;
        if self.size < self.capacity {
            self.size += 1;
        }
    }

    /// Returns the current number of transitions.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if no transition was pushed.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the minimal fill.
    pub fn minimal_fill(&self) -> usize {
        self.minimal_fill
    }

    /// Returns `true` if the store holds enough transitions to be sampled.
    pub fn is_ready(&self) -> bool {
        self.size >= self.minimal_fill
    }

    /// Iterates over the stored transitions from the oldest to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        let start = if self.size < self.capacity { 0 } else { self.i };
        (0..self.size).filter_map(move |k| self.slots[(start + k) % self.capacity].as_ref())
    }

    /// Samples `size` distinct transitions uniformly at random.
    ///
    /// Fails with [`MarlError::InsufficientData`] if the store is below its
    /// minimal fill or holds fewer than `size` transitions.
    pub fn batch(&mut self, size: usize) -> Result<JointBatch> {
        if self.size < self.minimal_fill || size > self.size {
            return Err(MarlError::InsufficientData {
                len: self.size,
                minimal_fill: self.minimal_fill,
                batch_size: size,
            }
            .into());
        }

        let ixs = index::sample(&mut self.rng, self.size, size).into_vec();
        let transitions = ixs
            .iter()
            .filter_map(|&ix| self.slots[ix].clone())
            .collect();

        Ok(JointBatch {
            transitions,
            ix_sample: ixs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AgentId, JointAct, JointObs, JointReward};
    use ndarray::arr1;
    use std::collections::HashSet;

    /// Transition tagged with `k` in its reward.
    fn transition(k: usize) -> Transition {
        let id = AgentId::from("J0");
        let obs: JointObs = [(id.clone(), arr1(&[k as f32]))].into_iter().collect();
        let act: JointAct = [(id.clone(), k % 2)].into_iter().collect();
        let reward: JointReward = [(id, k as f32)].into_iter().collect();
        Transition::new(obs.clone(), act, reward, obs, false).unwrap()
    }

    fn tag(tr: &Transition) -> usize {
        tr.reward()[&AgentId::from("J0")] as usize
    }

    fn store(capacity: usize, minimal_fill: usize) -> ExperienceStore {
        let config = ExperienceStoreConfig::default()
            .capacity(capacity)
            .minimal_fill(minimal_fill)
            .seed(42);
        ExperienceStore::build(&config)
    }

    #[test]
    fn test_eviction_keeps_most_recent() {
        let mut store = store(5, 3);
        for k in 1..=7 {
            store.push(transition(k));
            assert!(store.len() <= store.capacity());
        }
        assert_eq!(store.len(), 5);
        let tags: Vec<_> = store.iter().map(tag).collect();
        assert_eq!(tags, vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_holds_last_capacity_for_long_sequences() {
        let mut store = store(5, 1);
        for k in 1..=23 {
            store.push(transition(k));
        }
        let tags: Vec<_> = store.iter().map(tag).collect();
        assert_eq!(tags, (19..=23).collect::<Vec<_>>());
    }

    #[test]
    fn test_sample_before_minimal_fill_fails() {
        let mut store = store(5, 3);
        store.push(transition(1));
        store.push(transition(2));
        let err = store.batch(2).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MarlError>(),
            Some(&MarlError::InsufficientData {
                len: 2,
                minimal_fill: 3,
                batch_size: 2
            })
        );
    }

    #[test]
    fn test_batch_larger_than_contents_fails() {
        let mut store = store(10, 2);
        for k in 1..=3 {
            store.push(transition(k));
        }
        assert!(store.batch(4).is_err());
    }

    #[test]
    fn test_sample_after_minimal_fill() -> Result<()> {
        let mut store = store(5, 3);
        for k in 1..=4 {
            store.push(transition(k));
        }
        for _ in 0..20 {
            let batch = store.batch(3)?;
            assert_eq!(batch.len(), 3);
            let tags: HashSet<_> = batch.transitions.iter().map(tag).collect();
            assert_eq!(tags.len(), 3);
            assert!(tags.iter().all(|t| (1..=4).contains(t)));
        }
        Ok(())
    }

    #[test]
    fn test_sampling_does_not_mutate_contents() -> Result<()> {
        let mut store = store(5, 3);
        for k in 1..=7 {
            store.push(transition(k));
        }
        let before: Vec<_> = store.iter().map(tag).collect();
        let _ = store.batch(3)?;
        let _ = store.batch(5)?;
        let after: Vec<_> = store.iter().map(tag).collect();
        assert_eq!(before, after);
        Ok(())
    }

    #[test]
    fn test_same_seed_same_batches() -> Result<()> {
        let mut s1 = store(50, 10);
        let mut s2 = store(50, 10);
        for k in 1..=40 {
            s1.push(transition(k));
            s2.push(transition(k));
        }
        for _ in 0..10 {
            assert_eq!(s1.batch(8)?.ix_sample, s2.batch(8)?.ix_sample);
        }
        Ok(())
    }
}
